//! Schema-less documents and the filter/update vocabulary the record stores understand.

use core::fmt::{self, Display};

use serde_json::{Map, Value};

use crate::error::DatabaseError;
use crate::models::RecordId;

pub type Document = Map<String, Value>;

/// Field names shared by the records and the queries issued against them.
pub mod fields {
    pub const ID: &str = "_id";
    pub const EVENT_ID: &str = "event_id";
    pub const ROLE_ID: &str = "role_id";
    pub const TEACHER_ID: &str = "teacher_id";
    pub const ASSIGNMENT_ID: &str = "assignment_id";
    pub const NAME: &str = "name";
    pub const EVENT_NAME: &str = "event_name";
    pub const STARTS_AT: &str = "starts_at";
    pub const ENDS_AT: &str = "ends_at";
    pub const DESCRIPTION: &str = "description";
    pub const POINTS: &str = "points";
    pub const ROLES: &str = "roles";
    pub const ASSIGNED_TEACHERS: &str = "assigned_teachers";
    pub const ASSIGNED_ROLES: &str = "assigned_roles";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Events,
    Roles,
    Teachers,
    Assignments,
}

impl Collection {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Roles => "roles",
            Self::Teachers => "teachers",
            Self::Assignments => "teacherAssignments",
        }
    }

    /// Singular noun for a record of this collection, used in error messages.
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Events => "event",
            Self::Roles => "role",
            Self::Teachers => "teacher",
            Self::Assignments => "assignment",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FindOne,
    Find,
    Count,
    InsertOne,
    UpdateOne,
    DeleteOne,
    DeleteMany,
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FindOne => "find_one",
            Self::Find => "find",
            Self::Count => "count",
            Self::InsertOne => "insert_one",
            Self::UpdateOne => "update_one",
            Self::DeleteOne => "delete_one",
            Self::DeleteMany => "delete_many",
        })
    }
}

/// Conjunction of field equality conditions. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    #[must_use]
    pub fn by_id(id: RecordId) -> Self {
        Self::new().eq(fields::ID, id)
    }

    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    #[must_use]
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| document.get(field) == Some(value))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Set(Document),
    Inc { field: String, by: i64 },
    Push { field: String, value: Value },
    /// Removes every array element that is a document matched by the filter.
    Pull { field: String, matching: Filter },
}

impl Update {
    /// Sets a single field, leaving the rest of the document untouched.
    #[must_use]
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut values = Document::new();
        values.insert(field.into(), value.into());
        Self::Set(values)
    }

    #[must_use]
    pub fn inc(field: impl Into<String>, by: i64) -> Self {
        Self::Inc {
            field: field.into(),
            by,
        }
    }

    #[must_use]
    pub fn push(field: impl Into<String>, value: Value) -> Self {
        Self::Push {
            field: field.into(),
            value,
        }
    }

    #[must_use]
    pub fn pull(field: impl Into<String>, matching: Filter) -> Self {
        Self::Pull {
            field: field.into(),
            matching,
        }
    }

    /// Applies the update in place with document store semantics: a missing counter counts
    /// from zero and a missing array is created on push.
    pub fn apply(&self, document: &mut Document) -> Result<(), DatabaseError> {
        match self {
            Self::Set(values) => {
                for (field, value) in values {
                    document.insert(field.clone(), value.clone());
                }
            }
            Self::Inc { field, by } => {
                let current = match document.get(field) {
                    None | Some(Value::Null) => 0,
                    Some(value) => value.as_i64().ok_or_else(|| DatabaseError::InvalidUpdate {
                        operation: "increment",
                        field: field.clone(),
                        reason: "not an integer",
                    })?,
                };
                let next = current
                    .checked_add(*by)
                    .ok_or_else(|| DatabaseError::InvalidUpdate {
                        operation: "increment",
                        field: field.clone(),
                        reason: "overflow",
                    })?;
                document.insert(field.clone(), Value::from(next));
            }
            Self::Push { field, value } => {
                let entry = document
                    .entry(field.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if entry.is_null() {
                    *entry = Value::Array(Vec::new());
                }
                let Value::Array(items) = entry else {
                    return Err(DatabaseError::InvalidUpdate {
                        operation: "push to",
                        field: field.clone(),
                        reason: "not an array",
                    });
                };
                items.push(value.clone());
            }
            Self::Pull { field, matching } => match document.get_mut(field) {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => {
                    items.retain(|item| {
                        item.as_object()
                            .map_or(true, |element| !matching.matches(element))
                    });
                }
                Some(_) => {
                    return Err(DatabaseError::InvalidUpdate {
                        operation: "pull from",
                        field: field.clone(),
                        reason: "not an array",
                    })
                }
            },
        }
        Ok(())
    }
}
