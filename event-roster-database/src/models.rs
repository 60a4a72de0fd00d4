use core::fmt::{self, Debug, Display, Write as _};
use core::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDateTime;
use rand::{thread_rng, Rng as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{Collection, Document};
use crate::error::{DatabaseError, InvalidRecordId};

/// Twelve byte identifier in the document store object id layout: seconds since the epoch,
/// five bytes unique to this process and a wrapping counter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RecordId([u8; 12]);

impl RecordId {
    #[must_use]
    pub fn generate() -> Self {
        static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
        static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        let seconds = u32::try_from(seconds).unwrap_or(u32::MAX);
        let unique = PROCESS_UNIQUE.get_or_init(|| {
            let mut bytes = [0_u8; 5];
            thread_rng().fill(&mut bytes);
            bytes
        });
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(thread_rng().gen()))
            .fetch_add(1, Ordering::Relaxed);

        let mut bytes = [0_u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(unique);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut hex = String::with_capacity(24);
        for byte in self.0 {
            write!(hex, "{byte:02x}")?;
        }
        f.write_str(&hex)
    }
}

impl Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({self})")
    }
}

impl FromStr for RecordId {
    type Err = InvalidRecordId;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.len() != 24 || !value.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(InvalidRecordId(value.to_owned()));
        }
        let mut bytes = [0_u8; 12];
        for (index, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&value[index * 2..index * 2 + 2], 16)
                .map_err(|_| InvalidRecordId(value.to_owned()))?;
        }
        Ok(Self(bytes))
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for RecordId {
    type Error = InvalidRecordId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordId> for Value {
    fn from(value: RecordId) -> Self {
        Self::String(value.to_string())
    }
}

/// A typed record stored as a document in exactly one collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn to_document(&self) -> Result<Document, DatabaseError> {
        match serde_json::to_value(self)? {
            Value::Object(document) => Ok(document),
            _ => Err(DatabaseError::NotADocument),
        }
    }

    fn from_document(document: Document) -> Result<Self, DatabaseError> {
        Ok(serde_json::from_value(Value::Object(document))?)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RoleSummary {
    pub id: RecordId,
    pub name: String,
}

/// An event's view of one live assignment.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AssignedTeacherSummary {
    pub assignment_id: RecordId,
    pub role_id: RecordId,
    pub role_name: String,
    pub teacher_id: RecordId,
    pub teacher_name: String,
}

/// A teacher's view of one live assignment.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AssignedRoleSummary {
    pub assignment_id: RecordId,
    pub event_id: RecordId,
    pub event_name: String,
    pub role_id: RecordId,
    pub role_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub name: String,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub roles: Vec<RoleSummary>,
    #[serde(default)]
    pub assigned_teachers: Vec<AssignedTeacherSummary>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Role {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub event_id: RecordId,
    #[serde(default)]
    pub event_name: String,
    pub name: String,
    /// Awarded to the teacher for every live assignment.
    pub points: i64,
    /// Maximum number of simultaneous live assignments.
    pub head_count: u32,
}

impl Role {
    #[must_use]
    pub fn summary(&self) -> RoleSummary {
        RoleSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Teacher {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub assigned_roles: Vec<AssignedRoleSummary>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub event_id: RecordId,
    pub event_name: String,
    pub teacher_id: RecordId,
    pub role_id: RecordId,
    pub role_name: String,
}

impl Assignment {
    #[must_use]
    pub fn teacher_summary(&self, teacher_name: &str) -> AssignedTeacherSummary {
        AssignedTeacherSummary {
            assignment_id: self.id,
            role_id: self.role_id,
            role_name: self.role_name.clone(),
            teacher_id: self.teacher_id,
            teacher_name: teacher_name.to_owned(),
        }
    }

    #[must_use]
    pub fn role_summary(&self) -> AssignedRoleSummary {
        AssignedRoleSummary {
            assignment_id: self.id,
            event_id: self.event_id,
            event_name: self.event_name.clone(),
            role_id: self.role_id,
            role_name: self.role_name.clone(),
        }
    }
}

macro_rules! record {
    ($type:ty, $collection:expr) => {
        impl Record for $type {
            const COLLECTION: Collection = $collection;
        }
    };
}

record!(Event, Collection::Events);
record!(Role, Collection::Roles);
record!(Teacher, Collection::Teachers);
record!(Assignment, Collection::Assignments);
