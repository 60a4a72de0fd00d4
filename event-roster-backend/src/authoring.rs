use chrono::NaiveDateTime;
use event_roster_database::models::{Assignment, Event, RecordId, Role, Teacher};
use event_roster_database::{
    fields, find_records, get_record, insert_record, Collection, DatabaseError, Document,
    Filter, Store, Update,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::RosterError;
use crate::sync::Denormalizer;

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTeacher {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub department: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRole {
    pub name: String,
    pub points: i64,
    pub head_count: u32,
}

/// Result of [`Authoring::update_event`]. `records_synced` counts the copies of the event name
/// that were rewritten and `skipped` the copies that could not be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventUpdate {
    pub event: Event,
    pub records_synced: u64,
    pub skipped: u64,
}

fn require_name(kind: &str, name: &str) -> Result<(), RosterError> {
    if name.trim().is_empty() {
        return Err(RosterError::InvalidInput(format!(
            "{kind} name must not be empty"
        )));
    }
    Ok(())
}

fn validate_event(new: &NewEvent) -> Result<(), RosterError> {
    require_name("event", &new.name)?;
    if new.ends_at < new.starts_at {
        return Err(RosterError::InvalidInput(
            "event must not end before it starts".to_owned(),
        ));
    }
    Ok(())
}

fn event_fields(new: &NewEvent) -> Result<Document, RosterError> {
    let mut values = Document::new();
    values.insert(fields::NAME.to_owned(), Value::from(new.name.clone()));
    values.insert(
        fields::STARTS_AT.to_owned(),
        serde_json::to_value(new.starts_at).map_err(DatabaseError::from)?,
    );
    values.insert(
        fields::ENDS_AT.to_owned(),
        serde_json::to_value(new.ends_at).map_err(DatabaseError::from)?,
    );
    values.insert(
        fields::DESCRIPTION.to_owned(),
        Value::from(new.description.clone()),
    );
    Ok(values)
}

/// Creation of the records the assignment engine works on.
#[derive(Clone)]
pub struct Authoring {
    store: Store,
    denormalizer: Denormalizer,
}

impl Authoring {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            denormalizer: Denormalizer::new(store.clone()),
            store,
        }
    }

    #[instrument(skip(self, new), fields(name = %new.name), err)]
    pub async fn create_event(&self, new: NewEvent) -> Result<Event, RosterError> {
        validate_event(&new)?;
        let event = Event {
            id: RecordId::generate(),
            name: new.name,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            description: new.description,
            roles: Vec::new(),
            assigned_teachers: Vec::new(),
        };
        insert_record(self.store.as_ref(), &event).await?;
        info!(event_id = %event.id, "created event");
        Ok(event)
    }

    /// Replaces name, schedule and description of an event.
    ///
    /// Roles, assignments and assigned-role summaries carry a copy of the event name. After a
    /// rename those copies are rewritten one record at a time; a failed rewrite is logged and
    /// counted in [`EventUpdate::skipped`] and leaves that copy stale.
    #[instrument(skip(self, new), fields(name = %new.name), err)]
    pub async fn update_event(
        &self,
        event_id: RecordId,
        new: NewEvent,
    ) -> Result<EventUpdate, RosterError> {
        validate_event(&new)?;
        let store = self.store.as_ref();
        let current: Event = get_record(store, event_id)
            .await?
            .ok_or(RosterError::not_found(Collection::Events, event_id))?;

        let matched = store
            .update_one(
                Collection::Events,
                &Filter::by_id(event_id),
                &Update::Set(event_fields(&new)?),
            )
            .await?;
        if matched == 0 {
            return Err(RosterError::not_found(Collection::Events, event_id));
        }

        let renamed = current.name != new.name;
        let event = Event {
            name: new.name,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            description: new.description,
            ..current
        };
        let mut update = EventUpdate {
            event,
            records_synced: 0,
            skipped: 0,
        };
        if renamed {
            self.copy_event_name(&mut update).await;
        }
        info!(
            synced = update.records_synced,
            skipped = update.skipped,
            "updated event"
        );
        Ok(update)
    }

    async fn copy_event_name(&self, update: &mut EventUpdate) {
        let store = self.store.as_ref();
        let event_id = update.event.id;
        let name = update.event.name.clone();
        let by_event = Filter::new().eq(fields::EVENT_ID, event_id);
        let rename = Update::set(fields::EVENT_NAME, name.clone());

        match find_records::<Role>(store, &by_event).await {
            Ok(roles) => {
                for role in roles {
                    match store
                        .update_one(Collection::Roles, &Filter::by_id(role.id), &rename)
                        .await
                    {
                        Ok(matched) => update.records_synced += matched,
                        Err(error) => {
                            warn!(role_id = %role.id, %error, "could not rename event on role");
                            update.skipped += 1;
                        }
                    }
                }
            }
            Err(error) => {
                warn!(%event_id, %error, "could not list roles of event");
                update.skipped += 1;
            }
        }

        let assignments = match find_records::<Assignment>(store, &by_event).await {
            Ok(assignments) => assignments,
            Err(error) => {
                warn!(%event_id, %error, "could not list assignments of event");
                update.skipped += 1;
                return;
            }
        };
        for mut assignment in assignments {
            match store
                .update_one(
                    Collection::Assignments,
                    &Filter::by_id(assignment.id),
                    &rename,
                )
                .await
            {
                Ok(matched) => update.records_synced += matched,
                Err(error) => {
                    warn!(
                        assignment_id = %assignment.id,
                        %error,
                        "could not rename event on assignment"
                    );
                    update.skipped += 1;
                }
            }

            assignment.event_name.clone_from(&name);
            let replaced = match self
                .denormalizer
                .remove_assigned_role(assignment.teacher_id, assignment.id)
                .await
            {
                Ok(()) => {
                    self.denormalizer
                        .append_assigned_role(assignment.teacher_id, &assignment.role_summary())
                        .await
                }
                Err(error) => Err(error),
            };
            match replaced {
                Ok(()) => update.records_synced += 1,
                Err(error) => {
                    warn!(
                        assignment_id = %assignment.id,
                        %error,
                        "could not rename event on teacher summary"
                    );
                    update.skipped += 1;
                }
            }
        }
    }

    #[instrument(skip(self, new), fields(name = %new.name), err)]
    pub async fn create_teacher(&self, new: NewTeacher) -> Result<Teacher, RosterError> {
        require_name("teacher", &new.name)?;
        let teacher = Teacher {
            id: RecordId::generate(),
            name: new.name,
            email: new.email,
            department: new.department,
            points: 0,
            assigned_roles: Vec::new(),
        };
        insert_record(self.store.as_ref(), &teacher).await?;
        info!(teacher_id = %teacher.id, "created teacher");
        Ok(teacher)
    }

    /// Inserts the role and then appends its summary to the event. A failure of the second
    /// step leaves a role the event does not list.
    #[instrument(skip(self, new), fields(name = %new.name), err)]
    pub async fn create_role(&self, event_id: RecordId, new: NewRole) -> Result<Role, RosterError> {
        require_name("role", &new.name)?;
        if new.points == i64::MIN {
            return Err(RosterError::InvalidInput(format!(
                "role points must be greater than {}",
                i64::MIN
            )));
        }
        let event: Event = get_record(self.store.as_ref(), event_id)
            .await?
            .ok_or(RosterError::not_found(Collection::Events, event_id))?;
        let role = Role {
            id: RecordId::generate(),
            event_id,
            event_name: event.name,
            name: new.name,
            points: new.points,
            head_count: new.head_count,
        };
        insert_record(self.store.as_ref(), &role).await?;
        self.denormalizer
            .append_role_summary(event_id, &role.summary())
            .await?;
        info!(role_id = %role.id, "created role");
        Ok(role)
    }
}
