use std::sync::Arc;

use chrono::NaiveDate;
use event_roster_database::models::{Event, RecordId, Role, Teacher};
use event_roster_database::{MemoryStore, Store};

use crate::authoring::{Authoring, NewEvent, NewRole, NewTeacher};
use crate::error::RosterError;

/// A store handle for the engine and the in-memory store behind it for fault injection.
pub fn memory_store() -> (Store, MemoryStore) {
    let memory = MemoryStore::new();
    (Arc::new(memory.clone()), memory)
}

pub async fn seed_event(store: &Store, name: &str) -> Result<Event, RosterError> {
    let day = NaiveDate::from_ymd_opt(2024, 9, 14).unwrap();
    Authoring::new(store.clone())
        .create_event(NewEvent {
            name: name.to_owned(),
            starts_at: day.and_hms_opt(9, 0, 0).unwrap(),
            ends_at: day.and_hms_opt(15, 0, 0).unwrap(),
            description: String::new(),
        })
        .await
}

pub async fn seed_teacher(store: &Store, name: &str) -> Result<Teacher, RosterError> {
    Authoring::new(store.clone())
        .create_teacher(NewTeacher {
            name: name.to_owned(),
            email: format!("{}@school.example", name.to_lowercase()),
            department: "Science".to_owned(),
        })
        .await
}

pub async fn seed_role(
    store: &Store,
    event_id: RecordId,
    name: &str,
    points: i64,
    head_count: u32,
) -> Result<Role, RosterError> {
    Authoring::new(store.clone())
        .create_role(
            event_id,
            NewRole {
                name: name.to_owned(),
                points,
                head_count,
            },
        )
        .await
}
