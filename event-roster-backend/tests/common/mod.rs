#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use event_roster_backend::authoring::{NewEvent, NewRole, NewTeacher};
use event_roster_backend::{Roster, RosterError};
use event_roster_database::models::{Event, RecordId, Role, Teacher};
use event_roster_database::{get_record, MemoryStore};

pub fn roster() -> (Roster, MemoryStore) {
    let memory = MemoryStore::new();
    (Roster::new(Arc::new(memory.clone())), memory)
}

pub async fn event(roster: &Roster, name: &str) -> Result<Event, RosterError> {
    let day = NaiveDate::from_ymd_opt(2024, 11, 2).unwrap();
    roster
        .create_event(NewEvent {
            name: name.to_owned(),
            starts_at: day.and_hms_opt(8, 0, 0).unwrap(),
            ends_at: day.and_hms_opt(13, 0, 0).unwrap(),
            description: "Annual event".to_owned(),
        })
        .await
}

pub async fn teacher(roster: &Roster, name: &str) -> Result<Teacher, RosterError> {
    roster
        .create_teacher(NewTeacher {
            name: name.to_owned(),
            email: String::new(),
            department: "Mathematics".to_owned(),
        })
        .await
}

pub async fn role(
    roster: &Roster,
    event_id: RecordId,
    name: &str,
    points: i64,
    head_count: u32,
) -> Result<Role, RosterError> {
    roster
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

pub async fn points(roster: &Roster, teacher_id: RecordId) -> i64 {
    let teacher: Teacher = get_record(roster.store().as_ref(), teacher_id)
        .await
        .unwrap()
        .unwrap();
    teacher.points
}
