use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use event_roster_database::models::{Event, Role, Teacher};

use super::{parse_id, payload};
use crate::authoring::{NewEvent, NewRole, NewTeacher};
use crate::error::RosterError;
use crate::roster::Roster;

pub async fn create_event(
    State(roster): State<Roster>,
    body: Result<Json<NewEvent>, JsonRejection>,
) -> Result<Json<Event>, RosterError> {
    Ok(Json(roster.create_event(payload(body)?).await?))
}

pub async fn create_teacher(
    State(roster): State<Roster>,
    body: Result<Json<NewTeacher>, JsonRejection>,
) -> Result<Json<Teacher>, RosterError> {
    Ok(Json(roster.create_teacher(payload(body)?).await?))
}

pub async fn create_role(
    State(roster): State<Roster>,
    Path(event_id): Path<String>,
    body: Result<Json<NewRole>, JsonRejection>,
) -> Result<Json<Role>, RosterError> {
    let event_id = parse_id(&event_id)?;
    Ok(Json(roster.create_role(event_id, payload(body)?).await?))
}
