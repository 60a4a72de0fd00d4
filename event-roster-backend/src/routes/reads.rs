use axum::extract::{Path, State};
use axum::Json;
use event_roster_database::models::Assignment;

use super::parse_id;
use crate::error::RosterError;
use crate::roster::Roster;

pub async fn teacher_assignments(
    State(roster): State<Roster>,
    Path(teacher_id): Path<String>,
) -> Result<Json<Vec<Assignment>>, RosterError> {
    let teacher_id = parse_id(&teacher_id)?;
    Ok(Json(roster.list_assignments_for_teacher(teacher_id).await?))
}

pub async fn role_assignments(
    State(roster): State<Roster>,
    Path(role_id): Path<String>,
) -> Result<Json<Vec<Assignment>>, RosterError> {
    let role_id = parse_id(&role_id)?;
    Ok(Json(roster.list_assignments_for_role(role_id).await?))
}

pub async fn assigned_teachers(
    State(roster): State<Roster>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Assignment>>, RosterError> {
    let event_id = parse_id(&event_id)?;
    Ok(Json(roster.list_assigned_teachers_for_event(event_id).await?))
}

pub async fn teacher_roles_in_event(
    State(roster): State<Roster>,
    Path((teacher_id, event_id)): Path<(String, String)>,
) -> Result<Json<Vec<Assignment>>, RosterError> {
    let teacher_id = parse_id(&teacher_id)?;
    let event_id = parse_id(&event_id)?;
    Ok(Json(
        roster
            .list_assignments_for_teacher_in_event(teacher_id, event_id)
            .await?,
    ))
}
