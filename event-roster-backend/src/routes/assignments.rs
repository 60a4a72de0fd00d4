use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use event_roster_database::models::Assignment;
use serde::{Deserialize, Serialize};

use super::{parse_id, payload};
use crate::error::RosterError;
use crate::roster::Roster;

#[derive(Deserialize)]
pub struct AssignRequest {
    teacher_id: String,
    role_id: String,
    event_id: String,
}

#[derive(Serialize)]
pub struct AssignResponse {
    message: &'static str,
    assignment: Assignment,
}

pub async fn assign(
    State(roster): State<Roster>,
    body: Result<Json<AssignRequest>, JsonRejection>,
) -> Result<Json<AssignResponse>, RosterError> {
    let request = payload(body)?;
    let assignment = roster
        .assign(
            parse_id(&request.teacher_id)?,
            parse_id(&request.role_id)?,
            parse_id(&request.event_id)?,
        )
        .await?;
    Ok(Json(AssignResponse {
        message: "teacher assigned to role",
        assignment,
    }))
}

#[derive(Deserialize)]
pub struct UnassignRequest {
    assignment_id: String,
    #[serde(default)]
    deduct_points: bool,
}

#[derive(Serialize)]
pub struct UnassignResponse {
    message: &'static str,
    deducted_points: bool,
}

pub async fn unassign(
    State(roster): State<Roster>,
    body: Result<Json<UnassignRequest>, JsonRejection>,
) -> Result<Json<UnassignResponse>, RosterError> {
    let request = payload(body)?;
    let outcome = roster
        .unassign(parse_id(&request.assignment_id)?, request.deduct_points)
        .await?;
    Ok(Json(UnassignResponse {
        message: "role assignment deleted",
        deducted_points: outcome.deducted_points,
    }))
}
