use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{parse_id, payload};
use crate::authoring::{EventUpdate, NewEvent};
use crate::cascade::EventDeletion;
use crate::error::RosterError;
use crate::roster::Roster;

#[derive(Deserialize)]
pub struct DeleteEventRequest {
    event_id: String,
    #[serde(default)]
    deduct_points: bool,
}

#[derive(Serialize)]
pub struct DeleteEventResponse {
    message: &'static str,
    #[serde(flatten)]
    deletion: EventDeletion,
}

pub async fn delete_event(
    State(roster): State<Roster>,
    body: Result<Json<DeleteEventRequest>, JsonRejection>,
) -> Result<Json<DeleteEventResponse>, RosterError> {
    let request = payload(body)?;
    let deletion = roster
        .delete_event(parse_id(&request.event_id)?, request.deduct_points)
        .await?;
    Ok(Json(DeleteEventResponse {
        message: "event and all associated data deleted",
        deletion,
    }))
}

#[derive(Serialize)]
pub struct UpdateEventResponse {
    message: &'static str,
    #[serde(flatten)]
    update: EventUpdate,
}

pub async fn update_event(
    State(roster): State<Roster>,
    Path(event_id): Path<String>,
    body: Result<Json<NewEvent>, JsonRejection>,
) -> Result<Json<UpdateEventResponse>, RosterError> {
    let event_id = parse_id(&event_id)?;
    let update = roster.update_event(event_id, payload(body)?).await?;
    Ok(Json(UpdateEventResponse {
        message: "event updated",
        update,
    }))
}
