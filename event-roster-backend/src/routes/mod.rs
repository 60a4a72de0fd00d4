pub mod assignments;
pub mod authoring;
pub mod events;
pub mod reads;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use event_roster_database::models::RecordId;

use crate::error::RosterError;

pub(crate) fn parse_id(id: &str) -> Result<RecordId, RosterError> {
    Ok(id.parse::<RecordId>()?)
}

/// Unwraps a JSON body, turning a malformed one into [`RosterError::InvalidInput`].
pub(crate) fn payload<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, RosterError> {
    let Json(value) = body?;
    Ok(value)
}
