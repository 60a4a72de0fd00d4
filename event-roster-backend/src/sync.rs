//! Embedded summary arrays are derived data: the assignment and role collections are the source
//! of truth and these arrays are kept in step with them one document at a time.

use event_roster_database::models::{
    AssignedRoleSummary, AssignedTeacherSummary, RecordId, RoleSummary,
};
use event_roster_database::{fields, Collection, DatabaseError, Filter, Store, Update};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::RosterError;

#[derive(Clone)]
pub struct Denormalizer {
    store: Store,
}

impl Denormalizer {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    #[instrument(level = "debug", skip(self, summary), err)]
    pub async fn append_role_summary(
        &self,
        event_id: RecordId,
        summary: &RoleSummary,
    ) -> Result<(), RosterError> {
        self.push(Collection::Events, event_id, fields::ROLES, summary)
            .await
    }

    #[instrument(level = "debug", skip(self, summary), fields(assignment_id = %summary.assignment_id), err)]
    pub async fn append_assigned_teacher(
        &self,
        event_id: RecordId,
        summary: &AssignedTeacherSummary,
    ) -> Result<(), RosterError> {
        self.push(Collection::Events, event_id, fields::ASSIGNED_TEACHERS, summary)
            .await
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn remove_assigned_teacher(
        &self,
        event_id: RecordId,
        assignment_id: RecordId,
    ) -> Result<(), RosterError> {
        self.pull(
            Collection::Events,
            event_id,
            fields::ASSIGNED_TEACHERS,
            assignment_id,
        )
        .await
    }

    #[instrument(level = "debug", skip(self, summary), fields(assignment_id = %summary.assignment_id), err)]
    pub async fn append_assigned_role(
        &self,
        teacher_id: RecordId,
        summary: &AssignedRoleSummary,
    ) -> Result<(), RosterError> {
        self.push(Collection::Teachers, teacher_id, fields::ASSIGNED_ROLES, summary)
            .await
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn remove_assigned_role(
        &self,
        teacher_id: RecordId,
        assignment_id: RecordId,
    ) -> Result<(), RosterError> {
        self.pull(
            Collection::Teachers,
            teacher_id,
            fields::ASSIGNED_ROLES,
            assignment_id,
        )
        .await
    }

    async fn push(
        &self,
        collection: Collection,
        owner: RecordId,
        field: &str,
        summary: &impl Serialize,
    ) -> Result<(), RosterError> {
        let value = serde_json::to_value(summary).map_err(DatabaseError::from)?;
        if self
            .mutate(collection, owner, Update::push(field, value))
            .await?
            == 0
        {
            return Err(RosterError::not_found(collection, owner));
        }
        Ok(())
    }

    // summaries are always located by assignment id, never by role or teacher. A missing
    // owner has no summary left to remove.
    async fn pull(
        &self,
        collection: Collection,
        owner: RecordId,
        field: &str,
        assignment_id: RecordId,
    ) -> Result<(), RosterError> {
        let matched = self
            .mutate(
                collection,
                owner,
                Update::pull(field, Filter::new().eq(fields::ASSIGNMENT_ID, assignment_id)),
            )
            .await?;
        if matched == 0 {
            debug!(%collection, %owner, "owner of embedded summary is gone");
        }
        Ok(())
    }

    async fn mutate(
        &self,
        collection: Collection,
        owner: RecordId,
        update: Update,
    ) -> Result<u64, RosterError> {
        let matched = self
            .store
            .update_one(collection, &Filter::by_id(owner), &update)
            .await?;
        debug!(%collection, %owner, matched, "synchronized embedded summary");
        Ok(matched)
    }
}
