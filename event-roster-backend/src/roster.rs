use event_roster_database::models::{Assignment, Event, RecordId, Role, Teacher};
use event_roster_database::{fields, find_records, Filter, Store};
use tracing::instrument;

use crate::authoring::{Authoring, EventUpdate, NewEvent, NewRole, NewTeacher};
use crate::cascade::{CascadeDeleter, EventDeletion};
use crate::error::RosterError;
use crate::lifecycle::{AssignmentLifecycle, Unassignment};

/// Entry point to the engine. Cloning is cheap; every clone shares the same store handle.
#[derive(Clone)]
pub struct Roster {
    store: Store,
    authoring: Authoring,
    lifecycle: AssignmentLifecycle,
    cascade: CascadeDeleter,
}

impl Roster {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            authoring: Authoring::new(store.clone()),
            lifecycle: AssignmentLifecycle::new(store.clone()),
            cascade: CascadeDeleter::new(store.clone()),
            store,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    pub async fn create_event(&self, new: NewEvent) -> Result<Event, RosterError> {
        self.authoring.create_event(new).await
    }

    pub async fn update_event(
        &self,
        event_id: RecordId,
        new: NewEvent,
    ) -> Result<EventUpdate, RosterError> {
        self.authoring.update_event(event_id, new).await
    }

    pub async fn create_teacher(&self, new: NewTeacher) -> Result<Teacher, RosterError> {
        self.authoring.create_teacher(new).await
    }

    pub async fn create_role(&self, event_id: RecordId, new: NewRole) -> Result<Role, RosterError> {
        self.authoring.create_role(event_id, new).await
    }

    pub async fn assign(
        &self,
        teacher_id: RecordId,
        role_id: RecordId,
        event_id: RecordId,
    ) -> Result<Assignment, RosterError> {
        self.lifecycle.assign(teacher_id, role_id, event_id).await
    }

    pub async fn unassign(
        &self,
        assignment_id: RecordId,
        deduct_points: bool,
    ) -> Result<Unassignment, RosterError> {
        self.lifecycle.unassign(assignment_id, deduct_points).await
    }

    pub async fn delete_event(
        &self,
        event_id: RecordId,
        deduct_points: bool,
    ) -> Result<EventDeletion, RosterError> {
        self.cascade.delete_event(event_id, deduct_points).await
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn list_assignments_for_teacher(
        &self,
        teacher_id: RecordId,
    ) -> Result<Vec<Assignment>, RosterError> {
        self.assignments_where(fields::TEACHER_ID, teacher_id).await
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn list_assignments_for_role(
        &self,
        role_id: RecordId,
    ) -> Result<Vec<Assignment>, RosterError> {
        self.assignments_where(fields::ROLE_ID, role_id).await
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn list_assigned_teachers_for_event(
        &self,
        event_id: RecordId,
    ) -> Result<Vec<Assignment>, RosterError> {
        self.assignments_where(fields::EVENT_ID, event_id).await
    }

    /// Assignments of one teacher within one event, each naming its role.
    #[instrument(level = "debug", skip(self), err)]
    pub async fn list_assignments_for_teacher_in_event(
        &self,
        teacher_id: RecordId,
        event_id: RecordId,
    ) -> Result<Vec<Assignment>, RosterError> {
        let filter = Filter::new()
            .eq(fields::TEACHER_ID, teacher_id)
            .eq(fields::EVENT_ID, event_id);
        Ok(find_records(self.store.as_ref(), &filter).await?)
    }

    async fn assignments_where(
        &self,
        field: &str,
        id: RecordId,
    ) -> Result<Vec<Assignment>, RosterError> {
        Ok(find_records(self.store.as_ref(), &Filter::new().eq(field, id)).await?)
    }
}
