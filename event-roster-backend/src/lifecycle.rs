//! Creation and retirement of assignments.
//!
//! Every step is an independent store call and nothing is compensated: when a step after the
//! insert fails, the assignment stays live without its points or summaries and the error is
//! returned as is.

use event_roster_database::models::{Assignment, Event, RecordId, Role, Teacher};
use event_roster_database::{fields, get_record, insert_record, Collection, Filter, Store};
use serde::Serialize;
use tracing::{info, instrument};

use crate::capacity::can_assign;
use crate::error::RosterError;
use crate::ledger::{deduction, PointLedger};
use crate::sync::Denormalizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Unassignment {
    pub assignment_id: RecordId,
    pub deducted_points: bool,
}

#[derive(Clone)]
pub struct AssignmentLifecycle {
    store: Store,
    ledger: PointLedger,
    denormalizer: Denormalizer,
}

impl AssignmentLifecycle {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            ledger: PointLedger::new(store.clone()),
            denormalizer: Denormalizer::new(store.clone()),
            store,
        }
    }

    #[instrument(skip(self), err)]
    pub async fn assign(
        &self,
        teacher_id: RecordId,
        role_id: RecordId,
        event_id: RecordId,
    ) -> Result<Assignment, RosterError> {
        let store = self.store.as_ref();

        let role: Role = get_record(store, role_id)
            .await?
            .ok_or(RosterError::not_found(Collection::Roles, role_id))?;
        let event: Event = get_record(store, event_id)
            .await?
            .ok_or(RosterError::not_found(Collection::Events, event_id))?;
        let teacher: Teacher = get_record(store, teacher_id)
            .await?
            .ok_or(RosterError::not_found(Collection::Teachers, teacher_id))?;
        if role.event_id != event_id {
            return Err(RosterError::InvalidInput(format!(
                "role {role_id} does not belong to event {event_id}"
            )));
        }

        let existing = store
            .count(
                Collection::Assignments,
                &Filter::new()
                    .eq(fields::TEACHER_ID, teacher_id)
                    .eq(fields::ROLE_ID, role_id)
                    .eq(fields::EVENT_ID, event_id),
            )
            .await?;
        if existing > 0 {
            return Err(RosterError::Conflict {
                teacher_id,
                role_id,
                event_id,
            });
        }

        let live = store
            .count(
                Collection::Assignments,
                &Filter::new().eq(fields::ROLE_ID, role_id),
            )
            .await?;
        if !can_assign(&role, live) {
            return Err(RosterError::CapacityExceeded {
                role_id,
                head_count: role.head_count,
            });
        }

        let assignment = Assignment {
            id: RecordId::generate(),
            event_id,
            event_name: event.name,
            teacher_id,
            role_id,
            role_name: role.name,
        };
        insert_record(store, &assignment).await?;

        self.ledger.adjust_points(teacher_id, role.points).await?;

        self.denormalizer
            .append_assigned_teacher(event_id, &assignment.teacher_summary(&teacher.name))
            .await?;
        self.denormalizer
            .append_assigned_role(teacher_id, &assignment.role_summary())
            .await?;

        info!(assignment_id = %assignment.id, points = role.points, "assigned teacher to role");
        Ok(assignment)
    }

    #[instrument(skip(self), err)]
    pub async fn unassign(
        &self,
        assignment_id: RecordId,
        deduct_points: bool,
    ) -> Result<Unassignment, RosterError> {
        let store = self.store.as_ref();

        let assignment: Assignment = get_record(store, assignment_id)
            .await?
            .ok_or(RosterError::not_found(Collection::Assignments, assignment_id))?;

        if deduct_points {
            let role: Role = get_record(store, assignment.role_id)
                .await?
                .ok_or(RosterError::not_found(Collection::Roles, assignment.role_id))?;
            self.ledger
                .adjust_points(assignment.teacher_id, deduction(&role)?)
                .await?;
        }

        self.denormalizer
            .remove_assigned_teacher(assignment.event_id, assignment.id)
            .await?;
        self.denormalizer
            .remove_assigned_role(assignment.teacher_id, assignment.id)
            .await?;

        store
            .delete_one(Collection::Assignments, &Filter::by_id(assignment.id))
            .await?;

        info!(deduct_points, "removed assignment");
        Ok(Unassignment {
            assignment_id,
            deducted_points: deduct_points,
        })
    }
}

#[cfg(test)]
mod tests {
    use event_roster_database::models::{Event, RecordId, Role, Teacher};
    use event_roster_database::{get_record, insert_record, Collection, Operation};

    use super::AssignmentLifecycle;
    use crate::error::{ErrorKind, RosterError};
    use crate::testing::{memory_store, seed_event, seed_role, seed_teacher};

    #[tokio::test]
    async fn assignment_carries_names_and_updates_both_summaries() -> Result<(), RosterError> {
        let (store, _memory) = memory_store();
        let event = seed_event(&store, "Open day").await?;
        let role = seed_role(&store, event.id, "Guide", 10, 2).await?;
        let teacher = seed_teacher(&store, "Ada").await?;
        let lifecycle = AssignmentLifecycle::new(store.clone());

        let assignment = lifecycle.assign(teacher.id, role.id, event.id).await?;
        assert_eq!(assignment.event_name, "Open day");
        assert_eq!(assignment.role_name, "Guide");

        let event: Event = get_record(store.as_ref(), event.id).await?.unwrap();
        assert_eq!(
            event.assigned_teachers,
            vec![assignment.teacher_summary("Ada")]
        );
        let teacher: Teacher = get_record(store.as_ref(), teacher.id).await?.unwrap();
        assert_eq!(teacher.points, 10);
        assert_eq!(teacher.assigned_roles, vec![assignment.role_summary()]);
        Ok(())
    }

    #[tokio::test]
    async fn missing_records_are_not_found() -> Result<(), RosterError> {
        let (store, _memory) = memory_store();
        let event = seed_event(&store, "Open day").await?;
        let role = seed_role(&store, event.id, "Guide", 10, 2).await?;
        let lifecycle = AssignmentLifecycle::new(store);

        let error = lifecycle
            .assign(RecordId::generate(), role.id, event.id)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            RosterError::NotFound {
                collection: Collection::Teachers,
                ..
            }
        ));

        let error = lifecycle
            .unassign(RecordId::generate(), true)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            RosterError::NotFound {
                collection: Collection::Assignments,
                ..
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn role_of_another_event_is_rejected() -> Result<(), RosterError> {
        let (store, memory) = memory_store();
        let open_day = seed_event(&store, "Open day").await?;
        let concert = seed_event(&store, "Concert").await?;
        let guide = seed_role(&store, open_day.id, "Guide", 10, 2).await?;
        let teacher = seed_teacher(&store, "Ada").await?;

        let error = AssignmentLifecycle::new(store)
            .assign(teacher.id, guide.id, concert.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
        assert!(memory.is_empty(Collection::Assignments));
        Ok(())
    }

    #[tokio::test]
    async fn failed_ledger_step_leaves_an_orphaned_assignment() -> Result<(), RosterError> {
        let (store, memory) = memory_store();
        let event = seed_event(&store, "Open day").await?;
        let role = seed_role(&store, event.id, "Guide", 10, 2).await?;
        let teacher = seed_teacher(&store, "Ada").await?;
        memory.fail(Collection::Teachers, Operation::UpdateOne);

        let error = AssignmentLifecycle::new(store.clone())
            .assign(teacher.id, role.id, event.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StoreError);

        memory.recover(Collection::Teachers, Operation::UpdateOne);
        assert_eq!(memory.len(Collection::Assignments), 1);
        let event: Event = get_record(store.as_ref(), event.id).await?.unwrap();
        assert!(event.assigned_teachers.is_empty());
        let teacher: Teacher = get_record(store.as_ref(), teacher.id).await?.unwrap();
        assert_eq!(teacher.points, 0);
        Ok(())
    }

    #[tokio::test]
    async fn unassign_without_deduction_keeps_points() -> Result<(), RosterError> {
        let (store, memory) = memory_store();
        let event = seed_event(&store, "Open day").await?;
        let role = seed_role(&store, event.id, "Guide", 10, 2).await?;
        let teacher = seed_teacher(&store, "Ada").await?;
        let lifecycle = AssignmentLifecycle::new(store.clone());

        let assignment = lifecycle.assign(teacher.id, role.id, event.id).await?;
        let outcome = lifecycle.unassign(assignment.id, false).await?;
        assert!(!outcome.deducted_points);

        assert!(memory.is_empty(Collection::Assignments));
        let event: Event = get_record(store.as_ref(), event.id).await?.unwrap();
        assert!(event.assigned_teachers.is_empty());
        let teacher: Teacher = get_record(store.as_ref(), teacher.id).await?.unwrap();
        assert_eq!(teacher.points, 10);
        assert!(teacher.assigned_roles.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn undeductible_points_are_rejected_without_side_effects() -> Result<(), RosterError> {
        let (store, memory) = memory_store();
        let event = seed_event(&store, "Open day").await?;
        let teacher = seed_teacher(&store, "Ada").await?;
        let role = Role {
            id: RecordId::generate(),
            event_id: event.id,
            event_name: event.name.clone(),
            name: "Guide".to_owned(),
            points: i64::MIN,
            head_count: 1,
        };
        insert_record(store.as_ref(), &role).await?;
        let lifecycle = AssignmentLifecycle::new(store.clone());
        let assignment = lifecycle.assign(teacher.id, role.id, event.id).await?;

        let error = lifecycle.unassign(assignment.id, true).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
        assert_eq!(memory.len(Collection::Assignments), 1);
        let teacher: Teacher = get_record(store.as_ref(), teacher.id).await?.unwrap();
        assert_eq!(teacher.points, i64::MIN);
        assert_eq!(teacher.assigned_roles, vec![assignment.role_summary()]);

        lifecycle.unassign(assignment.id, false).await?;
        assert!(memory.is_empty(Collection::Assignments));
        Ok(())
    }
}
