use event_roster_database::models::{Assignment, Event, RecordId, Role};
use event_roster_database::{fields, find_records, get_record, Collection, Filter, Store};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::RosterError;
use crate::ledger::{deduction, PointLedger};
use crate::sync::Denormalizer;

/// What a cascade removed. `skipped` counts the bookkeeping steps that failed and were passed
/// over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDeletion {
    pub event_id: RecordId,
    pub event_name: String,
    pub deducted_points: bool,
    pub roles_removed: u64,
    pub assignments_removed: u64,
    pub skipped: u64,
}

#[derive(Clone)]
pub struct CascadeDeleter {
    store: Store,
    ledger: PointLedger,
    denormalizer: Denormalizer,
}

impl CascadeDeleter {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            ledger: PointLedger::new(store.clone()),
            denormalizer: Denormalizer::new(store.clone()),
            store,
        }
    }

    /// Removes an event together with its roles and their assignments.
    ///
    /// Point deductions and summary removals for individual assignments are best effort: a
    /// failure is logged and counted in [`EventDeletion::skipped`]. Failing to resolve the
    /// event, to list its roles or to delete the roles or the event itself aborts the call.
    #[instrument(skip(self), err)]
    pub async fn delete_event(
        &self,
        event_id: RecordId,
        deduct_points: bool,
    ) -> Result<EventDeletion, RosterError> {
        let store = self.store.as_ref();

        let event: Event = get_record(store, event_id)
            .await?
            .ok_or(RosterError::not_found(Collection::Events, event_id))?;
        let roles: Vec<Role> =
            find_records(store, &Filter::new().eq(fields::EVENT_ID, event_id)).await?;

        let mut deletion = EventDeletion {
            event_id,
            event_name: event.name,
            deducted_points: deduct_points,
            roles_removed: 0,
            assignments_removed: 0,
            skipped: 0,
        };

        for role in &roles {
            let by_role = Filter::new().eq(fields::ROLE_ID, role.id);
            match find_records::<Assignment>(store, &by_role).await {
                Ok(assignments) => {
                    for assignment in &assignments {
                        deletion.skipped += self.retire(role, assignment, deduct_points).await;
                    }
                }
                Err(error) => {
                    warn!(role_id = %role.id, %error, "could not list assignments of role");
                    deletion.skipped += 1;
                }
            }
            match store.delete_many(Collection::Assignments, &by_role).await {
                Ok(removed) => deletion.assignments_removed += removed,
                Err(error) => {
                    warn!(role_id = %role.id, %error, "could not delete assignments of role");
                    deletion.skipped += 1;
                }
            }
        }

        deletion.roles_removed = store
            .delete_many(
                Collection::Roles,
                &Filter::new().eq(fields::EVENT_ID, event_id),
            )
            .await?;
        store
            .delete_one(Collection::Events, &Filter::by_id(event_id))
            .await?;

        info!(
            roles = deletion.roles_removed,
            assignments = deletion.assignments_removed,
            skipped = deletion.skipped,
            "deleted event"
        );
        Ok(deletion)
    }

    /// Undoes the bookkeeping of one assignment and returns how many steps failed.
    async fn retire(&self, role: &Role, assignment: &Assignment, deduct_points: bool) -> u64 {
        let mut failed = 0;
        if deduct_points {
            let deducted = match deduction(role) {
                Ok(delta) => self.ledger.adjust_points(assignment.teacher_id, delta).await,
                Err(error) => Err(error),
            };
            if let Err(error) = deducted {
                warn!(assignment_id = %assignment.id, %error, "could not deduct points");
                failed += 1;
            }
        }
        if let Err(error) = self
            .denormalizer
            .remove_assigned_teacher(assignment.event_id, assignment.id)
            .await
        {
            warn!(assignment_id = %assignment.id, %error, "could not remove event summary");
            failed += 1;
        }
        if let Err(error) = self
            .denormalizer
            .remove_assigned_role(assignment.teacher_id, assignment.id)
            .await
        {
            warn!(assignment_id = %assignment.id, %error, "could not remove teacher summary");
            failed += 1;
        }
        failed
    }
}
