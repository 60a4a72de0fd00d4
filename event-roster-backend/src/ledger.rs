use event_roster_database::models::{RecordId, Role};
use event_roster_database::{fields, Collection, Filter, Store, Update};
use tracing::{debug, instrument};

use crate::error::RosterError;

/// The only writer of a teacher's point total. Adjustments are relative increments applied by
/// the store, so concurrent adjustments of the same teacher add up.
#[derive(Clone)]
pub struct PointLedger {
    store: Store,
}

impl PointLedger {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn adjust_points(&self, teacher_id: RecordId, delta: i64) -> Result<(), RosterError> {
        let matched = self
            .store
            .update_one(
                Collection::Teachers,
                &Filter::by_id(teacher_id),
                &Update::inc(fields::POINTS, delta),
            )
            .await?;
        if matched == 0 {
            return Err(RosterError::not_found(Collection::Teachers, teacher_id));
        }
        debug!("adjusted teacher points");
        Ok(())
    }
}

/// The delta that takes back the points of `role`. `i64::MIN` has no negation.
pub fn deduction(role: &Role) -> Result<i64, RosterError> {
    role.points.checked_neg().ok_or_else(|| {
        RosterError::InvalidInput(format!(
            "points {} of role {} cannot be deducted",
            role.points, role.id
        ))
    })
}

#[cfg(test)]
mod tests {
    use event_roster_database::models::{RecordId, Role, Teacher};
    use event_roster_database::{get_record, Collection};

    use super::{deduction, PointLedger};
    use crate::error::RosterError;
    use crate::testing::{memory_store, seed_teacher};

    #[tokio::test]
    async fn adjustments_are_additive_and_unclamped() -> Result<(), RosterError> {
        let (store, _memory) = memory_store();
        let teacher = seed_teacher(&store, "Grace").await?;
        let ledger = PointLedger::new(store.clone());

        ledger.adjust_points(teacher.id, 10).await?;
        ledger.adjust_points(teacher.id, -25).await?;

        let teacher: Teacher = get_record(store.as_ref(), teacher.id).await?.unwrap();
        assert_eq!(teacher.points, -15);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_adjustments_are_not_lost() -> Result<(), RosterError> {
        let (store, _memory) = memory_store();
        let teacher = seed_teacher(&store, "Grace").await?;
        let ledger = PointLedger::new(store.clone());
        let teacher_id = teacher.id;

        let tasks: Vec<_> = (0..32)
            .map(|index| {
                let ledger = ledger.clone();
                let delta = if index % 2 == 0 { 7 } else { -3 };
                tokio::spawn(async move { ledger.adjust_points(teacher_id, delta).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap()?;
        }

        let teacher: Teacher = get_record(store.as_ref(), teacher_id).await?.unwrap();
        assert_eq!(teacher.points, 16 * 7 - 16 * 3);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_teacher_is_not_found() {
        let (store, _memory) = memory_store();
        let missing = RecordId::generate();
        let error = PointLedger::new(store)
            .adjust_points(missing, 1)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            RosterError::NotFound {
                collection: Collection::Teachers,
                id,
            } if id == missing
        ));
    }

    #[test]
    fn deduction_negates_and_refuses_the_minimum() {
        let id = RecordId::generate();
        let mut role = Role {
            id,
            event_id: id,
            event_name: "Open day".to_owned(),
            name: "Guide".to_owned(),
            points: 12,
            head_count: 1,
        };
        assert_eq!(deduction(&role).ok(), Some(-12));
        role.points = -4;
        assert_eq!(deduction(&role).ok(), Some(4));
        role.points = i64::MIN;
        assert!(matches!(deduction(&role), Err(RosterError::InvalidInput(_))));
    }
}
