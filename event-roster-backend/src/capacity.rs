use event_roster_database::models::Role;

/// Whether one more assignment fits into `role` given the number of live assignments counted
/// just before. The count is a snapshot, not a reservation: two callers may both see room.
#[must_use]
pub fn can_assign(role: &Role, live_assignments: u64) -> bool {
    live_assignments < u64::from(role.head_count)
}

#[cfg(test)]
mod tests {
    use event_roster_database::models::{RecordId, Role};

    use super::can_assign;

    fn role(head_count: u32) -> Role {
        let id = RecordId::generate();
        Role {
            id,
            event_id: id,
            event_name: "Sports day".to_owned(),
            name: "Referee".to_owned(),
            points: 5,
            head_count,
        }
    }

    #[test]
    fn allows_until_head_count_is_reached() {
        let referee = role(2);
        assert!(can_assign(&referee, 0));
        assert!(can_assign(&referee, 1));
        assert!(!can_assign(&referee, 2));
        assert!(!can_assign(&referee, 3));
    }

    #[test]
    fn zero_head_count_never_admits() {
        assert!(!can_assign(&role(0), 0));
    }
}
