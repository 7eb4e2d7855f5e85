//! Property-based tests for the slot admission rules.
//!
//! These use `proptest` to verify the invariants that example-based tests
//! cannot pin down: whatever sequence of admissions and removals a slot sees,
//! the capacity bound, the list ordering, and the displacement margin must
//! hold. Run with `PROPTEST_CASES=10000 cargo test --test slot_property_tests`
//! for a deeper sweep.

use proptest::prelude::*;

use tourdesk::api::{SlotId, TourCode};
use tourdesk::models::calendar::SlotKey;
use tourdesk::models::priority::priority_score;
use tourdesk::models::slot::{AdmissionOutcome, RemoveOutcome, SlotEntry, TimeSlot, PRIORITY_BIAS};

fn code(i: usize) -> TourCode {
    TourCode::new(format!("Tour{:04}", i))
}

/// Checks the ascending `(priority, seq)` order of a slot list.
fn is_ordered(entries: &[SlotEntry]) -> bool {
    entries
        .windows(2)
        .all(|w| (w[0].priority, w[0].seq) <= (w[1].priority, w[1].seq))
}

proptest! {
    /// Admission never loses a tour: everyone who asked is either seated or
    /// waiting, and the seats never exceed capacity.
    #[test]
    fn prop_admission_conserves_membership(
        priorities in prop::collection::vec(0i32..500, 1..20),
        capacity in 1usize..5,
    ) {
        let mut slot = TimeSlot::new(SlotId::new(1), capacity);
        for (i, priority) in priorities.iter().enumerate() {
            slot.request_admission(code(i), *priority).unwrap();
        }

        prop_assert!(slot.admitted().len() <= capacity);
        prop_assert_eq!(
            slot.admitted().len() + slot.waitlisted().len(),
            priorities.len()
        );
        for i in 0..priorities.len() {
            prop_assert!(slot.contains(&code(i)));
        }
    }

    /// Both lists stay sorted by `(priority, seq)` through any admission
    /// sequence, and no tour appears in both.
    #[test]
    fn prop_lists_stay_ordered_and_disjoint(
        priorities in prop::collection::vec(0i32..500, 1..20),
        capacity in 1usize..5,
    ) {
        let mut slot = TimeSlot::new(SlotId::new(1), capacity);
        for (i, priority) in priorities.iter().enumerate() {
            slot.request_admission(code(i), *priority).unwrap();
        }

        prop_assert!(is_ordered(slot.admitted()));
        prop_assert!(is_ordered(slot.waitlisted()));
        for entry in slot.admitted() {
            prop_assert!(!slot.is_waitlisted(&entry.code));
        }
    }

    /// A full slot gives up a seat only when the challenger clears the margin
    /// over the weakest incumbent, and the bumped incumbent is exactly that
    /// weakest one.
    #[test]
    fn prop_displacement_needs_margin_over_weakest(
        priorities in prop::collection::vec(0i32..500, 3..10),
        challenger in 0i32..1000,
    ) {
        // Capacity below the admission count guarantees a full slot
        let capacity = 2usize;
        let mut slot = TimeSlot::new(SlotId::new(1), capacity);
        for (i, priority) in priorities.iter().enumerate() {
            slot.request_admission(code(i), *priority).unwrap();
        }
        let weakest = slot.admitted()[0].clone();

        let outcome = slot
            .request_admission(TourCode::new("Challenger"), challenger)
            .unwrap();

        let clears_margin = (weakest.priority as i64 + PRIORITY_BIAS as i64) < challenger as i64;
        match outcome {
            AdmissionOutcome::Admitted { displaced } => {
                prop_assert!(clears_margin);
                prop_assert_eq!(displaced, Some(weakest.code));
            }
            AdmissionOutcome::Waitlisted => prop_assert!(!clears_margin),
        }
        prop_assert_eq!(slot.admitted().len(), capacity);
    }

    /// Removing an admitted tour refills the seat from the waitlist whenever
    /// anyone is waiting, and a second removal of the same code is a no-op.
    #[test]
    fn prop_remove_refills_and_is_idempotent(
        priorities in prop::collection::vec(0i32..500, 4..12),
        victim in 0usize..4,
    ) {
        let capacity = 3usize;
        let mut slot = TimeSlot::new(SlotId::new(1), capacity);
        for (i, priority) in priorities.iter().enumerate() {
            slot.request_admission(code(i), *priority).unwrap();
        }
        let target = slot.admitted()[victim.min(slot.admitted().len() - 1)]
            .code
            .clone();
        let had_waiters = !slot.waitlisted().is_empty();
        let members_before = slot.admitted().len() + slot.waitlisted().len();

        let outcome = slot.remove(&target);
        match outcome {
            RemoveOutcome::RemovedFromAdmitted { ref promoted } => {
                prop_assert_eq!(promoted.is_some(), had_waiters);
            }
            _ => prop_assert!(false, "expected a removal from the admitted list"),
        }
        if had_waiters {
            prop_assert_eq!(slot.admitted().len(), capacity);
        }
        prop_assert_eq!(
            slot.admitted().len() + slot.waitlisted().len(),
            members_before - 1
        );
        prop_assert!(!slot.contains(&target));

        prop_assert_eq!(slot.remove(&target), RemoveOutcome::NotPresent);
    }

    /// Promotion always takes the strongest waiting tour.
    #[test]
    fn prop_promotion_takes_strongest_waiter(
        priorities in prop::collection::vec(0i32..200, 5..12),
    ) {
        let capacity = 2usize;
        let mut slot = TimeSlot::new(SlotId::new(1), capacity);
        for (i, priority) in priorities.iter().enumerate() {
            slot.request_admission(code(i), *priority).unwrap();
        }
        prop_assume!(!slot.waitlisted().is_empty());

        let expected = slot.waitlisted().last().unwrap().code.clone();
        let victim = slot.admitted()[0].code.clone();

        match slot.remove(&victim) {
            RemoveOutcome::RemovedFromAdmitted { promoted } => {
                prop_assert_eq!(promoted, Some(expected.clone()));
            }
            other => prop_assert!(false, "unexpected outcome: {:?}", other),
        }
        prop_assert!(slot.is_admitted(&expected));
    }
}

proptest! {
    /// Calendar addresses survive the trip through their stored id.
    #[test]
    fn prop_slot_key_round_trips_through_id(
        year in 2020i32..2100,
        month in 1u32..=12,
        day in 1u32..=28,
        index in 0u8..4,
    ) {
        let date = chrono::NaiveDate::from_ymd_opt(year, month, day).unwrap();
        let key = SlotKey::from_parts(date, index).unwrap();
        let back = SlotKey::from_slot_id(key.slot_id()).unwrap();
        prop_assert_eq!(back, key);
    }

    /// Distinct calendar positions never collide on the same id.
    #[test]
    fn prop_slot_ids_are_distinct_per_position(
        day_offset in 0i64..3650,
        index_a in 0u8..4,
        index_b in 0u8..4,
    ) {
        let base = chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let date = base + chrono::Days::new(day_offset as u64);
        let key_a = SlotKey::from_parts(date, index_a).unwrap();
        let key_b = SlotKey::from_parts(date, index_b).unwrap();
        if index_a != index_b {
            prop_assert_ne!(key_a.slot_id(), key_b.slot_id());
        } else {
            prop_assert_eq!(key_a.slot_id(), key_b.slot_id());
        }
    }

    /// The weighted score never rounds a tour past a competitor with better
    /// raw scores.
    #[test]
    fn prop_priority_score_is_monotone(
        persistence in 0i32..1000,
        quality in 0i32..1000,
        distance in 0i32..1000,
    ) {
        let base = priority_score(persistence, quality, distance);
        prop_assert!(base >= 0);
        prop_assert!(priority_score(persistence + 1, quality, distance) >= base);
        prop_assert!(priority_score(persistence, quality + 1, distance) >= base);
        prop_assert!(priority_score(persistence, quality, distance + 1) >= base);
    }
}
