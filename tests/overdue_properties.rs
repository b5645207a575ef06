//! Property-based tests for the due-date and overdue-status engine.
//!
//! Covers the invariants of `overdue`:
//! - due date placement and day-of-month clamping
//! - overdue counting within a month and its reset on the next cycle
//! - status idempotence and terminated absorption
//! - payday range validation

use chrono::{Datelike, Duration, NaiveDate};
use proptest::prelude::*;

use leasekeeper::models::ContractStatus;
use leasekeeper::overdue::{
    OverdueError, days_in_month, due_date_this_month, next_due_date, next_status, overdue_days,
    reconcile,
};

// =============================================================================
// Strategies
// =============================================================================

/// Any calendar date between 2000-01-01 and roughly 2060.
fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..22_000).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(offset)
    })
}

fn arb_payday() -> impl Strategy<Value = i32> {
    1i32..=31
}

fn arb_status() -> impl Strategy<Value = ContractStatus> {
    prop_oneof![
        Just(ContractStatus::Active),
        Just(ContractStatus::Overdue),
        Just(ContractStatus::Terminated),
    ]
}

fn arb_lease_end() -> impl Strategy<Value = Option<NaiveDate>> {
    prop_oneof![Just(None), arb_date().prop_map(Some)]
}

fn add_month(date: NaiveDate) -> (i32, u32) {
    if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    }
}

// =============================================================================
// Due dates
// =============================================================================

proptest! {
    #[test]
    fn next_due_date_is_clamped_and_within_a_month(today in arb_date(), payday in arb_payday()) {
        let due = next_due_date(today, payday).unwrap();
        prop_assert!(due >= today);

        let same_month = (due.year(), due.month()) == (today.year(), today.month());
        let following = (due.year(), due.month()) == add_month(today);
        prop_assert!(same_month || following, "due {due} too far from {today}");

        let expected_day = (payday as u32).min(days_in_month(due.year(), due.month()).unwrap());
        prop_assert_eq!(due.day(), expected_day);
    }

    #[test]
    fn due_date_this_month_never_leaves_the_month(today in arb_date(), payday in arb_payday()) {
        let due = due_date_this_month(today, payday).unwrap();
        prop_assert_eq!((due.year(), due.month()), (today.year(), today.month()));
        prop_assert!(due.day() <= payday as u32);
    }
}

// =============================================================================
// Overdue counting
// =============================================================================

proptest! {
    #[test]
    fn overdue_is_zero_exactly_up_to_the_due_date(today in arb_date(), payday in arb_payday()) {
        let due = due_date_this_month(today, payday).unwrap();
        let days = overdue_days(today, payday).unwrap();
        if today <= due {
            prop_assert_eq!(days, 0);
        } else {
            prop_assert_eq!(i64::from(days), (today - due).num_days());
        }
    }

    #[test]
    fn overdue_grows_one_day_at_a_time_until_month_end(today in arb_date(), payday in arb_payday()) {
        let tomorrow = today + Duration::days(1);
        let before = overdue_days(today, payday).unwrap();
        let after = overdue_days(tomorrow, payday).unwrap();
        if tomorrow.month() == today.month() {
            prop_assert!(after == before || after == before + 1);
            if before > 0 {
                prop_assert_eq!(after, before + 1);
            }
        } else {
            // First of the month: every payday is still ahead or today.
            prop_assert_eq!(after, 0);
        }
    }
}

// =============================================================================
// Status rules
// =============================================================================

proptest! {
    #[test]
    fn reconcile_is_idempotent(
        today in arb_date(),
        payday in arb_payday(),
        lease_end in arb_lease_end(),
        current in arb_status(),
    ) {
        let first = reconcile(today, payday, lease_end, current).unwrap();
        let second = reconcile(today, payday, lease_end, first.status).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn terminated_is_absorbing(
        today in arb_date(),
        days in 0u32..400,
        lease_end in arb_lease_end(),
    ) {
        prop_assert_eq!(
            next_status(ContractStatus::Terminated, days, lease_end, today),
            ContractStatus::Terminated
        );
    }

    #[test]
    fn open_contracts_follow_overdue_days(
        today in arb_date(),
        payday in arb_payday(),
        current in prop_oneof![Just(ContractStatus::Active), Just(ContractStatus::Overdue)],
    ) {
        let result = reconcile(today, payday, None, current).unwrap();
        let expected = if result.overdue_days > 0 {
            ContractStatus::Overdue
        } else {
            ContractStatus::Active
        };
        prop_assert_eq!(result.status, expected);
    }

    #[test]
    fn past_lease_end_always_terminates(
        today in arb_date(),
        payday in arb_payday(),
        current in arb_status(),
        gap in 1i64..1000,
    ) {
        let lease_end = Some(today - Duration::days(gap));
        let result = reconcile(today, payday, lease_end, current).unwrap();
        prop_assert_eq!(result.status, ContractStatus::Terminated);
    }
}

// =============================================================================
// Validation
// =============================================================================

proptest! {
    #[test]
    fn paydays_outside_range_are_rejected(
        today in arb_date(),
        payday in prop_oneof![i32::MIN..1i32, 32i32..i32::MAX],
    ) {
        prop_assert_eq!(next_due_date(today, payday), Err(OverdueError::InvalidPayday(payday)));
        prop_assert_eq!(overdue_days(today, payday), Err(OverdueError::InvalidPayday(payday)));
        prop_assert!(reconcile(today, payday, None, ContractStatus::Active).is_err());
    }
}
