// overdue.rs
// Rent due-date and overdue-status engine. Every function here is a pure
// projection of its arguments; "today" is always passed in, never read.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::models::ContractStatus;

pub const MIN_PAYDAY: i32 = 1;
pub const MAX_PAYDAY: i32 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OverdueError {
    #[error("invalid payday {0}: must be between 1 and 31")]
    InvalidPayday(i32),
    #[error("due date for {year}-{month:02} is outside the supported calendar")]
    DateOutOfRange { year: i32, month: u32 },
}

/// Rejects paydays outside 1..=31.
pub fn validate_payday(payday: i32) -> Result<u32, OverdueError> {
    if (MIN_PAYDAY..=MAX_PAYDAY).contains(&payday) {
        Ok(payday as u32)
    } else {
        Err(OverdueError::InvalidPayday(payday))
    }
}

/// Gregorian month length. `None` for a month outside 1..=12.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 if leap => Some(29),
        2 => Some(28),
        _ => None,
    }
}

/// Due date inside the given month: `min(payday, last day of month)`.
fn clamped_due_date(year: i32, month: u32, payday: u32) -> Result<NaiveDate, OverdueError> {
    days_in_month(year, month)
        .and_then(|last| NaiveDate::from_ymd_opt(year, month, payday.min(last)))
        .ok_or(OverdueError::DateOutOfRange { year, month })
}

/// This month's due date, clamped (payday 31 in February lands on the 28th/29th).
pub fn due_date_this_month(today: NaiveDate, payday: i32) -> Result<NaiveDate, OverdueError> {
    let payday = validate_payday(payday)?;
    clamped_due_date(today.year(), today.month(), payday)
}

/// Next date rent is due on or after `today`.
pub fn next_due_date(today: NaiveDate, payday: i32) -> Result<NaiveDate, OverdueError> {
    let payday = validate_payday(payday)?;
    let this_month = clamped_due_date(today.year(), today.month(), payday)?;
    if today <= this_month {
        return Ok(this_month);
    }

    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    clamped_due_date(year, month, payday)
}

/// Whole days elapsed since this month's due date; 0 on or before it.
pub fn overdue_days(today: NaiveDate, payday: i32) -> Result<u32, OverdueError> {
    let due = due_date_this_month(today, payday)?;
    Ok(days_since(due, today))
}

fn days_since(due: NaiveDate, today: NaiveDate) -> u32 {
    if today <= due {
        return 0;
    }
    u32::try_from((today - due).num_days()).unwrap_or(0)
}

/// Status rule over (current status, overdue days) alone.
pub fn status_after_overdue(current: ContractStatus, overdue_days: u32) -> ContractStatus {
    match (current, overdue_days) {
        (ContractStatus::Terminated, _) => ContractStatus::Terminated,
        (_, 0) => ContractStatus::Active,
        (_, _) => ContractStatus::Overdue,
    }
}

/// A lease is expired once its end date is strictly in the past.
pub fn lease_expired(lease_end: Option<NaiveDate>, today: NaiveDate) -> bool {
    lease_end.is_some_and(|end| end < today)
}

/// Expiry pass for a single contract, independent of payday.
pub fn status_after_expiry(
    current: ContractStatus,
    lease_end: Option<NaiveDate>,
    today: NaiveDate,
) -> ContractStatus {
    if lease_expired(lease_end, today) {
        ContractStatus::Terminated
    } else {
        current
    }
}

/// Full status rule: terminated stays terminated, expiry wins over the
/// overdue computation, and otherwise `status_after_overdue` applies.
pub fn next_status(
    current: ContractStatus,
    overdue_days: u32,
    lease_end: Option<NaiveDate>,
    today: NaiveDate,
) -> ContractStatus {
    match status_after_expiry(current, lease_end, today) {
        ContractStatus::Terminated => ContractStatus::Terminated,
        current => status_after_overdue(current, overdue_days),
    }
}

/// Derived fields for one contract as of `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub next_due_date: NaiveDate,
    pub due_this_month: NaiveDate,
    pub overdue_days: u32,
    pub status: ContractStatus,
}

pub fn reconcile(
    today: NaiveDate,
    payday: i32,
    lease_end: Option<NaiveDate>,
    current: ContractStatus,
) -> Result<Reconciliation, OverdueError> {
    let due_this_month = due_date_this_month(today, payday)?;
    let overdue_days = days_since(due_this_month, today);
    Ok(Reconciliation {
        next_due_date: next_due_date(today, payday)?,
        due_this_month,
        overdue_days,
        status: next_status(current, overdue_days, lease_end, today),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn before_payday_due_this_month() {
        let today = date(2025, 3, 10);
        assert_eq!(next_due_date(today, 25).unwrap(), date(2025, 3, 25));
        assert_eq!(overdue_days(today, 25).unwrap(), 0);
    }

    #[test]
    fn on_payday_is_not_overdue() {
        let today = date(2025, 3, 25);
        assert_eq!(next_due_date(today, 25).unwrap(), today);
        assert_eq!(overdue_days(today, 25).unwrap(), 0);
    }

    #[test]
    fn after_payday_rolls_to_next_month() {
        let today = date(2025, 3, 30);
        assert_eq!(next_due_date(today, 25).unwrap(), date(2025, 4, 25));
        assert_eq!(due_date_this_month(today, 25).unwrap(), date(2025, 3, 25));
        assert_eq!(overdue_days(today, 25).unwrap(), 5);
    }

    #[test]
    fn payday_31_clamps_in_february() {
        assert_eq!(
            due_date_this_month(date(2025, 2, 3), 31).unwrap(),
            date(2025, 2, 28)
        );
        assert_eq!(
            due_date_this_month(date(2024, 2, 3), 31).unwrap(),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn rollover_clamps_next_month() {
        // 2025 is not a leap year.
        assert_eq!(next_due_date(date(2025, 2, 1), 31).unwrap(), date(2025, 2, 28));
        assert_eq!(next_due_date(date(2025, 1, 31), 31).unwrap(), date(2025, 1, 31));
        assert_eq!(next_due_date(date(2025, 3, 31), 30).unwrap(), date(2025, 4, 30));
        assert_eq!(next_due_date(date(2025, 1, 30), 29).unwrap(), date(2025, 2, 28));
    }

    #[test]
    fn december_rolls_into_next_year() {
        assert_eq!(next_due_date(date(2025, 12, 20), 5).unwrap(), date(2026, 1, 5));
        assert_eq!(overdue_days(date(2025, 12, 20), 5).unwrap(), 15);
    }

    #[test]
    fn overdue_counts_from_clamped_due_date() {
        // Due on Feb 28 for payday 31; Mar 1 is not in February anymore.
        assert_eq!(overdue_days(date(2025, 2, 28), 31).unwrap(), 0);
        assert_eq!(overdue_days(date(2025, 3, 1), 31).unwrap(), 0);
        assert_eq!(overdue_days(date(2025, 3, 31), 1).unwrap(), 30);
    }

    #[test]
    fn invalid_payday_is_rejected() {
        let today = date(2025, 3, 10);
        for payday in [0, 32, -1, 100] {
            assert_eq!(
                next_due_date(today, payday),
                Err(OverdueError::InvalidPayday(payday))
            );
            assert_eq!(
                overdue_days(today, payday),
                Err(OverdueError::InvalidPayday(payday))
            );
            assert!(reconcile(today, payday, None, ContractStatus::Active).is_err());
        }
    }

    #[test]
    fn rollover_past_the_last_representable_month_is_an_error() {
        let last = NaiveDate::MAX;
        assert_eq!(last.month(), 12);
        assert_eq!(next_due_date(last, 31).unwrap(), last);
        assert_eq!(
            next_due_date(last, 1),
            Err(OverdueError::DateOutOfRange {
                year: last.year() + 1,
                month: 1
            })
        );
        assert!(reconcile(last, 1, None, ContractStatus::Active).is_err());
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2025, 2), Some(28));
        assert_eq!(days_in_month(1900, 2), Some(28));
        assert_eq!(days_in_month(2000, 2), Some(29));
        assert_eq!(days_in_month(2025, 4), Some(30));
        assert_eq!(days_in_month(2025, 13), None);
    }

    #[test]
    fn status_table() {
        use ContractStatus::*;
        assert_eq!(status_after_overdue(Terminated, 0), Terminated);
        assert_eq!(status_after_overdue(Terminated, 12), Terminated);
        assert_eq!(status_after_overdue(Overdue, 0), Active);
        assert_eq!(status_after_overdue(Overdue, 3), Overdue);
        assert_eq!(status_after_overdue(Active, 3), Overdue);
        assert_eq!(status_after_overdue(Active, 0), Active);
    }

    #[test]
    fn expiry_is_strictly_before_today() {
        let today = date(2025, 2, 1);
        assert!(lease_expired(Some(date(2025, 1, 31)), today));
        assert!(!lease_expired(Some(today), today));
        assert!(!lease_expired(None, today));
    }

    #[test]
    fn expiry_takes_precedence_and_stays_terminated() {
        let today = date(2025, 2, 1);
        let lease_end = Some(date(2025, 1, 1));

        let expired = status_after_expiry(ContractStatus::Active, lease_end, today);
        assert_eq!(expired, ContractStatus::Terminated);

        let later = reconcile(date(2025, 2, 20), 5, None, expired).unwrap();
        assert_eq!(later.overdue_days, 15);
        assert_eq!(later.status, ContractStatus::Terminated);

        assert_eq!(
            next_status(ContractStatus::Overdue, 0, lease_end, today),
            ContractStatus::Terminated
        );
    }

    #[test]
    fn reconcile_overdue_contract_back_to_active() {
        let result = reconcile(date(2025, 3, 10), 25, None, ContractStatus::Overdue).unwrap();
        assert_eq!(
            result,
            Reconciliation {
                next_due_date: date(2025, 3, 25),
                due_this_month: date(2025, 3, 25),
                overdue_days: 0,
                status: ContractStatus::Active,
            }
        );
    }
}
