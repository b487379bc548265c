//! Borrow limits, loan periods and fines by role.
//!
//! Everything here is pure. Overdue-ness is never stored; it is derived from
//! the due date with [`is_overdue`] wherever it is needed.

use chrono::{DateTime, Duration, Utc};

use crate::types::Role;

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Maximum number of concurrent open loans.
pub fn borrow_limit(role: Role) -> i64 {
	match role {
		Role::Student => 3,
		Role::Faculty => 5,
		Role::Librarian => 0,
	}
}

pub fn loan_period_days(role: Role) -> i64 {
	match role {
		Role::Faculty => 30,
		Role::Student | Role::Librarian => 14,
	}
}

/// Fine per overdue day, in whole currency units.
pub fn daily_rate(role: Role) -> i64 {
	match role {
		Role::Faculty => 5,
		Role::Student | Role::Librarian => 2,
	}
}

pub fn is_eligible(role: Role, open_loans: i64) -> bool {
	open_loans < borrow_limit(role)
}

pub fn due_date(role: Role, issued_at: DateTime<Utc>) -> DateTime<Utc> {
	issued_at + Duration::days(loan_period_days(role))
}

pub fn is_overdue(due: DateTime<Utc>, as_of: DateTime<Utc>) -> bool {
	as_of > due
}

/// Started days past `due`, rounded up. Zero when not overdue.
pub fn overdue_days(due: DateTime<Utc>, as_of: DateTime<Utc>) -> i64 {
	let late_ms = (as_of - due).num_milliseconds();
	if late_ms <= 0 {
		return 0;
	}
	(late_ms + DAY_MS - 1) / DAY_MS
}

pub fn compute_fine(role: Role, due: DateTime<Utc>, as_of: DateTime<Utc>) -> i64 {
	overdue_days(due, as_of) * daily_rate(role)
}

/// Refusal text shown when the borrow limit is reached.
pub fn limit_message(role: Role) -> String {
	format!(
		"Borrow limit reached! {role}s can issue only {} books.",
		borrow_limit(role)
	)
}
