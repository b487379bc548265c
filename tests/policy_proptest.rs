use chrono::{DateTime, Duration, Utc};
use lsys::policy::{self, DAY_MS};
use lsys::Role;
use proptest::prelude::*;

fn role() -> impl Strategy<Value = Role> {
	prop_oneof![Just(Role::Student), Just(Role::Faculty), Just(Role::Librarian)]
}

fn due() -> DateTime<Utc> {
	DateTime::from_timestamp(1_735_689_600, 0).unwrap()
}

proptest! {
	#[test]
	fn no_fine_on_or_before_due(role in role(), early_ms in 0i64..(365 * DAY_MS)) {
		let as_of = due() - Duration::milliseconds(early_ms);
		prop_assert_eq!(policy::compute_fine(role, due(), as_of), 0);
		prop_assert!(!policy::is_overdue(due(), as_of));
	}

	#[test]
	fn fine_is_started_days_times_rate(role in role(), late_ms in 1i64..(365 * DAY_MS)) {
		let as_of = due() + Duration::milliseconds(late_ms);
		let days = (late_ms + DAY_MS - 1) / DAY_MS;
		prop_assert!(policy::is_overdue(due(), as_of));
		prop_assert_eq!(policy::overdue_days(due(), as_of), days);
		prop_assert_eq!(policy::compute_fine(role, due(), as_of), days * policy::daily_rate(role));
	}

	#[test]
	fn fine_never_decreases(role in role(), a in 0i64..(90 * DAY_MS), b in 0i64..(90 * DAY_MS)) {
		let (earlier, later) = if a <= b { (a, b) } else { (b, a) };
		let fine_at = |ms: i64| policy::compute_fine(role, due(), due() + Duration::milliseconds(ms));
		prop_assert!(fine_at(earlier) <= fine_at(later));
	}

	#[test]
	fn eligible_below_the_limit(role in role(), open in 0i64..10) {
		prop_assert_eq!(policy::is_eligible(role, open), open < policy::borrow_limit(role));
	}

	#[test]
	fn due_date_follows_loan_period(role in role(), offset_s in 0i64..(10 * 365 * 86_400)) {
		let issued = due() + Duration::seconds(offset_s);
		let expected = issued + Duration::days(policy::loan_period_days(role));
		prop_assert_eq!(policy::due_date(role, issued), expected);
	}
}
