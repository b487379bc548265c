use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for due dates, fines and notification timestamps.
pub trait Clock: Send + Sync {
	fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// A clock that only moves when told to. Millisecond resolution.
#[derive(Debug)]
pub struct ManualClock {
	millis: AtomicI64,
}

impl ManualClock {
	pub fn new(start: DateTime<Utc>) -> Self {
		ManualClock { millis: AtomicI64::new(start.timestamp_millis()) }
	}

	pub fn set(&self, at: DateTime<Utc>) {
		self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
	}

	pub fn advance(&self, by: Duration) {
		self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> DateTime<Utc> {
		let millis = self.millis.load(Ordering::SeqCst);
		DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::MIN_UTC)
	}
}
