use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

// Traits cannot have async and we need sized structs for Clone + Send + Sync
#[derive(Clone)]
#[non_exhaustive]
pub enum SizedClock {
	System(SystemClock),
	Fake(FakeClock),
}

impl Default for SizedClock {
	fn default() -> Self {
		Self::System(SystemClock)
	}
}

impl SizedClock {
	/// The current wall-clock second, as substituted for the `*` bound
	pub async fn now(&self) -> i64 {
		match self {
			SizedClock::System(c) => c.now(),
			SizedClock::Fake(c) => c.now().await,
		}
	}
}

/// The real wall clock
#[derive(Clone, Copy)]
#[non_exhaustive]
pub struct SystemClock;

impl SystemClock {
	pub fn now(&self) -> i64 {
		match SystemTime::now().duration_since(UNIX_EPOCH) {
			Ok(d) => d.as_secs() as i64,
			// The clock is before the epoch
			Err(e) => -(e.duration().as_secs() as i64),
		}
	}
}

/// FakeClock is a clock that is fully controlled externally.
/// Use this clock for when you are testing timestamps.
#[non_exhaustive]
pub struct FakeClock {
	now: AtomicI64,
}

impl Clone for FakeClock {
	fn clone(&self) -> Self {
		FakeClock {
			now: AtomicI64::new(self.now.load(Ordering::SeqCst)),
		}
	}
}

impl FakeClock {
	pub fn new(now: i64) -> Self {
		FakeClock {
			now: AtomicI64::new(now),
		}
	}

	pub async fn now(&self) -> i64 {
		self.now.load(Ordering::SeqCst)
	}

	pub async fn set(&self, now: i64) {
		self.now.store(now, Ordering::SeqCst);
	}
}
