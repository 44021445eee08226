//! Wall-clock seam
//!
//! The core never calls `Utc::now()` directly; the embedding service hands
//! the engine a clock, which keeps time-bounded rules (verification expiry,
//! daily quotas) deterministic under test.

use chrono::{DateTime, Utc};

/// Source of the current wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
