//! Timestamp sources for `last_migrated`.

use chrono::Utc;

/// Supplies the current Unix time in seconds.
pub trait Clock {
    fn now(&self) -> i64;
}

/// Wall-clock time, rounded to the nearest second.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        round_millis(Utc::now().timestamp_millis())
    }
}

/// A clock that always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> i64 {
        (**self).now()
    }
}

fn round_millis(millis: i64) -> i64 {
    (millis + 500).div_euclid(1000)
}
