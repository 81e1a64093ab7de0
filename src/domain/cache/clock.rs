//! Time sources for expiration
//!
//! Production code injects [`SystemClock`]. Tests inject a [`ManualClock`] and
//! advance it explicitly instead of sleeping.

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

/// Source of the current time
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current Unix timestamp in whole seconds
    fn timestamp(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same underlying time, so a clock handed to a backend and
/// the one kept by a test advance together.
#[derive(Debug, Clone)]
pub struct ManualClock {
    seconds: Arc<AtomicI64>,
}

impl ManualClock {
    /// Creates a clock frozen at the given Unix timestamp
    pub fn new(timestamp: i64) -> Self {
        Self {
            seconds: Arc::new(AtomicI64::new(timestamp)),
        }
    }

    /// Creates a clock frozen at the current wall-clock second
    pub fn from_system_time() -> Self {
        Self::new(Utc::now().timestamp())
    }

    /// Moves time forward (or backward, for negative values)
    pub fn advance(&self, seconds: i64) {
        self.seconds.fetch_add(seconds, Ordering::SeqCst);
    }

    pub fn set(&self, timestamp: i64) {
        self.seconds.store(timestamp, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::from_system_time()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let seconds = self.seconds.load(Ordering::SeqCst);
        Utc.timestamp_opt(seconds, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn timestamp(&self) -> i64 {
        self.seconds.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn timestamp(&self) -> i64 {
        (**self).timestamp()
    }
}
