//! Time-to-live arguments

use std::time::Duration;

use chrono::{DateTime, Months, TimeDelta, Utc};

use crate::domain::CacheError;

use super::clock::Clock;
use super::value::CacheValue;

/// A time-to-live as accepted by `set` and `set_multiple`.
///
/// Zero and negative values are legal and mean "already expired".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Relative number of seconds
    Seconds(i64),
    /// Fixed-length interval
    Interval(TimeDelta),
    /// Calendar interval; month lengths are resolved against the clock
    Calendar { months: u32, delta: TimeDelta },
}

impl Ttl {
    /// Resolves to whole seconds relative to the clock's current time
    pub fn to_seconds(&self, clock: &dyn Clock) -> i64 {
        match self {
            Self::Seconds(seconds) => *seconds,
            Self::Interval(delta) => delta.num_seconds(),
            Self::Calendar { months, delta } => {
                let now = clock.now();
                let target = now
                    .checked_add_months(Months::new(*months))
                    .and_then(|t| t.checked_add_signed(*delta))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                (target - now).num_seconds()
            }
        }
    }

    /// Validates a dynamically typed ttl argument
    pub fn from_value(value: &CacheValue) -> Result<Option<Self>, CacheError> {
        match value {
            CacheValue::Null => Ok(None),
            CacheValue::Int(seconds) => Ok(Some(Self::Seconds(*seconds))),
            other => Err(CacheError::invalid_argument(format!(
                "Expiration date must be an integer, a duration or null, \"{}\" given",
                other.type_name()
            ))),
        }
    }
}

/// Normalizes an optional ttl to optional whole seconds
pub fn normalize_ttl(ttl: Option<Ttl>, clock: &dyn Clock) -> Option<i64> {
    ttl.map(|ttl| ttl.to_seconds(clock))
}

impl From<i64> for Ttl {
    fn from(seconds: i64) -> Self {
        Self::Seconds(seconds)
    }
}

impl From<TimeDelta> for Ttl {
    fn from(delta: TimeDelta) -> Self {
        Self::Interval(delta)
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Self::Seconds(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::clock::ManualClock;

    // 2024-01-15T00:00:00Z
    const JAN_15_2024: i64 = 1_705_276_800;

    #[test]
    fn test_seconds_and_intervals() {
        let clock = ManualClock::new(JAN_15_2024);

        assert_eq!(Ttl::Seconds(30).to_seconds(&clock), 30);
        assert_eq!(Ttl::Seconds(-1).to_seconds(&clock), -1);
        assert_eq!(Ttl::from(TimeDelta::minutes(2)).to_seconds(&clock), 120);
        assert_eq!(Ttl::from(Duration::from_secs(90)).to_seconds(&clock), 90);
    }

    #[test]
    fn test_calendar_interval_uses_clock() {
        let clock = ManualClock::new(JAN_15_2024);
        let one_month = Ttl::Calendar {
            months: 1,
            delta: TimeDelta::zero(),
        };

        // January has 31 days
        assert_eq!(one_month.to_seconds(&clock), 31 * 86_400);

        // 2024-02-15: February 2024 has 29 days
        clock.set(JAN_15_2024 + 31 * 86_400);
        assert_eq!(one_month.to_seconds(&clock), 29 * 86_400);
    }

    #[test]
    fn test_normalize() {
        let clock = ManualClock::new(0);
        assert_eq!(normalize_ttl(None, &clock), None);
        assert_eq!(normalize_ttl(Some(Ttl::Seconds(0)), &clock), Some(0));
    }

    #[test]
    fn test_from_value() {
        assert_eq!(Ttl::from_value(&CacheValue::Null).unwrap(), None);
        assert_eq!(
            Ttl::from_value(&CacheValue::Int(5)).unwrap(),
            Some(Ttl::Seconds(5))
        );

        for invalid in [
            CacheValue::from("1"),
            CacheValue::Float(1.5),
            CacheValue::Bool(true),
            CacheValue::List(vec![]),
        ] {
            let err = Ttl::from_value(&invalid).unwrap_err();
            assert!(err.is_invalid_argument());
        }
    }
}
