//! The time-segment primitive shared by telemetry segments and timeline events.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::InvalidInput;

/// A closed span of local time with `end >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

#[derive(Deserialize)]
struct RawInterval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TryFrom<RawInterval> for Interval {
    type Error = InvalidInput;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl Interval {
    /// Creates an interval, rejecting one that ends before it starts.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, InvalidInput> {
        if end < start {
            return Err(InvalidInput::NegativeInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Builds an interval from bounds already known to be ordered.
    pub(crate) fn from_ordered(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        debug_assert!(start <= end, "interval bounds out of order");
        Self { start, end }
    }

    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Length of the interval. Never negative.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True when `instant` lies inside the closed interval.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// True when both intervals share a span of positive length.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_duration_of_valid_interval() {
        let interval = Interval::new(at(8, 0), at(12, 30)).unwrap();
        assert_eq!(interval.duration(), Duration::minutes(270));
        assert!(!interval.is_empty());
    }

    #[test]
    fn test_zero_length_interval_is_allowed() {
        let interval = Interval::new(at(8, 0), at(8, 0)).unwrap();
        assert!(interval.is_empty());
        assert_eq!(interval.duration(), Duration::zero());
    }

    #[test]
    fn test_negative_interval_is_rejected() {
        let err = Interval::new(at(9, 0), at(8, 0)).unwrap_err();
        assert_eq!(
            err,
            InvalidInput::NegativeInterval {
                start: at(9, 0),
                end: at(8, 0)
            }
        );
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        let a = Interval::new(at(8, 0), at(9, 0)).unwrap();
        let b = Interval::new(at(9, 0), at(10, 0)).unwrap();
        let c = Interval::new(at(8, 30), at(9, 30)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(a.contains(at(9, 0)));
    }

    #[test]
    fn test_deserialize_rejects_negative_interval() {
        let result: Result<Interval, _> =
            serde_json::from_str(r#"{"start":"2025-03-10T09:00:00","end":"2025-03-10T08:00:00"}"#);
        assert!(result.is_err());
    }
}
