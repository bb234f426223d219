//! `HH:MM` rendering and parsing for clock times and durations.
//!
//! Day records carry local wall-clock times without a timezone, and every
//! duration shown to a user is rendered as `HH:MM` with an unbounded hour
//! field (`73:15` is a valid weekly total).

use chrono::{Duration, NaiveTime, Timelike};

const CLOCK_FORMAT: &str = "%H:%M";

/// Formats a duration as `HH:MM`, truncating seconds.
pub fn format_hhmm(duration: Duration) -> String {
    format_minutes(duration.num_minutes())
}

/// Formats a signed minute count as `HH:MM`, prefixing `-` when negative.
pub fn format_minutes(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let minutes = minutes.unsigned_abs();
    format!("{sign}{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Formats a time of day as `HH:MM`.
pub fn format_clock(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Parses a time of day written as `HH:MM`.
pub fn parse_clock(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), CLOCK_FORMAT).ok()
}

/// Parses an `HH:MM` duration such as an interstice.
///
/// Exactly two non-negative integer fields are accepted; the hour field is
/// not capped at 24. Anything else, including a value too large for a
/// [`Duration`], yields `None`.
pub fn parse_hhmm_duration(text: &str) -> Option<Duration> {
    let mut parts = text.trim().split(':');
    let hours: i64 = parts.next()?.trim().parse().ok()?;
    let minutes: i64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || hours < 0 || minutes < 0 {
        return None;
    }
    Duration::try_hours(hours)?.checked_add(&Duration::try_minutes(minutes)?)
}

/// Serde adapter for a [`NaiveTime`] written as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_clock(*time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_clock(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid HH:MM time: {s:?}")))
    }
}

/// Serializes a [`Duration`](chrono::Duration) as `HH:MM`.
pub mod duration_hhmm {
    use chrono::Duration;
    use serde::Serializer;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_hhmm(*duration))
    }
}

/// Serde adapter for an optional `HH:MM` time. Blank strings read as `None`.
pub mod hhmm_option {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    #[expect(
        clippy::ref_option,
        reason = "serde's serialize_with passes a reference to the field"
    )]
    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_some(&super::format_clock(*t)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => super::parse_clock(text)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid HH:MM time: {text:?}"))),
        }
    }
}
