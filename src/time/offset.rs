//! Date offsets: parsing `[+-]?digits[dhms]?` and applying the shift

use super::Timestamp;
use crate::error::{Error, Result};
use chrono::{NaiveDateTime, TimeDelta};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

static OFFSET_PATTERN: OnceLock<Regex> = OnceLock::new();

fn offset_pattern() -> &'static Regex {
    OFFSET_PATTERN.get_or_init(|| Regex::new(r"^([+-]?[0-9]+)([dhms])?$").unwrap())
}

/// Unit of a date offset; a bare number is milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetUnit {
    #[default]
    Millis,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl OffsetUnit {
    /// Milliseconds in one unit
    pub fn millis(self) -> i64 {
        match self {
            OffsetUnit::Millis => 1,
            OffsetUnit::Seconds => 1_000,
            OffsetUnit::Minutes => 60 * 1_000,
            OffsetUnit::Hours => 60 * 60 * 1_000,
            OffsetUnit::Days => 24 * 60 * 60 * 1_000,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            OffsetUnit::Millis => "",
            OffsetUnit::Seconds => "s",
            OffsetUnit::Minutes => "m",
            OffsetUnit::Hours => "h",
            OffsetUnit::Days => "d",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "d" => Some(OffsetUnit::Days),
            "h" => Some(OffsetUnit::Hours),
            "m" => Some(OffsetUnit::Minutes),
            "s" => Some(OffsetUnit::Seconds),
            _ => None,
        }
    }
}

/// A signed shift applied to every processed file's capture time
///
/// The amount times the unit always fits in `i64` milliseconds;
/// [`DateOffset::new`] refuses anything larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateOffset {
    amount: i64,
    unit: OffsetUnit,
}

impl DateOffset {
    pub fn new(amount: i64, unit: OffsetUnit) -> Result<Self> {
        amount.checked_mul(unit.millis()).ok_or_else(|| {
            Error::InvalidOffset(format!("{}{} is out of range", amount, unit.suffix()))
        })?;
        Ok(Self { amount, unit })
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn unit(&self) -> OffsetUnit {
        self.unit
    }

    /// Signed size of the shift in milliseconds
    pub fn as_millis(&self) -> i64 {
        self.amount.saturating_mul(self.unit.millis())
    }

    /// Shift `base` by this offset
    ///
    /// Results outside chrono's range saturate at `NaiveDateTime::MIN`/`MAX`.
    pub fn apply(&self, base: Timestamp) -> Timestamp {
        let millis = self.as_millis();
        TimeDelta::try_milliseconds(millis)
            .and_then(|delta| base.checked_add_signed(delta))
            .unwrap_or(if millis < 0 {
                NaiveDateTime::MIN
            } else {
                NaiveDateTime::MAX
            })
    }
}

impl FromStr for DateOffset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = offset_pattern()
            .captures(s)
            .ok_or_else(|| Error::InvalidOffset(s.to_string()))?;

        let amount: i64 = caps[1]
            .parse()
            .map_err(|_| Error::InvalidOffset(format!("{} is out of range", s)))?;

        let unit = match caps.get(2) {
            Some(m) => OffsetUnit::from_suffix(m.as_str())
                .ok_or_else(|| Error::InvalidOffset(s.to_string()))?,
            None => OffsetUnit::Millis,
        };

        Self::new(amount, unit)
    }
}

impl fmt::Display for DateOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            OffsetUnit::Millis => write!(f, "{}", self.amount),
            unit => write!(f, "{:+}{}", self.amount, unit.suffix()),
        }
    }
}

impl serde::Serialize for DateOffset {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for DateOffset {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
