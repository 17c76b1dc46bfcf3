use std::fmt;
use std::str::FromStr;

use chrono::{Local, Offset};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::Identity;

/// Seconds since the UNIX epoch plus the local timezone offset in effect
/// when the timestamp was taken.
///
/// Rendered as `<seconds> <+hhmm>`, e.g. `1234567890 +0900`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Seconds since the UNIX epoch (UTC).
    pub seconds: i64,
    /// Offset east of UTC, in minutes.
    pub offset_minutes: i32,
}

impl Timestamp {
    /// Create a timestamp with explicit values.
    pub const fn new(seconds: i64, offset_minutes: i32) -> Self {
        Self {
            seconds,
            offset_minutes,
        }
    }

    /// The current wall-clock time in the local timezone.
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            seconds: now.timestamp(),
            offset_minutes: now.offset().fix().local_minus_utc() / 60,
        }
    }

    /// Format the offset as `+hhmm` / `-hhmm`.
    pub fn offset_string(&self) -> String {
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let abs = self.offset_minutes.unsigned_abs();
        format!("{sign}{:02}{:02}", abs / 60, abs % 60)
    }

    /// Parse a `+hhmm` / `-hhmm` offset into minutes.
    pub fn parse_offset(s: &str) -> Result<i32, TypeError> {
        let invalid = || TypeError::InvalidTimezone(s.to_string());
        let (sign, digits) = match s.split_at_checked(1) {
            Some(("+", d)) => (1, d),
            Some(("-", d)) => (-1, d),
            _ => return Err(invalid()),
        };
        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
        let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
        if minutes >= 60 {
            return Err(invalid());
        }
        Ok(sign * (hours * 60 + minutes))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({self})")
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.seconds, self.offset_string())
    }
}

impl FromStr for Timestamp {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (secs, tz) = s
            .split_once(' ')
            .ok_or_else(|| TypeError::InvalidTimezone(s.to_string()))?;
        let seconds = secs
            .parse()
            .map_err(|_| TypeError::InvalidTimezone(format!("bad seconds in {s:?}")))?;
        Ok(Self::new(seconds, Self::parse_offset(tz)?))
    }
}

/// An identity stamped with the moment it acted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub identity: Identity,
    pub when: Timestamp,
}

impl Signature {
    pub fn new(identity: Identity, when: Timestamp) -> Self {
        Self { identity, when }
    }

    /// Sign as `identity` at the current local time.
    pub fn now(identity: Identity) -> Self {
        Self::new(identity, Timestamp::now())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.identity, self.when)
    }
}

impl FromStr for Signature {
    type Err = TypeError;

    /// Parse `Name <email> <seconds> <+hhmm>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (identity, when) = s
            .rsplit_once("> ")
            .ok_or_else(|| TypeError::InvalidIdentity(format!("malformed signature {s:?}")))?;
        Ok(Self {
            identity: format!("{identity}>").parse()?,
            when: when.parse()?,
        })
    }
}
