//! Resampling frequency strings
//!
//! A frequency is a fixed-width duration written as one or more
//! `<count><unit>` components, e.g. `15min`, `15 minutes`, `1 hour`,
//! `1h30min`. A missing count means 1 (`H` is one hour). Calendar units
//! (months, years) have no fixed width and are rejected, as is a bare `m`
//! which could mean either minutes or months.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

const MICROS_PER_MILLI: i64 = 1_000;
const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;
const MICROS_PER_DAY: i64 = 24 * MICROS_PER_HOUR;
const MICROS_PER_WEEK: i64 = 7 * MICROS_PER_DAY;

/// Display units, largest first
const DISPLAY_UNITS: &[(i64, &str)] = &[
    (MICROS_PER_WEEK, "w"),
    (MICROS_PER_DAY, "d"),
    (MICROS_PER_HOUR, "h"),
    (MICROS_PER_MINUTE, "min"),
    (MICROS_PER_SECOND, "s"),
    (MICROS_PER_MILLI, "ms"),
];

/// Fixed bucket width used by the resampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Frequency {
    micros: i64,
}

impl Frequency {
    /// Bucket width in microseconds (always > 0)
    pub fn as_micros(&self) -> i64 {
        self.micros
    }
}

impl Default for Frequency {
    /// 15 minutes, the query endpoint default
    fn default() -> Self {
        Self {
            micros: 15 * MICROS_PER_MINUTE,
        }
    }
}

fn unit_micros(unit: &str) -> Option<i64> {
    let micros = match unit.to_ascii_lowercase().as_str() {
        "ms" | "l" | "milli" | "millis" | "millisecond" | "milliseconds" => MICROS_PER_MILLI,
        "s" | "sec" | "secs" | "second" | "seconds" => MICROS_PER_SECOND,
        "t" | "min" | "mins" | "minute" | "minutes" => MICROS_PER_MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => MICROS_PER_HOUR,
        "d" | "day" | "days" => MICROS_PER_DAY,
        "w" | "week" | "weeks" => MICROS_PER_WEEK,
        _ => return None,
    };
    Some(micros)
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let invalid = || Error::InvalidFrequency(raw.to_string());
        let chars: Vec<char> = raw.chars().collect();
        let mut pos = 0;
        let mut total: i64 = 0;
        let mut components = 0;

        loop {
            while pos < chars.len() && chars[pos].is_whitespace() {
                pos += 1;
            }
            if pos == chars.len() {
                break;
            }

            let digits_start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            let count: i64 = if pos == digits_start {
                1
            } else {
                chars[digits_start..pos]
                    .iter()
                    .collect::<String>()
                    .parse()
                    .map_err(|_| invalid())?
            };

            while pos < chars.len() && chars[pos].is_whitespace() {
                pos += 1;
            }

            let unit_start = pos;
            while pos < chars.len() && chars[pos].is_ascii_alphabetic() {
                pos += 1;
            }
            if pos == unit_start {
                return Err(invalid());
            }
            let unit: String = chars[unit_start..pos].iter().collect();
            let per_unit = unit_micros(&unit).ok_or_else(invalid)?;

            total = count
                .checked_mul(per_unit)
                .and_then(|micros| total.checked_add(micros))
                .ok_or_else(invalid)?;
            components += 1;
        }

        if components == 0 || total <= 0 {
            return Err(invalid());
        }

        Ok(Self { micros: total })
    }
}

impl fmt::Display for Frequency {
    /// Canonical form, largest units first: `15min`, `1h30min`, `1d`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut remaining = self.micros;
        for (per_unit, suffix) in DISPLAY_UNITS {
            let count = remaining / per_unit;
            if count > 0 {
                write!(f, "{}{}", count, suffix)?;
                remaining -= count * per_unit;
            }
        }
        // Widths are built from whole milliseconds, so nothing is left over
        // unless constructed some other way.
        if remaining > 0 {
            write!(f, "{}us", remaining)?;
        }
        Ok(())
    }
}
