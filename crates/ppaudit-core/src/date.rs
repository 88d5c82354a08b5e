//! Fixed-width model date tokens and the segments built from them.
//!
//! Post-processed file names carry dates in one of four widths:
//!
//! ```text
//! YYYY        year
//! YYYYMM      year + month
//! YYYYMMDD    year + month + day
//! YYYYMMDDHH  year + month + day + hour
//! ```
//!
//! Dates are naive calendar values; no timezone is attached.

use crate::error::AuditError;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Years a 4-digit token can carry.
pub const MIN_YEAR: i32 = 0;
pub const MAX_YEAR: i32 = 9999;

/// How many fields a date token carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateResolution {
    Year,
    Month,
    Day,
    Hour,
}

impl DateResolution {
    fn from_width(width: usize) -> Option<Self> {
        match width {
            4 => Some(Self::Year),
            6 => Some(Self::Month),
            8 => Some(Self::Day),
            10 => Some(Self::Hour),
            _ => None,
        }
    }

    pub fn width(self) -> usize {
        match self {
            Self::Year => 4,
            Self::Month => 6,
            Self::Day => 8,
            Self::Hour => 10,
        }
    }
}

/// A decoded date token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModelDate {
    value: NaiveDateTime,
    resolution: DateResolution,
}

impl ModelDate {
    pub fn year(&self) -> i32 {
        self.value.year()
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.value
    }

    pub fn resolution(&self) -> DateResolution {
        self.resolution
    }

    /// Re-encode at the width the token was decoded from.
    pub fn encode(&self) -> String {
        let v = &self.value;
        match self.resolution {
            DateResolution::Year => format!("{:04}", v.year()),
            DateResolution::Month => format!("{:04}{:02}", v.year(), v.month()),
            DateResolution::Day => format!("{:04}{:02}{:02}", v.year(), v.month(), v.day()),
            DateResolution::Hour => format!(
                "{:04}{:02}{:02}{:02}",
                v.year(),
                v.month(),
                v.day(),
                v.hour()
            ),
        }
    }
}

impl fmt::Display for ModelDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Decode a 4/6/8/10-digit date token.
pub fn decode(token: &str) -> Result<ModelDate, AuditError> {
    let unsupported = |reason: &str| AuditError::UnsupportedDateFormat {
        token: token.to_string(),
        reason: reason.to_string(),
    };

    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(unsupported("token must be ASCII digits"));
    }
    let resolution = DateResolution::from_width(token.len())
        .ok_or_else(|| unsupported("length must be 4, 6, 8 or 10"))?;

    // Widths are validated above, so every slice is in range and numeric.
    let field = |range: std::ops::Range<usize>| -> u32 {
        token[range].parse().unwrap_or_default()
    };
    let year = field(0..4) as i32;
    let month = if token.len() >= 6 { field(4..6) } else { 1 };
    let day = if token.len() >= 8 { field(6..8) } else { 1 };
    let hour = if token.len() >= 10 { field(8..10) } else { 0 };

    let value = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .ok_or_else(|| unsupported("field out of calendar range"))?;

    Ok(ModelDate { value, resolution })
}

/// A `startDate-endDate` token as embedded in a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub token: String,
    pub start: ModelDate,
    pub end: ModelDate,
}

fn segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9]+)-([0-9]+)$").expect("segment regex is valid"))
}

impl Segment {
    /// Parse and decode a `startDate-endDate` token.
    pub fn parse(token: &str) -> Result<Self, AuditError> {
        let caps = segment_re()
            .captures(token)
            .ok_or_else(|| AuditError::UnsupportedDateFormat {
                token: token.to_string(),
                reason: "segment must look like `start-end`".to_string(),
            })?;
        Ok(Self {
            token: token.to_string(),
            start: decode(&caps[1])?,
            end: decode(&caps[2])?,
        })
    }

    /// Raw text of the end date, as it appears in file names.
    pub fn end_text(&self) -> &str {
        self.token
            .split_once('-')
            .map(|(_, end)| end)
            .unwrap_or_default()
    }

    pub fn end_year(&self) -> i32 {
        self.end.year()
    }
}
