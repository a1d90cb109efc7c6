// src/models/changelog.rs

//! Changelog records and headline date parsing.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// The most recent change posted for one mod.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangelogRecord {
    pub date: DateTime<Utc>,
    /// Changelog entry id, compared verbatim against the stored marker
    pub id: String,
    pub description: String,
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

static DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<day>\d{1,2}) (?P<month>[A-Za-z]{3})(?:, (?P<year>\d+))? @ (?P<hour>\d{1,2}):(?P<minute>\d{2})(?P<meridiem>[ap]m)",
    )
    .expect("day-first date pattern")
});

static MONTH_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<month>[A-Za-z]{3}) (?P<day>\d{1,2})(?:, (?P<year>\d+))? @ (?P<hour>\d{1,2}):(?P<minute>\d{2})(?P<meridiem>[ap]m)",
    )
    .expect("month-first date pattern")
});

/// Parse a changelog headline such as `Update: 12 Mar, 2021 @ 3:04pm`.
///
/// Headlines are requested with a zero timezone offset, so the time is UTC.
/// Headlines from the current year omit it; `current_year` fills the gap.
pub fn parse_headline_date(headline: &str, current_year: i32) -> Result<DateTime<Utc>> {
    let caps = DAY_FIRST
        .captures(headline)
        .or_else(|| MONTH_FIRST.captures(headline))
        .ok_or_else(|| AppError::structure(format!("Invalid date string: {}", headline.trim())))?;

    let field = |caps: &Captures, name: &str| -> Result<u32> {
        caps[name]
            .parse()
            .map_err(|_| AppError::structure(format!("Invalid {name} in {}", headline.trim())))
    };

    let month_index = MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(&caps["month"]))
        .ok_or_else(|| AppError::structure(format!("Unknown month {}", &caps["month"])))?;
    let month = month_index as u32 + 1;
    let year = match caps.name("year") {
        Some(y) => y
            .as_str()
            .parse()
            .map_err(|_| AppError::structure(format!("Invalid year {}", y.as_str())))?,
        None => current_year,
    };
    let day = field(&caps, "day")?;
    let minute = field(&caps, "minute")?;
    let hour = field(&caps, "hour")? % 12 + if &caps["meridiem"] == "pm" { 12 } else { 0 };

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::structure(format!("Out of range date: {}", headline.trim())))
}
