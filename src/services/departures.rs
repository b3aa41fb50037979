//! Turns the loosely-structured departure monitor response into canonical
//! departure records.
//!
//! The EFA service string-encodes numbers without zero-padding and leaves
//! optional fields out entirely, so every lookup here goes through a typed
//! extraction step instead of trusting the shape of the payload.

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;

use crate::providers::efa::{DepartureMonitorResponse, EfaDateTime, RawDeparture};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("response has no stop metadata (dm.points.point.name)")]
    MissingStopName,
    #[error("departure entry {index}: missing field `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("departure entry {index}: invalid value `{value}` for `{field}`")]
    InvalidField {
        index: usize,
        field: &'static str,
        value: String,
    },
    #[error("departure entry {index}: components do not form a valid date-time")]
    InvalidDateTime { index: usize },
}

/// Display category derived from the countdown value
///
/// Countdowns of exactly 60 or of 120 and above land in no bucket and the
/// entry is dropped from the output. That dead zone matches the behavior of
/// the service's long-standing consumers and is kept deliberately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Departing now (countdown <= 0)
    Immediate,
    /// Departing within the hour (0 < countdown < 60)
    Soon,
    /// Departing within two hours (60 < countdown < 120)
    Later,
}

impl Bucket {
    /// Classify a countdown (minutes until departure) into a display bucket
    pub fn classify(countdown: i64) -> Option<Self> {
        match countdown {
            c if c <= 0 => Some(Bucket::Immediate),
            1..=59 => Some(Bucket::Soon),
            61..=119 => Some(Bucket::Later),
            _ => None,
        }
    }
}

/// A single normalized departure, ready for rendering
#[derive(Debug, Clone)]
pub struct DepartureRecord {
    pub line: String,
    pub destination: String,
    /// Platform name, empty when the service reports none
    pub platform: String,
    /// Real-time adjusted departure when available, scheduled otherwise
    pub departure: DateTime<Tz>,
    /// Delay in minutes exactly as reported; `None` when the service sent no
    /// delay field (displayed as 0)
    pub delay: Option<String>,
    /// Minutes until departure
    pub countdown: i64,
    pub bucket: Bucket,
}

/// Normalized departures for one stop, in the order the service sent them
#[derive(Debug, Clone)]
pub struct StopDepartures {
    pub stop_name: String,
    pub departures: Vec<DepartureRecord>,
}

/// Normalize a raw departure monitor response
///
/// Entries are processed in received order and never re-sorted. A missing or
/// malformed field fails the whole batch: the caller gets either a complete
/// table or none at all.
pub fn normalize(raw: &DepartureMonitorResponse, tz: Tz) -> Result<StopDepartures, SchemaError> {
    let stop_name = raw
        .dm
        .as_ref()
        .and_then(|dm| dm.points.as_ref())
        .and_then(|points| points.point.as_ref())
        .and_then(|point| point.name.clone())
        .ok_or(SchemaError::MissingStopName)?;

    let mut departures = Vec::new();
    for (index, entry) in raw.departure_list.iter().enumerate() {
        if let Some(record) = normalize_entry(entry, index, tz)? {
            departures.push(record);
        }
    }

    tracing::debug!(
        stop_name = %stop_name,
        received = raw.departure_list.len(),
        kept = departures.len(),
        "Normalized departures"
    );

    Ok(StopDepartures {
        stop_name,
        departures,
    })
}

/// Normalize one departure entry; `Ok(None)` means the entry falls into the
/// countdown dead zone and is dropped
fn normalize_entry(
    entry: &RawDeparture,
    index: usize,
    tz: Tz,
) -> Result<Option<DepartureRecord>, SchemaError> {
    let serving_line = entry
        .serving_line
        .as_ref()
        .ok_or(SchemaError::MissingField {
            index,
            field: "servingLine",
        })?;
    let line = serving_line
        .number
        .clone()
        .ok_or(SchemaError::MissingField {
            index,
            field: "servingLine.number",
        })?;
    let destination = serving_line
        .direction
        .clone()
        .ok_or(SchemaError::MissingField {
            index,
            field: "servingLine.direction",
        })?;

    // realDateTime carries the delay-adjusted time, dateTime the schedule
    let date_time = entry
        .real_date_time
        .as_ref()
        .or(entry.date_time.as_ref())
        .ok_or(SchemaError::MissingField {
            index,
            field: "dateTime",
        })?;
    let departure = build_date_time(date_time, index, tz)?;

    let platform = entry.platform_name.clone().unwrap_or_default();

    let countdown_raw = entry.countdown.as_deref().ok_or(SchemaError::MissingField {
        index,
        field: "countdown",
    })?;
    let countdown = parse_component(&zero_pad(countdown_raw), index, "countdown")?;

    Ok(Bucket::classify(countdown).map(|bucket| DepartureRecord {
        line,
        destination,
        platform,
        departure,
        delay: serving_line.delay.clone(),
        countdown,
        bucket,
    }))
}

/// Combine the string-encoded components into a timezone-aware date-time
///
/// Hour, minute, day and month are zero-padded to two digits before parsing;
/// the year is used as-is.
fn build_date_time(dt: &EfaDateTime, index: usize, tz: Tz) -> Result<DateTime<Tz>, SchemaError> {
    let missing = |field| SchemaError::MissingField { index, field };

    let year = dt.year.as_deref().ok_or_else(|| missing("dateTime.year"))?;
    let month = dt
        .month
        .as_deref()
        .ok_or_else(|| missing("dateTime.month"))?;
    let day = dt.day.as_deref().ok_or_else(|| missing("dateTime.day"))?;
    let hour = dt.hour.as_deref().ok_or_else(|| missing("dateTime.hour"))?;
    let minute = dt
        .minute
        .as_deref()
        .ok_or_else(|| missing("dateTime.minute"))?;

    let year: i32 = year
        .parse()
        .map_err(|_| SchemaError::InvalidField {
            index,
            field: "dateTime.year",
            value: year.to_string(),
        })?;
    let month = parse_component(&zero_pad(month), index, "dateTime.month")? as u32;
    let day = parse_component(&zero_pad(day), index, "dateTime.day")? as u32;
    let hour = parse_component(&zero_pad(hour), index, "dateTime.hour")? as u32;
    let minute = parse_component(&zero_pad(minute), index, "dateTime.minute")? as u32;

    tz.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .earliest()
        .ok_or(SchemaError::InvalidDateTime { index })
}

fn parse_component(value: &str, index: usize, field: &'static str) -> Result<i64, SchemaError> {
    value.parse().map_err(|_| SchemaError::InvalidField {
        index,
        field,
        value: value.to_string(),
    })
}

/// Zero-pad a numeric string to at least two characters
///
/// Cosmetic only: the numeric value is unchanged and inputs that are already
/// two or more characters long pass through untouched.
pub fn zero_pad(s: &str) -> String {
    if s.len() < 2 {
        format!("0{}", s)
    } else {
        s.to_string()
    }
}
