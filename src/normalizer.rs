//! Session normalization
//!
//! This module resolves every supported timestamp representation into one
//! canonical instant before any calendar logic runs.
//! - ISO-8601 text (with or without offset), epoch seconds, `{seconds, nanoseconds}`
//! - Durations sanitized to finite, non-negative seconds
//! - Unresolvable records reported, never fatal

use crate::calendar::Calendar;
use crate::types::{
    ExcludedRecord, ExclusionReason, NormalizedSession, RawTimestamp, SessionRecord,
    TimestampWrapper,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Offset-carrying text formats beyond RFC 3339 (Postgres text output)
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

/// Offset-less formats, interpreted in the calendar's zone
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Result of normalizing a list of records
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationReport<'a> {
    /// Records with a canonical instant, in input order
    pub sessions: Vec<NormalizedSession<'a>>,
    /// Records left out, in input order
    pub excluded: Vec<ExcludedRecord>,
}

/// Normalizer for converting raw session records into normalized sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionNormalizer {
    calendar: Calendar,
}

impl SessionNormalizer {
    pub fn new(calendar: Calendar) -> Self {
        Self { calendar }
    }

    /// Normalize records, keeping input order
    pub fn normalize<'a>(&self, records: &'a [SessionRecord]) -> NormalizationReport<'a> {
        let mut sessions = Vec::with_capacity(records.len());
        let mut excluded = Vec::new();

        for (index, record) in records.iter().enumerate() {
            let resolved = match &record.created_at {
                Some(raw) => normalize_timestamp(raw, &self.calendar),
                None => Err(ExclusionReason::MissingTimestamp),
            };

            match resolved {
                Ok(created_at) => sessions.push(NormalizedSession {
                    index,
                    record,
                    created_at,
                    duration_seconds: sanitize_duration(record.duration_seconds),
                }),
                Err(reason) => {
                    tracing::debug!(
                        index,
                        record_id = %record.id,
                        reason = %reason,
                        "Excluding session record"
                    );
                    excluded.push(ExcludedRecord {
                        index,
                        id: record.id.clone(),
                        reason,
                    });
                }
            }
        }

        NormalizationReport { sessions, excluded }
    }
}

/// Resolve a raw timestamp to a UTC instant
pub fn normalize_timestamp(
    raw: &RawTimestamp,
    calendar: &Calendar,
) -> Result<DateTime<Utc>, ExclusionReason> {
    match raw {
        RawTimestamp::Iso(text) => parse_iso(text, calendar),
        RawTimestamp::EpochSeconds(seconds) => from_epoch_seconds(*seconds),
        RawTimestamp::Wrapper(wrapper) => from_wrapper(wrapper),
        RawTimestamp::Unrecognized(_) => Err(ExclusionReason::MalformedTimestamp),
    }
}

/// Negative, NaN, infinite or missing durations count as zero
pub fn sanitize_duration(seconds: Option<f64>) -> f64 {
    match seconds {
        Some(s) if s.is_finite() && s > 0.0 => s,
        _ => 0.0,
    }
}

fn parse_iso(text: &str, calendar: &Calendar) -> Result<DateTime<Utc>, ExclusionReason> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ExclusionReason::MalformedTimestamp);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return calendar
                .resolve_local(naive)
                .ok_or(ExclusionReason::OutOfRange);
        }
    }

    // Bare dates are local midnight
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return calendar
            .resolve_local(date.and_time(NaiveTime::default()))
            .ok_or(ExclusionReason::OutOfRange);
    }

    Err(ExclusionReason::MalformedTimestamp)
}

fn from_epoch_seconds(seconds: f64) -> Result<DateTime<Utc>, ExclusionReason> {
    if !seconds.is_finite() {
        return Err(ExclusionReason::MalformedTimestamp);
    }

    let whole = seconds.floor();
    // i64 range check before the cast, chrono rejects anything beyond its own range
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return Err(ExclusionReason::OutOfRange);
    }
    let nanos = ((seconds - whole) * NANOS_PER_SECOND as f64).round() as i64;
    let (secs, nanos) = if nanos >= NANOS_PER_SECOND {
        ((whole as i64).saturating_add(1), 0)
    } else {
        (whole as i64, nanos)
    };

    DateTime::from_timestamp(secs, nanos as u32).ok_or(ExclusionReason::OutOfRange)
}

fn from_wrapper(wrapper: &TimestampWrapper) -> Result<DateTime<Utc>, ExclusionReason> {
    if !(0..NANOS_PER_SECOND).contains(&wrapper.nanoseconds) {
        return Err(ExclusionReason::MalformedTimestamp);
    }
    DateTime::from_timestamp(wrapper.seconds, wrapper.nanoseconds as u32)
        .ok_or(ExclusionReason::OutOfRange)
}
