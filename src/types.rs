//! Core types for Session Insights
//!
//! This module defines the data structures that flow through the aggregation:
//! raw session records as delivered by the host app, normalized sessions with a
//! canonical instant, and the derived history, streak and weekly outputs.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Timestamp as delivered by a storage backend.
///
/// Document stores hand back `{seconds, nanoseconds}` wrappers, relational
/// stores ISO-8601 text, and some clients plain epoch seconds. Anything else is
/// kept as [`RawTimestamp::Unrecognized`] so that one bad record never fails
/// decoding of the whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// ISO-8601 / RFC 3339 text
    Iso(String),
    /// Seconds since the Unix epoch
    EpochSeconds(f64),
    /// Platform timestamp wrapper
    Wrapper(TimestampWrapper),
    /// Unsupported representation
    Unrecognized(serde_json::Value),
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        RawTimestamp::Iso(instant.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

/// Seconds/nanoseconds pair used by document-store SDKs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampWrapper {
    #[serde(alias = "_seconds")]
    pub seconds: i64,
    #[serde(default, alias = "_nanoseconds")]
    pub nanoseconds: i64,
}

/// A meditation or voice-conversation session as stored by the host app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Opaque identifier
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    /// When the session was created
    #[serde(default, alias = "created_at", alias = "timestamp", alias = "date")]
    pub created_at: Option<RawTimestamp>,
    /// Session length in seconds
    #[serde(
        default,
        alias = "duration_seconds",
        alias = "duration",
        deserialize_with = "lenient_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_seconds: Option<f64>,
    /// Display title, not used in aggregation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SessionRecord {
    /// Create a record with a timestamp and no duration
    pub fn new(id: impl Into<String>, created_at: impl Into<RawTimestamp>) -> Self {
        Self {
            id: id.into(),
            created_at: Some(created_at.into()),
            duration_seconds: None,
            title: None,
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Accept string or numeric ids (relational backends use integer keys)
fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// Accept numbers or numeric strings; anything else counts as absent
fn lenient_duration<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// A record whose timestamp resolved to a canonical instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedSession<'a> {
    /// Position in the input list
    pub index: usize,
    /// The source record
    pub record: &'a SessionRecord,
    /// Canonical instant
    pub created_at: DateTime<Utc>,
    /// Sanitized duration (finite, >= 0)
    pub duration_seconds: f64,
}

impl NormalizedSession<'_> {
    pub fn minutes(&self) -> f64 {
        self.duration_seconds / 60.0
    }
}

/// Why a record was left out of aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// No `createdAt` field or an explicit null
    MissingTimestamp,
    /// Present but not in any supported format
    MalformedTimestamp,
    /// Parsed but outside the representable calendar range
    OutOfRange,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::MissingTimestamp => "missing_timestamp",
            ExclusionReason::MalformedTimestamp => "malformed_timestamp",
            ExclusionReason::OutOfRange => "out_of_range",
        }
    }
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record dropped during normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedRecord {
    pub index: usize,
    pub id: String,
    pub reason: ExclusionReason,
}

/// History bucket label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HistoryLabel {
    Today,
    Yesterday,
    #[serde(rename = "This Week")]
    ThisWeek,
    Earlier,
}

impl HistoryLabel {
    /// Display order of the sections
    pub const ALL: [HistoryLabel; 4] = [
        HistoryLabel::Today,
        HistoryLabel::Yesterday,
        HistoryLabel::ThisWeek,
        HistoryLabel::Earlier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryLabel::Today => "Today",
            HistoryLabel::Yesterday => "Yesterday",
            HistoryLabel::ThisWeek => "This Week",
            HistoryLabel::Earlier => "Earlier",
        }
    }
}

/// A labeled group of sessions, most recent first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySection {
    pub label: HistoryLabel,
    pub sessions: Vec<SessionRecord>,
}

/// Single-letter weekday labels for the activity chart, Monday first
pub const WEEKDAY_LABELS: [&str; 7] = ["M", "T", "W", "T", "F", "S", "S"];

/// Minutes per day of the current Monday-start week and their bar heights
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeeklyActivity {
    /// Raw minutes per day (0 = Monday, 6 = Sunday)
    pub minutes: [f64; 7],
    /// Relative bar heights (0 = Monday, 6 = Sunday)
    pub bars: [f64; 7],
}

impl WeeklyActivity {
    pub fn total_minutes(&self) -> f64 {
        self.minutes
            .iter()
            .fold(0.0, |total, m| crate::weekly::add_minutes(total, *m))
    }

    /// True when no minutes were recorded this week
    pub fn is_empty(&self) -> bool {
        self.minutes.iter().all(|m| *m == 0.0)
    }
}

/// Streak figures shown on the profile screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakStats {
    /// Consecutive active days ending today or yesterday
    pub current: u32,
    /// Longest run of consecutive active days in the whole history
    pub longest: u32,
    /// Number of distinct local days with at least one session
    pub active_days: u32,
}

/// Everything the history and profile screens need, computed in one pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsSummary {
    /// Reference instant the summary was computed for
    pub generated_at: DateTime<Utc>,
    /// Time zone used for calendar-day boundaries
    pub timezone: String,
    /// Records with a resolvable timestamp
    pub total_sessions: usize,
    /// Sum of all sanitized durations, in minutes
    pub total_minutes: f64,
    /// Records left out because of their timestamp
    pub excluded_records: Vec<ExcludedRecord>,
    pub streak: StreakStats,
    pub history: Vec<HistorySection>,
    pub weekly: WeeklyActivity,
}
