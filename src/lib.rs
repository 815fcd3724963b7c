//! Session Insights - On-device history, streak and weekly activity statistics
//!
//! Insights turns the raw session list of a meditation / voice-conversation app
//! into the figures shown on its history and profile screens through a
//! deterministic pipeline: payload adaptation → timestamp normalization →
//! grouping, streak and weekly aggregation.
//!
//! ## Modules
//!
//! - **History Grouping**: "Today", "Yesterday", "This Week", "Earlier" sections
//! - **Streaks**: consecutive active days ending today or yesterday
//! - **Weekly Activity**: Monday-start minutes per day scaled to chart bars
//!
//! Every aggregation takes the reference instant `now` and a [`Calendar`] as
//! arguments; nothing here reads the system clock or the host time zone.

pub mod adapter;
pub mod calendar;
pub mod config;
pub mod error;
pub mod grouping;
pub mod normalizer;
pub mod pipeline;
pub mod streak;
pub mod types;
pub mod weekly;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use adapter::{ParsedSessions, SessionAdapter};
pub use calendar::Calendar;
pub use config::InsightsConfig;
pub use error::InsightsError;
pub use grouping::group_sessions;
pub use normalizer::{normalize_timestamp, SessionNormalizer};
pub use pipeline::{sessions_to_insights, InsightsProcessor};
pub use streak::{compute_streak, streak_stats};
pub use types::{
    HistoryLabel, HistorySection, InsightsSummary, RawTimestamp, SessionRecord, StreakStats,
    WeeklyActivity,
};
pub use weekly::compute_weekly_activity;

/// Library version
pub const INSIGHTS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "session-insights";
