//! Pipeline orchestration
//!
//! This module provides the public API for producing the history and profile
//! statistics in one pass: session JSON → adapter → normalizer → grouping,
//! streak and weekly aggregation → summary JSON.

use crate::adapter::SessionAdapter;
use crate::calendar::Calendar;
use crate::config::InsightsConfig;
use crate::error::InsightsError;
use crate::grouping::group_normalized;
use crate::normalizer::SessionNormalizer;
use crate::streak::{active_days, current_streak, stats_for_normalized};
use crate::types::{HistorySection, InsightsSummary, SessionRecord, WeeklyActivity};
use crate::weekly::{add_minutes, weekly_for_normalized};
use chrono::{DateTime, Utc};

/// Convert a session JSON array into summary JSON (stateless, one-shot).
///
/// # Arguments
/// * `sessions_json` - JSON array of session records
/// * `now` - Reference instant for "today" and "this week"
/// * `timezone` - IANA time zone for calendar-day boundaries
///
/// # Example
/// ```ignore
/// let summary_json = sessions_to_insights(json, Utc::now(), "Europe/Berlin")?;
/// ```
pub fn sessions_to_insights(
    sessions_json: &str,
    now: DateTime<Utc>,
    timezone: &str,
) -> Result<String, InsightsError> {
    let processor = InsightsProcessor::new(InsightsConfig::with_timezone(timezone))?;
    processor.process_json(sessions_json, now)
}

/// Processor bound to one configuration.
///
/// Holds no per-call state: every method is a pure function of its arguments
/// and the configuration, so a single processor can serve every refresh.
#[derive(Debug, Clone)]
pub struct InsightsProcessor {
    config: InsightsConfig,
    calendar: Calendar,
}

impl Default for InsightsProcessor {
    fn default() -> Self {
        Self {
            config: InsightsConfig::default(),
            calendar: Calendar::utc(),
        }
    }
}

impl InsightsProcessor {
    /// Create a processor, validating the configuration
    pub fn new(config: InsightsConfig) -> Result<Self, InsightsError> {
        let calendar = config.validate()?;
        Ok(Self { config, calendar })
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Compute every statistic from one consistent snapshot of records
    pub fn summarize(&self, records: &[SessionRecord], now: DateTime<Utc>) -> InsightsSummary {
        let report = SessionNormalizer::new(self.calendar).normalize(records);
        let sessions = &report.sessions;

        let history = group_normalized(
            sessions,
            now,
            &self.calendar,
            self.config.recent_window_days,
        );
        let streak = stats_for_normalized(sessions, now, &self.calendar);
        let weekly = weekly_for_normalized(sessions, now, &self.calendar, self.config.bar_max_height);
        let total_minutes = sessions
            .iter()
            .fold(0.0, |total, s| add_minutes(total, s.minutes()));

        tracing::debug!(
            records = records.len(),
            sessions = sessions.len(),
            excluded = report.excluded.len(),
            current_streak = streak.current,
            "Computed session insights"
        );

        InsightsSummary {
            generated_at: now,
            timezone: self.calendar.name().to_string(),
            total_sessions: sessions.len(),
            total_minutes,
            excluded_records: report.excluded,
            streak,
            history,
            weekly,
        }
    }

    /// History sections only
    pub fn group(&self, records: &[SessionRecord], now: DateTime<Utc>) -> Vec<HistorySection> {
        let report = SessionNormalizer::new(self.calendar).normalize(records);
        group_normalized(
            &report.sessions,
            now,
            &self.calendar,
            self.config.recent_window_days,
        )
    }

    /// Current streak only
    pub fn streak(&self, records: &[SessionRecord], now: DateTime<Utc>) -> u32 {
        let report = SessionNormalizer::new(self.calendar).normalize(records);
        let days = active_days(&report.sessions, &self.calendar);
        current_streak(&days, self.calendar.day_of(now))
    }

    /// Weekly activity only
    pub fn weekly(&self, records: &[SessionRecord], now: DateTime<Utc>) -> WeeklyActivity {
        let report = SessionNormalizer::new(self.calendar).normalize(records);
        weekly_for_normalized(
            &report.sessions,
            now,
            &self.calendar,
            self.config.bar_max_height,
        )
    }

    /// Parse a session JSON array and return the summary as JSON
    pub fn process_json(&self, sessions_json: &str, now: DateTime<Utc>) -> Result<String, InsightsError> {
        let parsed = SessionAdapter::parse_array(sessions_json)?;
        let summary = self.summarize(&parsed.records, now);
        Ok(serde_json::to_string(&summary)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HistoryLabel;
    use pretty_assertions::assert_eq;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn sample_sessions_json() -> &'static str {
        r#"[
            {"id": "s1", "createdAt": "2024-06-10T09:00:00Z", "durationSeconds": 600, "title": "Breathing"},
            {"id": "s2", "createdAt": {"seconds": 1717923600, "nanoseconds": 0}, "durationSeconds": 1200},
            {"id": "s3", "createdAt": 1717578000, "durationSeconds": 300},
            {"id": "s4", "createdAt": "2024-05-01T09:00:00Z", "durationSeconds": 900},
            {"id": "s5", "createdAt": "garbage", "durationSeconds": 60}
        ]"#
    }

    #[test]
    fn test_sessions_to_insights_stateless() {
        let now = utc("2024-06-10T12:00:00Z");
        let json = sessions_to_insights(sample_sessions_json(), now, "UTC").unwrap();

        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(payload["timezone"], "UTC");
        assert_eq!(payload["total_sessions"], 4);
        assert_eq!(payload["total_minutes"], 50.0);
        assert_eq!(payload["excluded_records"][0]["id"], "s5");
        assert_eq!(payload["excluded_records"][0]["reason"], "malformed_timestamp");

        let labels: Vec<&str> = payload["history"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["label"].as_str().unwrap())
            .collect();
        assert_eq!(labels, vec!["Today", "Yesterday", "This Week", "Earlier"]);
        assert_eq!(payload["history"][0]["sessions"][0]["title"], "Breathing");

        // Today is Monday 2024-06-10, only s1 falls in the chart week
        assert_eq!(payload["weekly"]["minutes"][0], 10.0);
        assert_eq!(payload["weekly"]["bars"][0], 80.0);
        assert_eq!(payload["streak"]["current"], 2);
    }

    #[test]
    fn test_summarize_matches_individual_operations() {
        let processor = InsightsProcessor::new(InsightsConfig::with_timezone("Asia/Kolkata")).unwrap();
        let parsed = SessionAdapter::parse_array(sample_sessions_json()).unwrap();
        let now = utc("2024-06-10T12:00:00Z");

        let summary = processor.summarize(&parsed.records, now);
        assert_eq!(summary.history, processor.group(&parsed.records, now));
        assert_eq!(summary.streak.current, processor.streak(&parsed.records, now));
        assert_eq!(summary.weekly, processor.weekly(&parsed.records, now));
    }

    #[test]
    fn test_custom_config() {
        let config = InsightsConfig {
            bar_max_height: 100.0,
            recent_window_days: 45,
            ..Default::default()
        };
        let processor = InsightsProcessor::new(config).unwrap();
        let parsed = SessionAdapter::parse_array(sample_sessions_json()).unwrap();
        let now = utc("2024-06-10T12:00:00Z");

        let summary = processor.summarize(&parsed.records, now);
        assert_eq!(summary.weekly.bars[0], 100.0);
        // 2024-05-01 is within a 45 day window
        let last = summary.history.last().unwrap();
        assert_eq!(last.label, HistoryLabel::ThisWeek);
    }

    #[test]
    fn test_extreme_durations_serialize_as_numbers() {
        let records: Vec<serde_json::Value> = (0..200)
            .map(|i| {
                serde_json::json!({
                    "id": format!("s{i}"),
                    "createdAt": "2024-06-10T09:00:00Z",
                    "durationSeconds": 1e308,
                })
            })
            .collect();
        let json = serde_json::Value::Array(records).to_string();
        let out = sessions_to_insights(&json, utc("2024-06-10T12:00:00Z"), "UTC").unwrap();
        let payload: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert!(payload["total_minutes"].as_f64().unwrap().is_finite());
        assert_eq!(payload["weekly"]["bars"][0], 80.0);
        for bar in payload["weekly"]["bars"].as_array().unwrap() {
            assert!(bar.is_number());
        }
    }

    #[test]
    fn test_huge_window_from_json_config_rejected() {
        let config = InsightsConfig::from_json(r#"{"recent_window_days": 1000000000}"#).unwrap();
        assert!(matches!(
            InsightsProcessor::new(config),
            Err(InsightsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_timezone() {
        let result = sessions_to_insights("[]", Utc::now(), "Not/AZone");
        assert!(matches!(result, Err(InsightsError::InvalidTimezone(_))));
    }

    #[test]
    fn test_invalid_json() {
        let result = sessions_to_insights("not valid json", Utc::now(), "UTC");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_list() {
        let processor = InsightsProcessor::default();
        let summary = processor.summarize(&[], utc("2024-06-10T12:00:00Z"));
        assert!(summary.history.is_empty());
        assert_eq!(summary.streak.current, 0);
        assert_eq!(summary.weekly.bars, [0.0; 7]);
        assert_eq!(summary.total_minutes, 0.0);
    }
}
