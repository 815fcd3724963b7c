//! Processor configuration
//!
//! Defaults reproduce the history and profile screens exactly; overrides exist
//! for hosts that render a different chart height or a different time zone.

use crate::calendar::{Calendar, DEFAULT_TIMEZONE};
use crate::error::InsightsError;
use crate::grouping::DEFAULT_RECENT_WINDOW_DAYS;
use crate::weekly::DEFAULT_BAR_MAX_HEIGHT;
use serde::{Deserialize, Serialize};

/// Upper bound for the rolling history window (about a century)
pub const MAX_RECENT_WINDOW_DAYS: i64 = 36_500;

/// Settings for an [`InsightsProcessor`](crate::pipeline::InsightsProcessor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// IANA time zone for calendar-day boundaries
    pub timezone: String,
    /// Height of the tallest weekly bar
    pub bar_max_height: f64,
    /// Length of the rolling "This Week" history window in days
    pub recent_window_days: i64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            bar_max_height: DEFAULT_BAR_MAX_HEIGHT,
            recent_window_days: DEFAULT_RECENT_WINDOW_DAYS,
        }
    }
}

impl InsightsConfig {
    pub fn with_timezone(timezone: impl Into<String>) -> Self {
        Self {
            timezone: timezone.into(),
            ..Default::default()
        }
    }

    /// Load configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, InsightsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check all values and resolve the calendar
    pub fn validate(&self) -> Result<Calendar, InsightsError> {
        if !self.bar_max_height.is_finite() || self.bar_max_height <= 0.0 {
            return Err(InsightsError::InvalidConfig(format!(
                "bar_max_height must be a positive number, got {}",
                self.bar_max_height
            )));
        }
        if !(1..=MAX_RECENT_WINDOW_DAYS).contains(&self.recent_window_days) {
            return Err(InsightsError::InvalidConfig(format!(
                "recent_window_days must be between 1 and {}, got {}",
                MAX_RECENT_WINDOW_DAYS, self.recent_window_days
            )));
        }
        Calendar::new(&self.timezone)
    }
}
