//! Weekly activity chart
//!
//! Sums session minutes per weekday of the current Monday-start week and scales
//! them into bar heights, the busiest day reaching the full bar height.

use crate::calendar::Calendar;
use crate::normalizer::SessionNormalizer;
use crate::types::{NormalizedSession, SessionRecord, WeeklyActivity};
use chrono::{DateTime, Utc};

/// Height of the tallest bar
pub const DEFAULT_BAR_MAX_HEIGHT: f64 = 80.0;

/// Floor for the scaling divisor, in minutes. Keeps an empty week flat.
const MIN_SCALE_MINUTES: f64 = 1.0;

/// Minutes per day of the current week with bars scaled to 0..=80
pub fn compute_weekly_activity(
    sessions: &[SessionRecord],
    now: DateTime<Utc>,
    calendar: &Calendar,
) -> WeeklyActivity {
    let report = SessionNormalizer::new(*calendar).normalize(sessions);
    weekly_for_normalized(&report.sessions, now, calendar, DEFAULT_BAR_MAX_HEIGHT)
}

pub fn weekly_for_normalized(
    sessions: &[NormalizedSession<'_>],
    now: DateTime<Utc>,
    calendar: &Calendar,
    bar_max_height: f64,
) -> WeeklyActivity {
    let monday = calendar.start_of_week(now);

    let mut minutes = [0.0_f64; 7];
    for session in sessions.iter().filter(|s| s.created_at >= monday) {
        let day = &mut minutes[calendar.weekday_index(session.created_at)];
        *day = add_minutes(*day, session.minutes());
    }

    WeeklyActivity {
        minutes,
        bars: scale_bars(&minutes, bar_max_height),
    }
}

/// Sum that saturates at `f64::MAX` instead of reaching infinity
pub fn add_minutes(total: f64, minutes: f64) -> f64 {
    (total + minutes).min(f64::MAX)
}

/// Scale values relative to the largest one.
///
/// NaN and negative values draw no bar; infinity counts as the largest value.
pub fn scale_bars(minutes: &[f64; 7], bar_max_height: f64) -> [f64; 7] {
    let finite = |value: f64| {
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, f64::MAX)
        }
    };
    let max_val = minutes.iter().copied().map(finite).fold(MIN_SCALE_MINUTES, f64::max);
    minutes.map(|value| (finite(value) / max_val) * bar_max_height)
}
