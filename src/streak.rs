//! Consecutive-day streaks
//!
//! A streak counts consecutive local calendar days with at least one session.
//! The current streak stays alive until a full day passes without activity, so
//! a user who has not meditated yet today still sees yesterday's streak.

use crate::calendar::Calendar;
use crate::normalizer::SessionNormalizer;
use crate::types::{NormalizedSession, SessionRecord, StreakStats};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;

/// Current streak ending today or yesterday
pub fn compute_streak(sessions: &[SessionRecord], now: DateTime<Utc>, calendar: &Calendar) -> u32 {
    let report = SessionNormalizer::new(*calendar).normalize(sessions);
    let days = active_days(&report.sessions, calendar);
    current_streak(&days, calendar.day_of(now))
}

/// Current streak, longest streak and number of active days
pub fn streak_stats(
    sessions: &[SessionRecord],
    now: DateTime<Utc>,
    calendar: &Calendar,
) -> StreakStats {
    let report = SessionNormalizer::new(*calendar).normalize(sessions);
    stats_for_normalized(&report.sessions, now, calendar)
}

pub fn stats_for_normalized(
    sessions: &[NormalizedSession<'_>],
    now: DateTime<Utc>,
    calendar: &Calendar,
) -> StreakStats {
    let days = active_days(sessions, calendar);
    StreakStats {
        current: current_streak(&days, calendar.day_of(now)),
        longest: longest_streak(&days),
        active_days: days.len() as u32,
    }
}

/// Distinct local days with at least one session
pub fn active_days(sessions: &[NormalizedSession<'_>], calendar: &Calendar) -> BTreeSet<NaiveDate> {
    sessions
        .iter()
        .map(|s| calendar.day_of(s.created_at))
        .collect()
}

/// Walk back from today (or yesterday) while days stay active
pub fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let yesterday = today.pred_opt();

    let mut cursor = if days.contains(&today) {
        Some(today)
    } else if let Some(day) = yesterday.filter(|d| days.contains(d)) {
        Some(day)
    } else {
        return 0;
    };

    let mut streak = 0;
    while let Some(day) = cursor.filter(|d| days.contains(d)) {
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}

/// Longest run of consecutive days anywhere in the set
pub fn longest_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in days {
        run = match previous.and_then(|p| p.succ_opt()) {
            Some(next) if next == *day => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }

    longest
}
