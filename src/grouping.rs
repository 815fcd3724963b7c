//! History grouping
//!
//! Buckets sessions into "Today", "Yesterday", "This Week" and "Earlier" for the
//! history screen. "This Week" is a rolling window ending at `now`, independent
//! of the Monday-start week used by the activity chart.

use crate::calendar::Calendar;
use crate::normalizer::SessionNormalizer;
use crate::types::{HistoryLabel, HistorySection, NormalizedSession, SessionRecord};
use chrono::{DateTime, Duration, Utc};

/// Length of the rolling "This Week" window in days
pub const DEFAULT_RECENT_WINDOW_DAYS: i64 = 7;

/// Group records into labeled history sections.
///
/// Records with an unresolvable timestamp are left out. Sections are returned
/// in display order and empty sections are omitted.
pub fn group_sessions(
    sessions: &[SessionRecord],
    now: DateTime<Utc>,
    calendar: &Calendar,
) -> Vec<HistorySection> {
    let report = SessionNormalizer::new(*calendar).normalize(sessions);
    group_normalized(&report.sessions, now, calendar, DEFAULT_RECENT_WINDOW_DAYS)
}

/// Group already-normalized sessions using a custom rolling window
pub fn group_normalized(
    sessions: &[NormalizedSession<'_>],
    now: DateTime<Utc>,
    calendar: &Calendar,
    recent_window_days: i64,
) -> Vec<HistorySection> {
    let today = calendar.day_of(now);
    let yesterday = today.pred_opt();
    // Windows reaching past chrono's range cover everything
    let window_start = Duration::try_days(recent_window_days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut buckets: [Vec<&NormalizedSession<'_>>; 4] = Default::default();

    for session in sessions {
        let day = calendar.day_of(session.created_at);
        let label = if day == today {
            HistoryLabel::Today
        } else if Some(day) == yesterday {
            HistoryLabel::Yesterday
        } else if session.created_at > window_start {
            HistoryLabel::ThisWeek
        } else {
            HistoryLabel::Earlier
        };
        buckets[bucket_index(label)].push(session);
    }

    HistoryLabel::ALL
        .iter()
        .zip(buckets)
        .filter(|(_, bucket)| !bucket.is_empty())
        .map(|(label, mut bucket)| {
            // Stable sort: equal instants keep input order
            bucket.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            HistorySection {
                label: *label,
                sessions: bucket.into_iter().map(|s| s.record.clone()).collect(),
            }
        })
        .collect()
}

fn bucket_index(label: HistoryLabel) -> usize {
    match label {
        HistoryLabel::Today => 0,
        HistoryLabel::Yesterday => 1,
        HistoryLabel::ThisWeek => 2,
        HistoryLabel::Earlier => 3,
    }
}
