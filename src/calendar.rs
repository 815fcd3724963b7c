//! Calendar-day arithmetic in the user's time zone
//!
//! "Today", "yesterday" and "this week" are local notions, so every day boundary
//! is computed in an explicit IANA time zone instead of whatever zone the host
//! process happens to run in.

use crate::error::InsightsError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Time zone used when none is configured
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Local calendar for day and week boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    tz: Tz,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    /// Create a calendar from an IANA time zone name (e.g. "Europe/Berlin")
    pub fn new(timezone: &str) -> Result<Self, InsightsError> {
        let tz = timezone
            .trim()
            .parse::<Tz>()
            .map_err(|e| InsightsError::InvalidTimezone(format!("{}: {}", timezone, e)))?;
        Ok(Self { tz })
    }

    pub fn utc() -> Self {
        Self { tz: Tz::UTC }
    }

    pub fn from_tz(tz: Tz) -> Self {
        Self { tz }
    }

    /// IANA name of the calendar's time zone
    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// Local calendar day containing `instant`
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// Weekday of `instant` in local time, 0 = Monday .. 6 = Sunday
    pub fn weekday_index(&self, instant: DateTime<Utc>) -> usize {
        instant
            .with_timezone(&self.tz)
            .weekday()
            .num_days_from_monday() as usize
    }

    /// First instant of a local day.
    ///
    /// Zones that switch DST at midnight have no 00:00 on that day; the first
    /// valid local time after midnight is used instead.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::default());
        (0..=12)
            .map(|step| midnight + Duration::minutes(15 * step))
            .find_map(|local| self.tz.from_local_datetime(&local).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
    }

    /// Local midnight of the Monday on or before `instant`
    pub fn start_of_week(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let day = self.day_of(instant);
        let offset = day.weekday().num_days_from_monday() as i64;
        let monday = day - Duration::days(offset);
        self.start_of_day(monday)
    }

    /// Interpret an offset-less date-time as local time.
    ///
    /// Ambiguous times (DST fall-back) resolve to the earlier instant; times
    /// inside a DST gap are shifted forward by one hour.
    pub fn resolve_local(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| {
                self.tz
                    .from_local_datetime(&(naive + Duration::hours(1)))
                    .earliest()
            })
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use pretty_assertions::assert_eq;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let result = Calendar::new("Mars/Olympus_Mons");
        assert!(matches!(result, Err(InsightsError::InvalidTimezone(_))));
    }

    #[test]
    fn test_day_of_uses_local_zone() {
        let calendar = Calendar::new("America/New_York").unwrap();
        // 02:00 UTC on the 10th is still the evening of the 9th in New York
        let instant = utc("2024-06-10T02:00:00Z");
        assert_eq!(
            calendar.day_of(instant),
            NaiveDate::from_ymd_opt(2024, 6, 9).unwrap()
        );
        assert_eq!(
            Calendar::utc().day_of(instant),
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
        );
    }

    #[test]
    fn test_start_of_week_is_monday_midnight() {
        let calendar = Calendar::utc();
        // 2024-06-13 is a Thursday
        let monday = calendar.start_of_week(utc("2024-06-13T15:30:00Z"));
        assert_eq!(monday, utc("2024-06-10T00:00:00Z"));
        assert_eq!(monday.weekday(), Weekday::Mon);

        // A Monday maps to the start of that same day
        let same = calendar.start_of_week(utc("2024-06-10T23:59:59Z"));
        assert_eq!(same, utc("2024-06-10T00:00:00Z"));

        // A Sunday maps back six days
        let sunday = calendar.start_of_week(utc("2024-06-16T08:00:00Z"));
        assert_eq!(sunday, utc("2024-06-10T00:00:00Z"));
    }

    #[test]
    fn test_start_of_week_in_offset_zone() {
        let calendar = Calendar::new("Asia/Tokyo").unwrap();
        // Monday 2024-06-10 00:00 JST = 2024-06-09 15:00 UTC
        let monday = calendar.start_of_week(utc("2024-06-12T03:00:00Z"));
        assert_eq!(monday, utc("2024-06-09T15:00:00Z"));
    }

    #[test]
    fn test_start_of_day_skips_dst_gap_at_midnight() {
        // Brazil started DST at local midnight on 2018-11-04
        let calendar = Calendar::new("America/Sao_Paulo").unwrap();
        let date = NaiveDate::from_ymd_opt(2018, 11, 4).unwrap();
        assert_eq!(calendar.start_of_day(date), utc("2018-11-04T03:00:00Z"));
    }

    #[test]
    fn test_weekday_index() {
        let calendar = Calendar::utc();
        assert_eq!(calendar.weekday_index(utc("2024-06-10T12:00:00Z")), 0);
        assert_eq!(calendar.weekday_index(utc("2024-06-16T12:00:00Z")), 6);
    }

    #[test]
    fn test_resolve_local() {
        let calendar = Calendar::new("Europe/Berlin").unwrap();
        let naive = NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(
            calendar.resolve_local(naive),
            Some(utc("2024-06-10T07:00:00Z"))
        );
    }
}
