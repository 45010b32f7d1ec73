//! Wall-clock helpers for the exhibition
//!
//! Provides the exhibition day counter shown in the header and the hour
//! boundary arithmetic the battle countdown is built on.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Offset, TimeZone, Utc};

const HOUR_MS: i64 = 60 * 60 * 1000;

/// Day of the exhibition for `today`
///
/// 0 before the opening day (standby), then 1-based, saturating at the
/// final day once the exhibition is over.
pub fn exhibition_day(today: NaiveDate, start: NaiveDate, end: NaiveDate) -> u32 {
    let diff = (today - start).num_days();
    if diff < 0 {
        return 0;
    }
    let total_days = (end - start).num_days().max(0) + 1;
    (diff + 1).min(total_days) as u32
}

/// UTC offset of the machine's local time zone at `now`
pub fn local_offset(now: DateTime<Utc>) -> FixedOffset {
    Local.offset_from_utc_datetime(&now.naive_utc()).fix()
}

/// The next whole hour of the wall clock at `offset`, strictly after `now`
///
/// Half-hour and quarter-hour zones get their own boundaries: at +05:30 the
/// hour turns at :30 UTC.
pub fn next_hour_boundary(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let shift = offset.local_minus_utc() as i64 * 1000;
    let local = now.timestamp_millis() + shift;
    let next = (local.div_euclid(HOUR_MS) + 1) * HOUR_MS - shift;
    DateTime::<Utc>::from_timestamp_millis(next).unwrap_or(now + Duration::hours(1))
}

/// Time left until the next hourly battle
pub fn time_until_next_battle(now: DateTime<Utc>, offset: FixedOffset) -> Duration {
    next_hour_boundary(now, offset) - now
}

/// Render a countdown as `MM:SS`
pub fn format_countdown(remaining: Duration) -> String {
    let total_secs = remaining.num_seconds().max(0);
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_exhibition_day_counts_from_one() {
        let start = date(2025, 3, 6);
        let end = date(2025, 3, 8);

        assert_eq!(exhibition_day(date(2025, 3, 5), start, end), 0);
        assert_eq!(exhibition_day(start, start, end), 1);
        assert_eq!(exhibition_day(date(2025, 3, 7), start, end), 2);
        assert_eq!(exhibition_day(end, start, end), 3);
        // Stays on the last day afterwards
        assert_eq!(exhibition_day(date(2025, 4, 1), start, end), 3);
    }

    fn utc() -> FixedOffset {
        Utc.fix()
    }

    #[test]
    fn test_next_hour_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 3, 6, 12, 34, 56).unwrap();
        let next = next_hour_boundary(now, utc());
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 6, 13, 0, 0).unwrap());
    }

    #[test]
    fn test_boundary_on_exact_hour_moves_forward() {
        let now = Utc.with_ymd_and_hms(2025, 3, 6, 23, 0, 0).unwrap();
        let next = next_hour_boundary(now, utc());
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 7, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_boundary_follows_half_hour_offset() {
        let india = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        // 12:34 UTC is 18:04 local; the next local hour is 19:00, i.e. 13:30 UTC
        let now = Utc.with_ymd_and_hms(2025, 3, 6, 12, 34, 0).unwrap();
        let next = next_hour_boundary(now, india);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 6, 13, 30, 0).unwrap());
        assert_eq!(next.with_timezone(&india).format("%H:%M").to_string(), "19:00");
        assert_eq!(time_until_next_battle(now, india), Duration::minutes(56));

        let newfoundland = FixedOffset::west_opt(3 * 3600 + 30 * 60).unwrap();
        let next = next_hour_boundary(now, newfoundland);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 6, 13, 30, 0).unwrap());
    }

    #[test]
    fn test_whole_hour_offset_matches_utc() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 6, 12, 34, 56).unwrap();
        assert_eq!(next_hour_boundary(now, tokyo), next_hour_boundary(now, utc()));
    }

    #[test]
    fn test_countdown_format() {
        let now = Utc.with_ymd_and_hms(2025, 3, 6, 12, 58, 30).unwrap();
        assert_eq!(format_countdown(time_until_next_battle(now, utc())), "01:30");
        assert_eq!(format_countdown(Duration::seconds(-5)), "00:00");
    }
}
