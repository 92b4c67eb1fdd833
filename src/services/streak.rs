//! Streak Calculator - shared by the login, mood and quest streaks.

use chrono::{Duration, NaiveDate};
use std::collections::HashSet;

/// Length of the run of consecutive calendar days ending at `today`.
///
/// Greedy backward walk: if `today` itself has no entry the result is 0,
/// no matter how long yesterday's run was ("reset at midnight unless
/// renewed"). Correct only while `dates` holds at most one entry per
/// calendar day, which the upsert keys on the write paths enforce.
pub fn compute_streak(dates: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut cursor = today;
    while dates.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

/// Parses the `YYYY-MM-DD` prefix of a stored date or timestamp string.
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    let day = s.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Collects the distinct calendar days out of raw date/timestamp strings,
/// silently skipping anything unparseable.
pub fn collect_days<'a, I>(raw: I) -> HashSet<NaiveDate>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter().filter_map(parse_day).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn days(items: &[&str]) -> HashSet<NaiveDate> {
        items.iter().map(|s| date(s)).collect()
    }

    #[test]
    fn consecutive_days_count_through_today() {
        let dates = days(&["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(compute_streak(&dates, date("2024-01-03")), 3);
    }

    #[test]
    fn gap_breaks_the_run() {
        let dates = days(&["2024-01-01", "2024-01-03"]);
        assert_eq!(compute_streak(&dates, date("2024-01-03")), 1);
    }

    #[test]
    fn missing_today_means_zero() {
        let dates = days(&["2024-01-01"]);
        assert_eq!(compute_streak(&dates, date("2024-01-03")), 0);
    }

    #[test]
    fn empty_history_is_zero() {
        assert_eq!(compute_streak(&HashSet::new(), date("2024-01-03")), 0);
    }

    #[test]
    fn crosses_month_boundary() {
        let dates = days(&["2024-01-31", "2024-02-01", "2024-02-02"]);
        assert_eq!(compute_streak(&dates, date("2024-02-02")), 3);
    }

    #[test]
    fn collect_days_takes_date_prefix_and_skips_junk() {
        let raw = vec!["2024-05-01", "2024-05-01T09:30:00", "not-a-date", ""];
        let set = collect_days(raw.iter().map(|s| *s));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&date("2024-05-01")));
    }
}
