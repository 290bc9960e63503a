//! Month-granularity date window.
//!
//! A record is in the window when its `(year, month)` is at or after the
//! cutoff's `(year, month)`. Day and time of day are ignored.

use chrono::{DateTime, Datelike, Local, Months};

/// Start of a window of `window_months` months ending at `now`.
///
/// A one-month window keeps only the current month.
pub fn cutoff_for(now: DateTime<Local>, window_months: u32) -> DateTime<Local> {
    let back = window_months.max(1) - 1;
    now.checked_sub_months(Months::new(back)).unwrap_or(now)
}

/// Whether `published` falls inside the window starting at `cutoff`.
pub fn in_window(published: &DateTime<Local>, cutoff: &DateTime<Local>) -> bool {
    (published.year(), published.month()) >= (cutoff.year(), cutoff.month())
}

/// Number of leading entries of a newest-first page that are in the window.
///
/// - the last (oldest) entry in window: the whole page;
/// - the first (newest) entry out of window: nothing;
/// - otherwise: scan backward from the second-to-last entry to the last one
///   still in window and keep everything up to it.
pub fn in_window_prefix(dates: &[DateTime<Local>], cutoff: &DateTime<Local>) -> usize {
    let Some(last) = dates.last() else {
        return 0;
    };
    if in_window(last, cutoff) {
        return dates.len();
    }
    if !in_window(&dates[0], cutoff) {
        return 0;
    }
    (0..dates.len() - 1)
        .rev()
        .find(|&i| in_window(&dates[i], cutoff))
        .map_or(0, |i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_in_window_ignores_day() {
        let cutoff = at(2024, 3, 28);
        assert!(in_window(&at(2024, 3, 1), &cutoff));
        assert!(in_window(&at(2024, 4, 1), &cutoff));
        assert!(!in_window(&at(2024, 2, 29), &cutoff));
    }

    #[test]
    fn test_in_window_year_dominates() {
        let cutoff = at(2024, 11, 15);
        assert!(in_window(&at(2025, 1, 1), &cutoff));
        assert!(!in_window(&at(2023, 12, 31), &cutoff));
    }

    #[test]
    fn test_cutoff_for_single_month_is_current_month() {
        let now = at(2024, 5, 20);
        assert_eq!(cutoff_for(now, 1), now);
        assert_eq!(cutoff_for(now, 0), now);
    }

    #[test]
    fn test_cutoff_for_crosses_year() {
        let cutoff = cutoff_for(at(2024, 2, 10), 3);
        assert_eq!((cutoff.year(), cutoff.month()), (2023, 12));
    }

    #[test]
    fn test_prefix_trims_straddling_page() {
        let page = [at(2024, 5, 9), at(2024, 4, 9), at(2024, 3, 9), at(2024, 2, 9)];
        assert_eq!(in_window_prefix(&page, &at(2024, 3, 1)), 3);
    }

    #[test]
    fn test_prefix_whole_page_in_window() {
        let page = [at(2024, 5, 9), at(2024, 4, 9)];
        assert_eq!(in_window_prefix(&page, &at(2024, 4, 30)), 2);
    }

    #[test]
    fn test_prefix_nothing_when_newest_is_too_old() {
        let page = [at(2024, 1, 9), at(2023, 12, 9)];
        assert_eq!(in_window_prefix(&page, &at(2024, 3, 1)), 0);
        assert_eq!(in_window_prefix(&[], &at(2024, 3, 1)), 0);
    }

    #[test]
    fn test_prefix_keeps_only_first() {
        let page = [at(2024, 3, 2), at(2024, 2, 9), at(2024, 1, 9)];
        assert_eq!(in_window_prefix(&page, &at(2024, 3, 1)), 1);
    }
}
