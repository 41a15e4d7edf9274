//! Project-relative week bucketing.
//!
//! Week 1 starts at `project_start`. The boundary rule is fixed as follows:
//! the end of week `n` is `project_start + 7n` days, and a date that falls
//! exactly on a boundary belongs to the *following* week. Equivalently, the
//! boundary marker starts at `project_start + 7` days and advances while
//! `boundary <= date`. Dates at or before `project_start` map to week 1.

use chrono::{Days, NaiveDate};

use crate::config::CalendarConfig;

/// 1-based week index of `date` relative to `start`.
pub fn week_number(date: NaiveDate, start: NaiveDate) -> u32 {
    // end of week 1
    let mut boundary = start + Days::new(7);
    let mut week = 1;
    while boundary <= date {
        boundary = boundary + Days::new(7);
        week += 1;
    }
    week
}

/// Total number of week buckets in the configured project range.
pub fn total_weeks(calendar: &CalendarConfig) -> u32 {
    week_number(calendar.project_end, calendar.project_start)
}
