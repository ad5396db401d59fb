//! Preference resolution: a user profile and a date in, a canonical set of
//! non-overlapping preferred minute ranges out.

use chrono::{Duration, NaiveDate};
use shared::types::{
    merge_ranges, split_overnight, subtract_ranges, week_monday, weekday_of, MinuteRange,
};

use crate::profile::UserProfile;

/// Resolve the preferred windows of `profile` on `date`.
///
/// Weekly entries matching the weekday (or pinned to the date) form the base
/// set; schedule exceptions for the date override it entirely, with a holiday
/// exception emptying the day; personal times are blockers subtracted at the
/// end, including the morning spill of a midnight-crossing block from the
/// previous day.
pub fn preferred_windows(profile: &UserProfile, date: NaiveDate) -> Vec<MinuteRange> {
    let weekday = weekday_of(date);

    let exceptions: Vec<_> = profile
        .schedule_exceptions
        .iter()
        .filter(|e| e.date == date)
        .collect();

    let preferences = if exceptions.iter().any(|e| e.is_holiday) {
        Vec::new()
    } else if !exceptions.is_empty() {
        exceptions
            .iter()
            .map(|e| MinuteRange::new(e.start.as_minutes(), e.end.as_minutes()))
            .collect()
    } else {
        profile
            .default_schedule
            .iter()
            .filter(|p| match p.specific_date {
                Some(pinned) => pinned == date,
                None => p.day_of_week == weekday,
            })
            .map(|p| MinuteRange::new(p.start.as_minutes(), p.end.as_minutes()))
            .collect()
    };

    let merged = merge_ranges(preferences);
    let blockers = personal_blockers(profile, date);
    subtract_ranges(&merged, &blockers)
}

/// Personal-time blockers on `date`, including midnight spill-over from the
/// previous day.
pub fn personal_blockers(profile: &UserProfile, date: NaiveDate) -> Vec<MinuteRange> {
    let mut blockers = Vec::new();
    let previous = date - Duration::days(1);

    for pt in &profile.personal_times {
        if pt.applies_on(date) {
            let (day_part, _) = split_overnight(pt.start, pt.end);
            blockers.push(day_part);
        }
        if pt.applies_on(previous) {
            if let (_, Some(spill)) = split_overnight(pt.start, pt.end) {
                blockers.push(spill);
            }
        }
    }

    merge_ranges(blockers)
}

/// Preferred windows with the exchange-validation scope: date-specific
/// exceptions and pinned personal times outside the week of `today` are
/// ignored, recurring entries always apply.
pub fn preferred_windows_this_week(
    profile: &UserProfile,
    date: NaiveDate,
    today: NaiveDate,
) -> Vec<MinuteRange> {
    let monday = week_monday(today);
    let in_week = |d: NaiveDate| week_monday(d) == monday;

    let mut scoped = profile.clone();
    scoped.schedule_exceptions.retain(|e| in_week(e.date));
    scoped
        .personal_times
        .retain(|pt| pt.specific_date.map_or(true, in_week));

    preferred_windows(&scoped, date)
}
