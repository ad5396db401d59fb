//! Room-wide blocked intervals: configured blocks, exceptions, and the
//! absolute evening block that applies everywhere.

use chrono::NaiveDate;
use shared::types::{merge_ranges, weekday_of, MinuteRange, MINUTES_PER_DAY};

use crate::room::{RoomException, RoomSettings};

/// Nothing may be scheduled from 17:00 to midnight, in any room.
pub const ABSOLUTE_BLOCK_START_MIN: i32 = 17 * 60;

/// All intervals on `date` that must not contain any slot, merged and sorted.
pub fn blocked_intervals(settings: &RoomSettings, date: NaiveDate) -> Vec<MinuteRange> {
    let weekday = weekday_of(date);
    let mut intervals = Vec::new();

    for bt in &settings.blocked_times {
        intervals.push(MinuteRange::new(bt.start.as_minutes(), bt.end.as_minutes()));
    }

    for exception in &settings.room_exceptions {
        match exception {
            RoomException::DailyRecurring {
                day_of_week,
                start,
                end,
            } if *day_of_week == weekday => {
                intervals.push(MinuteRange::new(start.as_minutes(), end.as_minutes()));
            }
            RoomException::DateSpecific {
                start_date,
                end_date,
                start,
                end,
            } if (*start_date..=*end_date).contains(&date) => {
                intervals.push(MinuteRange::new(start.as_minutes(), end.as_minutes()));
            }
            _ => {}
        }
    }

    intervals.push(MinuteRange::new(ABSOLUTE_BLOCK_START_MIN, MINUTES_PER_DAY));

    merge_ranges(intervals)
}

/// If `range` touches any blocked interval on `date`, return the
/// earliest-starting one as the reason.
pub fn is_blocked(
    settings: &RoomSettings,
    date: NaiveDate,
    range: &MinuteRange,
) -> Option<MinuteRange> {
    blocked_intervals(settings, date)
        .into_iter()
        .find(|b| b.overlaps(range))
}
