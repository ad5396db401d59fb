use chrono::{Datelike, Duration, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Minutes in a calendar day; ranges are half-open and never exceed this.
pub const MINUTES_PER_DAY: i32 = 1440;

/// All class and travel slots align to this granularity.
pub const SLOT_GRANULARITY_MINUTES: i32 = 10;

/// A wall-clock time of day stored as minutes from midnight.
///
/// Serialized as "HH:MM" so room documents stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeOfDay(i32);

impl TimeOfDay {
    pub fn from_minutes(minutes: i32) -> Self {
        Self(minutes.clamp(0, MINUTES_PER_DAY))
    }

    pub fn from_hm(hour: i32, minute: i32) -> Self {
        Self::from_minutes(hour * 60 + minute)
    }

    pub fn as_minutes(&self) -> i32 {
        self.0
    }

    pub fn add_minutes(&self, delta: i32) -> Self {
        Self::from_minutes(self.0 + delta)
    }

    pub fn hour(&self) -> i32 {
        self.0 / 60
    }

    pub fn minute(&self) -> i32 {
        self.0 % 60
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Error for malformed "HH:MM" strings.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Invalid time of day: {0}. Expected HH:MM between 00:00 and 24:00")]
pub struct TimeParseError(pub String);

impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| TimeParseError(s.to_string()))?;
        let hour: i32 = h.parse().map_err(|_| TimeParseError(s.to_string()))?;
        let minute: i32 = m.parse().map_err(|_| TimeParseError(s.to_string()))?;
        if !(0..=24).contains(&hour) || !(0..60).contains(&minute) || hour * 60 + minute > MINUTES_PER_DAY {
            return Err(TimeParseError(s.to_string()));
        }
        Ok(Self(hour * 60 + minute))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Round up to the next multiple of `step` minutes.
pub fn round_up_to_step(minutes: i32, step: i32) -> i32 {
    if step <= 0 || minutes <= 0 {
        return minutes.max(0);
    }
    ((minutes + step - 1) / step) * step
}

/// A half-open interval of minutes within one day: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinuteRange {
    pub start: i32,
    pub end: i32,
}

impl MinuteRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> i32 {
        (self.end - self.start).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &MinuteRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_min(&self, minute: i32) -> bool {
        self.start <= minute && minute < self.end
    }

    pub fn contains_range(&self, other: &MinuteRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn intersect(&self, other: &MinuteRange) -> Option<MinuteRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end {
            Some(MinuteRange { start, end })
        } else {
            None
        }
    }
}

impl fmt::Display for MinuteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}~{}",
            TimeOfDay::from_minutes(self.start),
            TimeOfDay::from_minutes(self.end)
        )
    }
}

/// Sort and coalesce overlapping or adjacent ranges into a canonical set.
pub fn merge_ranges(mut ranges: Vec<MinuteRange>) -> Vec<MinuteRange> {
    ranges.retain(|r| !r.is_empty());
    if ranges.is_empty() {
        return ranges;
    }
    ranges.sort_by_key(|r| (r.start, r.end));

    let mut merged = vec![ranges[0]];
    for range in ranges.into_iter().skip(1) {
        let last = merged.last_mut().unwrap();
        if range.start <= last.end {
            last.end = last.end.max(range.end);
        } else {
            merged.push(range);
        }
    }
    merged
}

/// Subtract every blocker from the base set, keeping canonical order.
pub fn subtract_ranges(base: &[MinuteRange], blockers: &[MinuteRange]) -> Vec<MinuteRange> {
    let mut result: Vec<MinuteRange> = base.iter().copied().filter(|r| !r.is_empty()).collect();
    for blocker in blockers.iter().filter(|b| !b.is_empty()) {
        let mut next = Vec::with_capacity(result.len() + 1);
        for range in result {
            if !range.overlaps(blocker) {
                next.push(range);
                continue;
            }
            if range.start < blocker.start {
                next.push(MinuteRange::new(range.start, blocker.start));
            }
            if blocker.end < range.end {
                next.push(MinuteRange::new(blocker.end, range.end));
            }
        }
        result = next;
    }
    merge_ranges(result)
}

/// Intersect two canonical range sets.
pub fn intersect_sets(a: &[MinuteRange], b: &[MinuteRange]) -> Vec<MinuteRange> {
    let mut out = Vec::new();
    for ra in a {
        for rb in b {
            if let Some(r) = ra.intersect(rb) {
                out.push(r);
            }
        }
    }
    merge_ranges(out)
}

/// Split a possibly midnight-crossing interval into the evening part on the
/// anchor day and the spill-over part on the following day.
pub fn split_overnight(start: TimeOfDay, end: TimeOfDay) -> (MinuteRange, Option<MinuteRange>) {
    if end.as_minutes() <= start.as_minutes() && end.as_minutes() > 0 {
        (
            MinuteRange::new(start.as_minutes(), MINUTES_PER_DAY),
            Some(MinuteRange::new(0, end.as_minutes())),
        )
    } else if end.as_minutes() == 0 {
        (MinuteRange::new(start.as_minutes(), MINUTES_PER_DAY), None)
    } else {
        (MinuteRange::new(start.as_minutes(), end.as_minutes()), None)
    }
}

/// Day of week used across preferences, exceptions and slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            chrono::Weekday::Mon => DayOfWeek::Monday,
            chrono::Weekday::Tue => DayOfWeek::Tuesday,
            chrono::Weekday::Wed => DayOfWeek::Wednesday,
            chrono::Weekday::Thu => DayOfWeek::Thursday,
            chrono::Weekday::Fri => DayOfWeek::Friday,
            chrono::Weekday::Sat => DayOfWeek::Saturday,
            chrono::Weekday::Sun => DayOfWeek::Sunday,
        }
    }

    pub fn is_weekday(&self) -> bool {
        !matches!(self, DayOfWeek::Saturday | DayOfWeek::Sunday)
    }

    /// Korean weekday label, used in user-facing messages.
    pub fn korean(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "월요일",
            DayOfWeek::Tuesday => "화요일",
            DayOfWeek::Wednesday => "수요일",
            DayOfWeek::Thursday => "목요일",
            DayOfWeek::Friday => "금요일",
            DayOfWeek::Saturday => "토요일",
            DayOfWeek::Sunday => "일요일",
        }
    }

    /// Offset from Monday, 0..=6.
    pub fn days_from_monday(&self) -> i64 {
        match self {
            DayOfWeek::Monday => 0,
            DayOfWeek::Tuesday => 1,
            DayOfWeek::Wednesday => 2,
            DayOfWeek::Thursday => 3,
            DayOfWeek::Friday => 4,
            DayOfWeek::Saturday => 5,
            DayOfWeek::Sunday => 6,
        }
    }
}

/// "YYYY-MM-DD" key for a local calendar day.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn weekday_of(date: NaiveDate) -> DayOfWeek {
    DayOfWeek::from_date(date)
}

/// Monday of the week containing `date`.
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}
