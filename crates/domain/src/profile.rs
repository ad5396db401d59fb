use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::types::{Coordinates, DayOfWeek, TimeOfDay, UserId};

fn default_priority() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

/// One weekly recurring preferred interval. An entry pinned to a
/// `specific_date` applies to that date only, regardless of weekday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyPreference {
    pub day_of_week: DayOfWeek,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub specific_date: Option<NaiveDate>,
}

/// Date-specific override of the weekly schedule. A holiday entry marks the
/// whole day unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleException {
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    #[serde(default)]
    pub is_holiday: bool,
}

/// A personal block, recurring on weekdays or pinned to one date. May cross
/// midnight, in which case it blocks the evening of its day and the morning
/// of the next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalTime {
    pub title: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    #[serde(default)]
    pub days: Vec<DayOfWeek>,
    #[serde(default)]
    pub specific_date: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_recurring: bool,
}

impl PersonalTime {
    /// Whether this personal time applies on `date`. A pinned date wins over
    /// the recurring day list.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        if let Some(pinned) = self.specific_date {
            return pinned == date;
        }
        self.is_recurring && self.days.contains(&DayOfWeek::from_date(date))
    }
}

/// External user profile, read-only to this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub default_schedule: Vec<WeeklyPreference>,
    #[serde(default)]
    pub schedule_exceptions: Vec<ScheduleException>,
    #[serde(default)]
    pub personal_times: Vec<PersonalTime>,
}

impl UserProfile {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            address: None,
            coordinates: None,
            default_schedule: Vec::new(),
            schedule_exceptions: Vec::new(),
            personal_times: Vec::new(),
        }
    }

    pub fn with_coordinates(mut self, coords: Coordinates) -> Self {
        self.coordinates = Some(coords);
        self
    }
}
