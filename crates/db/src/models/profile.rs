use domain::{PersonalTime, ScheduleException, UserProfile, WeeklyPreference};
use shared::types::{Coordinates, UserId};
use sqlx::types::Json;
use sqlx::FromRow;

/// Row shape of the read-only `user_profiles` table. The three calendars are
/// stored as JSONB in the shape the profile service writes them.
#[derive(Debug, Clone, FromRow)]
pub struct UserProfileRow {
    pub user_id: UserId,
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub default_schedule: Json<Vec<WeeklyPreference>>,
    pub schedule_exceptions: Json<Vec<ScheduleException>>,
    pub personal_times: Json<Vec<PersonalTime>>,
}

impl UserProfileRow {
    /// Convert into the domain profile. Coordinates outside the valid range
    /// are dropped rather than propagated.
    pub fn into_profile(self) -> UserProfile {
        let coordinates = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng).ok(),
            _ => None,
        };

        UserProfile {
            id: self.user_id,
            name: self.name,
            address: self.address,
            coordinates,
            default_schedule: self.default_schedule.0,
            schedule_exceptions: self.schedule_exceptions.0,
            personal_times: self.personal_times.0,
        }
    }
}
