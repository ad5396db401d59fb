use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{DayOfWeek, RoomId, TimeOfDay, TravelMode, UserId};

use crate::exchange::ExchangeRequest;
use crate::slots::SlotStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Draft,
    Confirmed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    /// Sessions owed from previous weeks; consulted as a scheduling tie-break.
    #[serde(default)]
    pub carry_over: i32,
    #[serde(default)]
    pub completed: i32,
}

impl Member {
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            color: None,
            carry_over: 0,
            completed: 0,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// A recurring daily blocked interval configured on the room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedTime {
    #[serde(default)]
    pub label: Option<String>,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// Room-level exception: either a weekday-recurring closure or a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomException {
    DailyRecurring {
        day_of_week: DayOfWeek,
        start: TimeOfDay,
        end: TimeOfDay,
    },
    DateSpecific {
        start_date: NaiveDate,
        end_date: NaiveDate,
        start: TimeOfDay,
        end: TimeOfDay,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSettings {
    /// IANA timezone the room's calendar days are anchored to.
    pub timezone: String,
    pub day_start_hour: i32,
    pub day_end_hour: i32,
    pub class_duration_minutes: i32,
    #[serde(default)]
    pub blocked_times: Vec<BlockedTime>,
    #[serde(default)]
    pub room_exceptions: Vec<RoomException>,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            timezone: "Asia/Seoul".to_string(),
            day_start_hour: 9,
            day_end_hour: 17,
            class_duration_minutes: 60,
            blocked_times: Vec::new(),
            room_exceptions: Vec::new(),
        }
    }
}

/// The aggregate root: a coordination room owning its slots and pending
/// requests. User profiles are external, read-only references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub owner_id: UserId,
    pub owner_name: String,
    pub members: Vec<Member>,
    pub settings: RoomSettings,
    #[serde(default)]
    pub current_travel_mode: TravelMode,
    #[serde(default)]
    pub confirmed_travel_mode: Option<TravelMode>,
    pub status: RoomStatus,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub slots: SlotStore,
    #[serde(default)]
    pub requests: Vec<ExchangeRequest>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(
        id: RoomId,
        name: impl Into<String>,
        owner_id: UserId,
        owner_name: impl Into<String>,
        settings: RoomSettings,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            owner_id,
            owner_name: owner_name.into(),
            members: Vec::new(),
            settings,
            current_travel_mode: TravelMode::None,
            confirmed_travel_mode: None,
            status: RoomStatus::Draft,
            confirmed_at: None,
            slots: SlotStore::new(),
            requests: Vec::new(),
            created_at,
        }
    }

    pub fn is_member(&self, user_id: UserId) -> bool {
        self.owner_id == user_id || self.members.iter().any(|m| m.user_id == user_id)
    }

    pub fn member(&self, user_id: UserId) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    pub fn member_mut(&mut self, user_id: UserId) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.user_id == user_id)
    }

    /// Display label for a participant, used in travel info and messages.
    pub fn label_of(&self, user_id: UserId) -> String {
        if user_id == self.owner_id {
            return self.owner_name.clone();
        }
        self.member(user_id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| user_id.to_string())
    }

    pub fn color_of(&self, user_id: UserId) -> Option<String> {
        self.member(user_id).and_then(|m| m.color.clone())
    }

    /// Effective travel mode: confirmed mode if frozen, else the current one.
    pub fn effective_travel_mode(&self) -> TravelMode {
        self.confirmed_travel_mode.unwrap_or(self.current_travel_mode)
    }

    /// Owner confirmation: flip every slot to confirmed and freeze the
    /// travel mode in effect.
    pub fn confirm(&mut self, now: DateTime<Utc>) {
        self.status = RoomStatus::Confirmed;
        self.confirmed_at = Some(now);
        self.confirmed_travel_mode = Some(self.current_travel_mode);
        self.slots.confirm_all();
    }

    pub fn pending_request(&self, id: shared::types::RequestId) -> Option<&ExchangeRequest> {
        self.requests.iter().find(|r| r.id == id)
    }
}
