use shared::types::{RoomId, UserId};

/// What a log entry records. Stored as its snake_case string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityAction {
    RoomCreated,
    ScheduleRun,
    ScheduleConfirmed,
    ExchangeImmediate,
    ExchangeAutoPlaced,
    ExchangeRejected,
    RequestCreated,
    RequestApproved,
    RequestRejected,
    RequestCancelled,
    RequestStale,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::RoomCreated => "room_created",
            ActivityAction::ScheduleRun => "schedule_run",
            ActivityAction::ScheduleConfirmed => "schedule_confirmed",
            ActivityAction::ExchangeImmediate => "exchange_immediate",
            ActivityAction::ExchangeAutoPlaced => "exchange_auto_placed",
            ActivityAction::ExchangeRejected => "exchange_rejected",
            ActivityAction::RequestCreated => "request_created",
            ActivityAction::RequestApproved => "request_approved",
            ActivityAction::RequestRejected => "request_rejected",
            ActivityAction::RequestCancelled => "request_cancelled",
            ActivityAction::RequestStale => "request_stale",
        }
    }
}

/// One user-visible outcome, appended to the room's audit trail.
#[derive(Debug, Clone)]
pub struct ActivityEvent {
    pub room_id: RoomId,
    pub user_id: Option<UserId>,
    pub action: ActivityAction,
    pub detail: String,
}

impl ActivityEvent {
    pub fn new(
        room_id: RoomId,
        user_id: Option<UserId>,
        action: ActivityAction,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            room_id,
            user_id,
            action,
            detail: detail.into(),
        }
    }
}
