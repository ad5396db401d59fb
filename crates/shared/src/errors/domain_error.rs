use thiserror::Error;

use crate::types::TimeOfDay;

/// Which constraint the travel-mode pre-flight ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelConflict {
    /// Shifted slot left the owner's preferred windows.
    OwnerPreference,
    /// Shifted slot left the requester's preferred windows.
    Preference,
    /// Travel buffer cannot be placed at all (blocked interval, day boundary).
    Blocked,
}

impl TravelConflict {
    /// Machine-readable reason code, part of the API contract.
    pub fn as_code(&self) -> &'static str {
        match self {
            TravelConflict::OwnerPreference => "travel_time_owner_preference_conflict",
            TravelConflict::Preference => "travel_time_preference_conflict",
            TravelConflict::Blocked => "travel_time_conflict",
        }
    }
}

/// Domain-level errors representing business logic violations.
///
/// User-facing messages are Korean prose carrying literal time windows; the
/// machine contract is the variant plus `reason_code`, never the wording.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{message}")]
    PreferenceViolation { message: String },

    #[error("{message}")]
    TravelInfeasible {
        conflict: TravelConflict,
        message: String,
        suggested_start: Option<TimeOfDay>,
    },

    #[error("이미 다른 일정과 겹치는 시간입니다")]
    SlotConflict,

    #[error("요청이 더 이상 유효하지 않습니다. 일정이 변경되었습니다")]
    StaleRequest,

    #[error("좌표 정보가 없어 이동시간을 계산할 수 없습니다: {0}")]
    MissingCoordinates(String),

    #[error("요청을 이해할 수 없습니다: {0}")]
    InvalidIntent(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Request not found: {0}")]
    RequestNotFound(String),

    #[error("Profile not found for user: {0}")]
    ProfileNotFound(String),

    #[error("Not a member of this room")]
    NotAMember,

    #[error("Only the room owner can do this")]
    NotRoomOwner,

    #[error("Only the request target can respond to it")]
    NotRequestTarget,

    #[error("Only the requester can cancel the request")]
    NotRequester,
}

impl DomainError {
    pub fn preference(message: impl Into<String>) -> Self {
        DomainError::PreferenceViolation {
            message: message.into(),
        }
    }

    /// Machine-readable reason code for the response envelope.
    pub fn reason_code(&self) -> &'static str {
        match self {
            DomainError::PreferenceViolation { .. } => "preference_violation",
            DomainError::TravelInfeasible { conflict, .. } => conflict.as_code(),
            DomainError::SlotConflict => "slot_conflict",
            DomainError::StaleRequest => "stale_request",
            DomainError::MissingCoordinates(_) => "missing_coordinates",
            DomainError::InvalidIntent(_) => "invalid_intent",
            DomainError::RoomNotFound(_) => "room_not_found",
            DomainError::RequestNotFound(_) => "request_not_found",
            DomainError::ProfileNotFound(_) => "profile_not_found",
            DomainError::NotAMember
            | DomainError::NotRoomOwner
            | DomainError::NotRequestTarget
            | DomainError::NotRequester => "not_authorized",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_conflict_codes() {
        assert_eq!(
            TravelConflict::OwnerPreference.as_code(),
            "travel_time_owner_preference_conflict"
        );
        assert_eq!(
            TravelConflict::Preference.as_code(),
            "travel_time_preference_conflict"
        );
        assert_eq!(TravelConflict::Blocked.as_code(), "travel_time_conflict");
    }

    #[test]
    fn test_reason_code_follows_conflict() {
        let err = DomainError::TravelInfeasible {
            conflict: TravelConflict::Blocked,
            message: "이동시간을 확보할 수 없습니다".to_string(),
            suggested_start: None,
        };
        assert_eq!(err.reason_code(), "travel_time_conflict");
    }

    #[test]
    fn test_preference_violation_message_passthrough() {
        let err = DomainError::preference("해당 시간은 선호 시간이 아닙니다 (09:00~12:00)");
        assert_eq!(
            err.to_string(),
            "해당 시간은 선호 시간이 아닙니다 (09:00~12:00)"
        );
    }
}
