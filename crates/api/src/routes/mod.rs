pub mod exchange;
pub mod health;
pub mod prometheus;
pub mod requests;
pub mod rooms;
pub mod schedule;

use chrono::{NaiveDate, Utc};
use db::{ProfileRepository, RoomRepository};
use domain::{Room, UserProfile};
use shared::types::{RoomId, UserId};
use shared::{AppError, DomainError};
use sqlx::PgPool;
use std::collections::HashMap;

use crate::error::ApiError;

pub(crate) fn parse_room_id(raw: &str) -> Result<RoomId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::from(AppError::Validation("Invalid room ID".to_string())))
}

pub(crate) fn parse_request_id(raw: &str) -> Result<shared::types::RequestId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::from(AppError::Validation("Invalid request ID".to_string())))
}

pub(crate) async fn load_room(pool: &PgPool, id: RoomId) -> Result<Room, ApiError> {
    RoomRepository::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::from(DomainError::RoomNotFound(id.to_string())))
}

pub(crate) fn require_member(room: &Room, user_id: UserId) -> Result<(), ApiError> {
    if room.is_member(user_id) {
        Ok(())
    } else {
        Err(DomainError::NotAMember.into())
    }
}

pub(crate) fn require_owner(room: &Room, user_id: UserId) -> Result<(), ApiError> {
    if room.owner_id == user_id {
        Ok(())
    } else {
        Err(DomainError::NotRoomOwner.into())
    }
}

/// Profiles for the whole roster, owner included. Absent profiles are simply
/// missing from the map; the domain decides whether that matters.
pub(crate) async fn load_profiles(
    pool: &PgPool,
    room: &Room,
) -> Result<HashMap<UserId, UserProfile>, ApiError> {
    let mut ids = vec![room.owner_id];
    ids.extend(room.members.iter().map(|m| m.user_id));
    Ok(ProfileRepository::find_by_ids(pool, &ids).await?)
}

/// "Today" in the room's own timezone; relative expressions like "이번 주"
/// resolve against this.
pub(crate) fn today_in_room_tz(room: &Room) -> NaiveDate {
    let tz: chrono_tz::Tz = room.settings.timezone.parse().unwrap_or(chrono_tz::UTC);
    Utc::now().with_timezone(&tz).date_naive()
}
