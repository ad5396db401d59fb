use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use db::{ActivityLogRepository, ProfileRepository, RoomRepository};
use domain::{
    ActivityAction, ActivityEvent, BlockedTime, Member, Room, RoomException, RoomSettings,
};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::types::{RoomId, TimeOfDay, TravelMode, UserId};
use shared::{AppError, DomainError};
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    routes::{load_room, parse_room_id, require_member},
    state::AppState,
};

/// Member colors assigned round-robin at creation.
const MEMBER_COLORS: [&str; 8] = [
    "#4f86f7", "#f76e6e", "#58c97a", "#f7b955", "#9b6ef7", "#f76ec1", "#5ad1d1", "#a3a84e",
];

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
    #[serde(default)]
    pub travel_mode: Option<TravelMode>,
    #[serde(default)]
    pub settings: Option<RoomSettingsPayload>,
}

#[derive(Debug, Deserialize)]
pub struct RoomSettingsPayload {
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub day_start_hour: Option<i32>,
    #[serde(default)]
    pub day_end_hour: Option<i32>,
    #[serde(default)]
    pub class_duration_minutes: Option<i32>,
    #[serde(default)]
    pub blocked_times: Vec<BlockedTimePayload>,
    #[serde(default)]
    pub room_exceptions: Vec<RoomException>,
}

#[derive(Debug, Deserialize)]
pub struct BlockedTimePayload {
    #[serde(default)]
    pub label: Option<String>,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// POST /rooms - create a coordination room owned by the caller
pub async fn create_room(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateRoomRequest>,
) -> ApiResult<Json<Value>> {
    req.validate()
        .map_err(|e| ApiError::from(AppError::Validation(e.to_string())))?;

    let member_ids: Vec<UserId> = req
        .member_ids
        .iter()
        .map(|raw| {
            raw.parse()
                .map_err(|_| ApiError::from(AppError::Validation(format!("Invalid member ID: {}", raw))))
        })
        .collect::<Result<_, _>>()?;

    let mut roster = vec![auth.user_id];
    roster.extend(member_ids.iter().copied());
    let profiles = ProfileRepository::find_by_ids(&state.pool, &roster).await?;

    let owner_profile = profiles
        .get(&auth.user_id)
        .ok_or_else(|| ApiError::from(DomainError::ProfileNotFound(auth.user_id.to_string())))?;

    let mut settings = RoomSettings::default();
    if let Some(payload) = req.settings {
        if let Some(timezone) = payload.timezone {
            settings.timezone = timezone;
        }
        if let Some(hour) = payload.day_start_hour {
            settings.day_start_hour = hour;
        }
        if let Some(hour) = payload.day_end_hour {
            settings.day_end_hour = hour;
        }
        if let Some(minutes) = payload.class_duration_minutes {
            settings.class_duration_minutes = minutes;
        }
        settings.blocked_times = payload
            .blocked_times
            .into_iter()
            .map(|bt| BlockedTime {
                label: bt.label,
                start: bt.start,
                end: bt.end,
            })
            .collect();
        settings.room_exceptions = payload.room_exceptions;
    }

    let mut room = Room::new(
        RoomId::new(),
        req.name,
        auth.user_id,
        owner_profile.name.clone(),
        settings,
        Utc::now(),
    );
    room.current_travel_mode = req.travel_mode.unwrap_or(TravelMode::None);

    for (index, member_id) in member_ids.iter().enumerate() {
        let profile = profiles.get(member_id).ok_or_else(|| {
            ApiError::from(DomainError::ProfileNotFound(member_id.to_string()))
        })?;
        room.members.push(
            Member::new(*member_id, profile.name.clone())
                .with_color(MEMBER_COLORS[index % MEMBER_COLORS.len()]),
        );
    }

    RoomRepository::save(&state.pool, &room).await?;
    ActivityLogRepository::append(
        &state.pool,
        &ActivityEvent::new(
            room.id,
            Some(auth.user_id),
            ActivityAction::RoomCreated,
            format!("방 생성: {}", room.name),
        ),
    )
    .await?;

    Ok(Json(json!({ "success": true, "room": room })))
}

/// GET /rooms/:id - room document with slots, travel slots and requests
pub async fn get_room(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let room_id = parse_room_id(&id)?;

    let lock = state.locks.for_room(room_id).await;
    let _guard = lock.read().await;

    let room = load_room(&state.pool, room_id).await?;
    require_member(&room, auth.user_id)?;

    Ok(Json(json!({ "success": true, "room": room })))
}
