use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use db::{ActivityLogRepository, RoomRepository};
use domain::{run_weekly_schedule, ActivityAction, ActivityEvent};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    auth::AuthUser,
    error::ApiResult,
    events::CoordinationEvent,
    metrics::record_schedule_run,
    routes::{load_profiles, load_room, parse_room_id, require_owner, today_in_room_tz},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct RunScheduleRequest {
    /// Any date inside the target week; defaults to today in the room's
    /// timezone.
    #[serde(default)]
    pub week_start: Option<NaiveDate>,
}

/// POST /rooms/:id/run-schedule - build the weekly proposal
pub async fn run_schedule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    body: Option<Json<RunScheduleRequest>>,
) -> ApiResult<Json<Value>> {
    let room_id = parse_room_id(&id)?;
    let req = body.map(|Json(r)| r).unwrap_or_default();

    let lock = state.locks.for_room(room_id).await;
    let _guard = lock.write().await;

    let mut room = load_room(&state.pool, room_id).await?;
    require_owner(&room, auth.user_id)?;

    let profiles = load_profiles(&state.pool, &room).await?;
    let matrix = state.travel.matrix_for_room(&room, &profiles).await?;
    let week_start = req.week_start.unwrap_or_else(|| today_in_room_tz(&room));

    let summary = run_weekly_schedule(&mut room, &profiles, week_start, &matrix, &state.config)?;

    RoomRepository::save(&state.pool, &room).await?;
    ActivityLogRepository::append(
        &state.pool,
        &ActivityEvent::new(
            room.id,
            Some(auth.user_id),
            ActivityAction::ScheduleRun,
            format!(
                "자동 배정 실행: {}명 배정, {}명 미배정",
                summary.placed.len(),
                summary.unplaced.len()
            ),
        ),
    )
    .await?;

    record_schedule_run(&id, summary.placed.len(), summary.unplaced.len());
    state
        .events
        .publish(CoordinationEvent::schedule_updated(room.id));

    Ok(Json(json!({
        "success": true,
        "message": format!("{}명의 일정이 배정되었습니다", summary.placed.len()),
        "placed": summary.placed.len(),
        "unplaced": summary.unplaced,
        "room": room,
    })))
}

/// POST /rooms/:id/confirm-schedule - flip proposals to confirmed
pub async fn confirm_schedule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let room_id = parse_room_id(&id)?;

    let lock = state.locks.for_room(room_id).await;
    let _guard = lock.write().await;

    let mut room = load_room(&state.pool, room_id).await?;
    require_owner(&room, auth.user_id)?;

    room.confirm(Utc::now());

    RoomRepository::save(&state.pool, &room).await?;
    ActivityLogRepository::append(
        &state.pool,
        &ActivityEvent::new(
            room.id,
            Some(auth.user_id),
            ActivityAction::ScheduleConfirmed,
            "주간 일정 확정".to_string(),
        ),
    )
    .await?;

    state
        .events
        .publish(CoordinationEvent::schedule_updated(room.id));

    Ok(Json(json!({
        "success": true,
        "message": "일정이 확정되었습니다",
        "confirmedAt": room.confirmed_at,
    })))
}
