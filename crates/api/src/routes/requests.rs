use axum::{
    extract::{Path, State},
    Json,
};
use db::{ActivityLogRepository, RoomRepository};
use domain::{
    approve_request, cancel_request, reject_request, ActivityAction, ActivityEvent,
    ApprovalOutcome, Room,
};
use serde_json::{json, Value};
use shared::types::RequestId;
use shared::DomainError;

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    events::CoordinationEvent,
    metrics::record_request_resolved,
    routes::{load_profiles, parse_request_id},
    state::AppState,
};

/// Resolve the owning room, then reload it under its write lock. The second
/// load matters: the document may have changed between lookup and lock.
async fn locked_room_for_request(
    state: &AppState,
    request_id: RequestId,
) -> ApiResult<(Room, tokio::sync::OwnedRwLockWriteGuard<()>)> {
    let room = RoomRepository::find_by_request(&state.pool, request_id)
        .await?
        .ok_or_else(|| ApiError::from(DomainError::RequestNotFound(request_id.to_string())))?;

    let lock = state.locks.for_room(room.id).await;
    let guard = lock.write_owned().await;

    let room = RoomRepository::find_by_id(&state.pool, room.id)
        .await?
        .ok_or_else(|| ApiError::from(DomainError::RoomNotFound(room.id.to_string())))?;
    Ok((room, guard))
}

/// POST /requests/:id/approve - target user accepts the exchange
pub async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let request_id = parse_request_id(&id)?;
    let (mut room, _guard) = locked_room_for_request(&state, request_id).await?;

    let profiles = load_profiles(&state.pool, &room).await?;
    let matrix = state.travel.matrix_for_room(&room, &profiles).await?;

    match approve_request(&mut room, request_id, auth.user_id, &matrix)? {
        ApprovalOutcome::Approved { request, .. } => {
            RoomRepository::save(&state.pool, &room).await?;
            ActivityLogRepository::append(
                &state.pool,
                &ActivityEvent::new(
                    room.id,
                    Some(auth.user_id),
                    ActivityAction::RequestApproved,
                    format!(
                        "{}의 교환 요청 승인",
                        room.label_of(request.requester_id)
                    ),
                ),
            )
            .await?;
            record_request_resolved("approved");
            state
                .events
                .publish(CoordinationEvent::request_resolved(room.id, request_id, "approved"));
            state
                .events
                .publish(CoordinationEvent::schedule_updated(room.id));

            Ok(Json(json!({
                "success": true,
                "message": "교환 요청을 승인했습니다",
            })))
        }
        ApprovalOutcome::Stale { .. } => {
            // The request auto-rejected; persist its removal before failing.
            RoomRepository::save(&state.pool, &room).await?;
            ActivityLogRepository::append(
                &state.pool,
                &ActivityEvent::new(
                    room.id,
                    Some(auth.user_id),
                    ActivityAction::RequestStale,
                    "일정이 변경되어 교환 요청이 자동 거절되었습니다".to_string(),
                ),
            )
            .await?;
            record_request_resolved("stale");
            state
                .events
                .publish(CoordinationEvent::request_resolved(room.id, request_id, "rejected"));

            Err(DomainError::StaleRequest.into())
        }
    }
}

/// POST /requests/:id/reject - target user declines; no slots move
pub async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let request_id = parse_request_id(&id)?;
    let (mut room, _guard) = locked_room_for_request(&state, request_id).await?;

    let request = reject_request(&mut room, request_id, auth.user_id)?;

    RoomRepository::save(&state.pool, &room).await?;
    ActivityLogRepository::append(
        &state.pool,
        &ActivityEvent::new(
            room.id,
            Some(auth.user_id),
            ActivityAction::RequestRejected,
            format!("{}의 교환 요청 거절", room.label_of(request.requester_id)),
        ),
    )
    .await?;
    record_request_resolved("rejected");
    state
        .events
        .publish(CoordinationEvent::request_resolved(room.id, request_id, "rejected"));

    Ok(Json(json!({
        "success": true,
        "message": "교환 요청을 거절했습니다",
    })))
}

/// DELETE /requests/:id - requester withdraws the pending request
pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let request_id = parse_request_id(&id)?;
    let (mut room, _guard) = locked_room_for_request(&state, request_id).await?;

    cancel_request(&mut room, request_id, auth.user_id)?;

    RoomRepository::save(&state.pool, &room).await?;
    ActivityLogRepository::append(
        &state.pool,
        &ActivityEvent::new(
            room.id,
            Some(auth.user_id),
            ActivityAction::RequestCancelled,
            "교환 요청 취소".to_string(),
        ),
    )
    .await?;
    record_request_resolved("cancelled");
    state
        .events
        .publish(CoordinationEvent::request_resolved(room.id, request_id, "cancelled"));

    Ok(Json(json!({
        "success": true,
        "message": "교환 요청을 취소했습니다",
    })))
}
