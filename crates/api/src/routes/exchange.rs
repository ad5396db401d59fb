use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use db::{ActivityLogRepository, RoomRepository};
use domain::{
    plan_exchange, ActivityAction, ActivityEvent, ExchangeContext, ExchangeOutcome, ParsedIntent,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::types::{date_key, weekday_of, DayOfWeek, TimeOfDay};
use shared::{AppError, DomainError};

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    events::CoordinationEvent,
    metrics::record_exchange,
    routes::{load_profiles, load_room, parse_room_id, require_member, today_in_room_tz},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ParseExchangeRequest {
    pub text: String,
}

/// POST /rooms/:id/parse-exchange-request - NL → parsed intent, delegated to
/// the external parser. No room state changes here.
pub async fn parse_exchange_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ParseExchangeRequest>,
) -> ApiResult<Json<Value>> {
    let room_id = parse_room_id(&id)?;

    let lock = state.locks.for_room(room_id).await;
    let _guard = lock.read().await;

    let room = load_room(&state.pool, room_id).await?;
    require_member(&room, auth.user_id)?;

    let parser = state.parser.as_ref().ok_or_else(|| {
        ApiError::from(AppError::ExternalApi(
            "Intent parser not configured".to_string(),
        ))
    })?;

    let today = today_in_room_tz(&room);
    let raw = parser
        .parse(&req.text, &date_key(today))
        .await
        .map_err(|e| ApiError::from(AppError::ExternalApi(format!("Parser error: {}", e))))?;

    // Reject parser output the planner would not understand.
    serde_json::from_value::<ParsedIntent>(raw.clone())
        .map_err(|e| ApiError::from(DomainError::InvalidIntent(e.to_string())))?;

    Ok(Json(json!({ "success": true, "intent": raw })))
}

#[derive(Debug, Deserialize)]
pub struct SmartExchangeRequest {
    pub intent: ParsedIntent,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immediate_swap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_approval: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_day: Option<DayOfWeek>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_time: Option<TimeOfDay>,
}

/// POST /rooms/:id/smart-exchange - apply a validated parsed intent
pub async fn smart_exchange(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<SmartExchangeRequest>,
) -> ApiResult<Json<ExchangeResponse>> {
    let room_id = parse_room_id(&id)?;

    let lock = state.locks.for_room(room_id).await;
    let _guard = lock.write().await;

    let mut room = load_room(&state.pool, room_id).await?;
    require_member(&room, auth.user_id)?;

    let profiles = load_profiles(&state.pool, &room).await?;
    let matrix = state.travel.matrix_for_room(&room, &profiles).await?;
    let ctx = ExchangeContext {
        profiles: &profiles,
        matrix: &matrix,
        today: today_in_room_tz(&room),
        now: Utc::now(),
        config: &state.config,
    };

    let outcome = match plan_exchange(&mut room, auth.user_id, &req.intent, &ctx) {
        Ok(outcome) => outcome,
        Err(err) => {
            record_exchange("rejected");
            ActivityLogRepository::append(
                &state.pool,
                &ActivityEvent::new(
                    room.id,
                    Some(auth.user_id),
                    ActivityAction::ExchangeRejected,
                    format!("교환 거부: {}", err),
                ),
            )
            .await?;
            return Err(err.into());
        }
    };

    RoomRepository::save(&state.pool, &room).await?;

    let response = match outcome {
        ExchangeOutcome::AlreadyInPlace { date, start, .. } => {
            record_exchange("already_in_place");
            ExchangeResponse {
                success: true,
                message: format!(
                    "{} {} 시간에 이미 배정되어 있습니다",
                    date_key(date),
                    start
                ),
                immediate_swap: Some(true),
                needs_approval: None,
                target_day: Some(weekday_of(date)),
                target_time: Some(start),
            }
        }
        ExchangeOutcome::Moved {
            source_date,
            date,
            start,
            auto_placed,
            ..
        } => {
            let action = if auto_placed {
                record_exchange("auto_placed");
                ActivityAction::ExchangeAutoPlaced
            } else {
                record_exchange("immediate");
                ActivityAction::ExchangeImmediate
            };
            ActivityLogRepository::append(
                &state.pool,
                &ActivityEvent::new(
                    room.id,
                    Some(auth.user_id),
                    action,
                    format!(
                        "{} 일정을 {} {}로 이동",
                        date_key(source_date),
                        date_key(date),
                        start
                    ),
                ),
            )
            .await?;
            state
                .events
                .publish(CoordinationEvent::schedule_updated(room.id));

            ExchangeResponse {
                success: true,
                message: format!("{} {}로 이동했습니다", date_key(date), start),
                immediate_swap: Some(true),
                needs_approval: None,
                target_day: Some(weekday_of(date)),
                target_time: Some(start),
            }
        }
        ExchangeOutcome::NeedsApproval {
            request_id,
            target_user_id,
            date,
            start,
            ..
        } => {
            record_exchange("needs_approval");
            ActivityLogRepository::append(
                &state.pool,
                &ActivityEvent::new(
                    room.id,
                    Some(auth.user_id),
                    ActivityAction::RequestCreated,
                    format!(
                        "{} {} 시간을 {}에게 요청",
                        date_key(date),
                        start,
                        room.label_of(target_user_id)
                    ),
                ),
            )
            .await?;
            state
                .events
                .publish(CoordinationEvent::request_created(room.id, request_id));

            ExchangeResponse {
                success: true,
                message: format!(
                    "{}님에게 교환 요청을 보냈습니다. 승인을 기다려주세요",
                    room.label_of(target_user_id)
                ),
                immediate_swap: None,
                needs_approval: Some(true),
                target_day: Some(weekday_of(date)),
                target_time: Some(start),
            }
        }
    };

    Ok(Json(response))
}
