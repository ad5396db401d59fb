use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::types::{RoomId, UserId};
use sqlx::FromRow;
use uuid::Uuid;

/// One row of the append-only activity log.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub room_id: RoomId,
    pub user_id: Option<UserId>,
    pub action: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}
