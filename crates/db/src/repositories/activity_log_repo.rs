use domain::ActivityEvent;
use shared::types::RoomId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ActivityLogEntry;

/// Append-only audit trail, one collection keyed by room.
pub struct ActivityLogRepository;

impl ActivityLogRepository {
    pub async fn append(pool: &PgPool, event: &ActivityEvent) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (id, room_id, user_id, action, detail)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.room_id.as_uuid())
        .bind(event.user_id.map(|u| *u.as_uuid()))
        .bind(event.action.as_str())
        .bind(&event.detail)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn list_by_room(
        pool: &PgPool,
        room_id: RoomId,
        limit: i64,
    ) -> Result<Vec<ActivityLogEntry>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT id, room_id, user_id, action, detail, created_at
            FROM activity_log
            WHERE room_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(room_id.as_uuid())
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
