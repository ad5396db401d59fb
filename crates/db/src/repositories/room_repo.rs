use domain::Room;
use shared::types::RoomId;
use sqlx::types::Json;
use sqlx::PgPool;

/// Rooms persist as one JSONB document per row: the aggregate embeds its
/// members, slots, travel slots, requests and settings.
pub struct RoomRepository;

impl RoomRepository {
    pub async fn find_by_id(pool: &PgPool, id: RoomId) -> Result<Option<Room>, sqlx::Error> {
        let row: Option<(Json<Room>,)> =
            sqlx::query_as("SELECT doc FROM rooms WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|(Json(room),)| room))
    }

    /// Locate the room holding a pending request. Requests are embedded in
    /// the room document, so this scans the requests array.
    pub async fn find_by_request(
        pool: &PgPool,
        request_id: shared::types::RequestId,
    ) -> Result<Option<Room>, sqlx::Error> {
        let row: Option<(Json<Room>,)> = sqlx::query_as(
            r#"
            SELECT doc FROM rooms
            WHERE EXISTS (
                SELECT 1 FROM jsonb_array_elements(doc->'requests') AS r
                WHERE r->>'id' = $1
            )
            "#,
        )
        .bind(request_id.to_string())
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|(Json(room),)| room))
    }

    /// Upsert the whole document. The caller holds the room's write lock, so
    /// last-write-wins here is safe.
    pub async fn save(pool: &PgPool, room: &Room) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO rooms (id, doc, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc, updated_at = now()
            "#,
        )
        .bind(room.id.as_uuid())
        .bind(Json(room))
        .execute(pool)
        .await?;
        Ok(())
    }
}
