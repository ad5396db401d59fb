use domain::UserProfile;
use shared::types::UserId;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::UserProfileRow;

/// Read-only access to externally managed user profiles. This system never
/// writes this table.
pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn find_by_id(
        pool: &PgPool,
        user_id: UserId,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        let row: Option<UserProfileRow> = sqlx::query_as(
            r#"
            SELECT user_id, name, address, latitude, longitude,
                   default_schedule, schedule_exceptions, personal_times
            FROM user_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(pool)
        .await?;
        Ok(row.map(UserProfileRow::into_profile))
    }

    /// Batch lookup for a room's roster; absent profiles are simply missing
    /// from the map.
    pub async fn find_by_ids(
        pool: &PgPool,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, UserProfile>, sqlx::Error> {
        let uuids: Vec<Uuid> = user_ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<UserProfileRow> = sqlx::query_as(
            r#"
            SELECT user_id, name, address, latitude, longitude,
                   default_schedule, schedule_exceptions, personal_times
            FROM user_profiles
            WHERE user_id = ANY($1)
            "#,
        )
        .bind(&uuids)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.user_id, row.into_profile()))
            .collect())
    }
}
