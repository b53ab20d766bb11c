use crate::domain::models::Share;
use crate::error::{ServiceError, ServiceResult};
use sqlx::PgConnection;
use uuid::Uuid;

/// Repository for Share operations
///
/// Shares are append-only; the only delete path is the fan-out of the
/// shared post's own deletion.
pub struct ShareRepository;

impl ShareRepository {
    pub async fn insert_share(
        conn: &mut PgConnection,
        user_id: Uuid,
        post_id: Uuid,
    ) -> ServiceResult<Share> {
        sqlx::query_as::<_, Share>(
            r#"
            INSERT INTO post_shares (user_id, post_id)
            VALUES ($1, $2)
            RETURNING id, user_id, post_id, shared_at
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| ServiceError::from_write(e, format!("post {}", post_id)))
    }

    pub async fn delete_for_post(conn: &mut PgConnection, post_id: Uuid) -> ServiceResult<u64> {
        let result = sqlx::query("DELETE FROM post_shares WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}
