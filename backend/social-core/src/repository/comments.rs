use crate::domain::models::Comment;
use crate::error::{ServiceError, ServiceResult};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Repository for Comment operations
#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Comments for a post, oldest first
    pub async fn get_comments(&self, post_id: Uuid, limit: i64) -> ServiceResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, author_id, content, likes_count, created_at, updated_at
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2
            "#,
        )
        .bind(post_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    pub async fn insert_comment(
        conn: &mut PgConnection,
        post_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> ServiceResult<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, post_id, author_id, content, likes_count, created_at, updated_at
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| ServiceError::from_write(e, format!("post {}", post_id)))
    }

    /// Lock every comment of a post ahead of the fan-out delete
    pub async fn lock_for_post(conn: &mut PgConnection, post_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM comments
            WHERE post_id = $1
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(post_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(ids)
    }

    /// Fan-out step of post deletion
    pub async fn delete_for_post(conn: &mut PgConnection, post_id: Uuid) -> ServiceResult<u64> {
        let result = sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}
