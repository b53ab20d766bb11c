use crate::domain::models::Post;
use crate::error::{ServiceError, ServiceResult};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Repository for Post operations
///
/// Reads go through the pool; writes take the connection of the mutation
/// transaction they belong to.
#[derive(Clone)]
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a single post by ID
    pub async fn get_post(&self, post_id: Uuid) -> ServiceResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, content, likes_count, comments_count, shares_count,
                   created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// Most recent posts first
    pub async fn list_recent(&self, limit: i64) -> ServiceResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, content, likes_count, comments_count, shares_count,
                   created_at, updated_at
            FROM posts
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    pub async fn insert_post(
        conn: &mut PgConnection,
        author_id: Uuid,
        content: &str,
    ) -> ServiceResult<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (author_id, content)
            VALUES ($1, $2)
            RETURNING id, author_id, content, likes_count, comments_count, shares_count,
                      created_at, updated_at
            "#,
        )
        .bind(author_id)
        .bind(content)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| ServiceError::from_write(e, format!("user {}", author_id)))
    }

    /// Load a post and hold its row lock until the transaction ends
    pub async fn lock_post(conn: &mut PgConnection, post_id: Uuid) -> ServiceResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, content, likes_count, comments_count, shares_count,
                   created_at, updated_at
            FROM posts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(post_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(post)
    }

    pub async fn update_content(
        conn: &mut PgConnection,
        post_id: Uuid,
        content: &str,
    ) -> ServiceResult<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET content = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, author_id, content, likes_count, comments_count, shares_count,
                      created_at, updated_at
            "#,
        )
        .bind(post_id)
        .bind(content)
        .fetch_optional(&mut *conn)
        .await?;

        post.ok_or_else(|| ServiceError::NotFound(format!("post {}", post_id)))
    }

    /// Delete the post row itself; dependents must already be gone
    pub async fn delete_post(conn: &mut PgConnection, post_id: Uuid) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
