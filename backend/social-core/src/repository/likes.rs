use crate::error::{ServiceError, ServiceResult};
use sqlx::PgConnection;
use uuid::Uuid;

/// What a like points at. Post likes and comment likes live in separate
/// tables, each with a UNIQUE (user_id, target) constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Post(Uuid),
    Comment(Uuid),
}

impl LikeTarget {
    pub fn id(self) -> Uuid {
        match self {
            LikeTarget::Post(id) | LikeTarget::Comment(id) => id,
        }
    }

    pub fn entity(self) -> &'static str {
        match self {
            LikeTarget::Post(_) => "post",
            LikeTarget::Comment(_) => "comment",
        }
    }

    fn target_table(self) -> &'static str {
        match self {
            LikeTarget::Post(_) => "posts",
            LikeTarget::Comment(_) => "comments",
        }
    }

    fn lock_sql(self) -> String {
        format!(
            "SELECT id FROM {} WHERE id = $1 FOR NO KEY UPDATE",
            self.target_table()
        )
    }

    fn table(self) -> &'static str {
        match self {
            LikeTarget::Post(_) => "post_likes",
            LikeTarget::Comment(_) => "comment_likes",
        }
    }

    fn target_column(self) -> &'static str {
        match self {
            LikeTarget::Post(_) => "post_id",
            LikeTarget::Comment(_) => "comment_id",
        }
    }
}

/// Repository for like rows; every call runs on the caller's transaction
pub struct LikeRepository;

impl LikeRepository {
    /// Lock the liked post or comment row; `false` when it does not exist.
    ///
    /// Taken before any like row is touched, so like/unlike acquire locks
    /// parent first, the same order as post deletion.
    pub async fn lock_target(conn: &mut PgConnection, target: LikeTarget) -> ServiceResult<bool> {
        let sql = target.lock_sql();

        let locked: Option<Uuid> = sqlx::query_scalar(&sql)
            .bind(target.id())
            .fetch_optional(&mut *conn)
            .await?;

        Ok(locked.is_some())
    }

    /// Check if user has liked the target
    pub async fn check_user_liked(
        conn: &mut PgConnection,
        user_id: Uuid,
        target: LikeTarget,
    ) -> ServiceResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = $1 AND {} = $2)",
            target.table(),
            target.target_column()
        );

        let exists: bool = sqlx::query_scalar(&sql)
            .bind(user_id)
            .bind(target.id())
            .fetch_one(&mut *conn)
            .await?;

        Ok(exists)
    }

    /// Insert the like unless the pair already exists.
    ///
    /// Returns `false` when another transaction got there first; a racing
    /// insert blocks on the unique index until that transaction settles.
    pub async fn insert_like(
        conn: &mut PgConnection,
        user_id: Uuid,
        target: LikeTarget,
    ) -> ServiceResult<bool> {
        let sql = format!(
            "INSERT INTO {table} (user_id, {column}) VALUES ($1, $2) \
             ON CONFLICT (user_id, {column}) DO NOTHING \
             RETURNING id",
            table = target.table(),
            column = target.target_column()
        );

        let inserted: Option<Uuid> = sqlx::query_scalar(&sql)
            .bind(user_id)
            .bind(target.id())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| ServiceError::from_write(e, format!("{} {}", target.entity(), target.id())))?;

        Ok(inserted.is_some())
    }

    /// Remove the like; `false` when there was nothing to remove
    pub async fn delete_like(
        conn: &mut PgConnection,
        user_id: Uuid,
        target: LikeTarget,
    ) -> ServiceResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE user_id = $1 AND {} = $2",
            target.table(),
            target.target_column()
        );

        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(target.id())
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fan-out step of post deletion: likes on the post itself
    pub async fn delete_post_likes(conn: &mut PgConnection, post_id: Uuid) -> ServiceResult<u64> {
        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Fan-out step of post deletion: likes on the post's comments
    pub async fn delete_comment_likes_for_post(
        conn: &mut PgConnection,
        post_id: Uuid,
    ) -> ServiceResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM comment_likes
            WHERE comment_id IN (SELECT id FROM comments WHERE post_id = $1)
            "#,
        )
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }
}
