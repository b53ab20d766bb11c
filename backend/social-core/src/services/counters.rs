use crate::domain::models::PostCounterAudit;
use crate::error::{ServiceError, ServiceResult};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Denormalized counters the engine is allowed to touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    UserPosts,
    PostLikes,
    PostComments,
    PostShares,
    CommentLikes,
}

impl Counter {
    pub fn entity(self) -> &'static str {
        match self {
            Counter::UserPosts => "user",
            Counter::PostLikes | Counter::PostComments | Counter::PostShares => "post",
            Counter::CommentLikes => "comment",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Counter::UserPosts => "posts_count",
            Counter::PostLikes | Counter::CommentLikes => "likes_count",
            Counter::PostComments => "comments_count",
            Counter::PostShares => "shares_count",
        }
    }

    fn table(self) -> &'static str {
        match self {
            Counter::UserPosts => "users",
            Counter::PostLikes | Counter::PostComments | Counter::PostShares => "posts",
            Counter::CommentLikes => "comments",
        }
    }

    /// Single-statement increment; the row lock taken by UPDATE serializes
    /// concurrent writers so no delta is lost.
    fn update_sql(self) -> String {
        format!(
            "UPDATE {table} SET {column} = {column} + $2 WHERE id = $1 RETURNING {column}",
            table = self.table(),
            column = self.column()
        )
    }
}

/// Apply `delta` to `counter` on `entity_id` and return the new value.
///
/// Must run on the connection of the transaction that created or removed
/// the child row, so both commit or neither does. A missing entity is
/// `NotFound`; a result below zero trips the CHECK constraint and is
/// `CounterUnderflow`.
pub async fn apply_delta(
    conn: &mut PgConnection,
    entity_id: Uuid,
    counter: Counter,
    delta: i64,
) -> ServiceResult<i64> {
    let sql = counter.update_sql();

    let value: Option<i64> = sqlx::query_scalar(&sql)
        .bind(entity_id)
        .bind(delta)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            if ServiceError::is_check_violation(&e) {
                ServiceError::CounterUnderflow {
                    entity: counter.entity(),
                    counter: counter.column(),
                }
            } else {
                ServiceError::Database(e)
            }
        })?;

    match value {
        Some(value) => {
            debug!(
                entity = counter.entity(),
                counter = counter.column(),
                %entity_id,
                delta,
                value,
                "counter adjusted"
            );
            Ok(value)
        }
        None => Err(ServiceError::NotFound(format!(
            "{} {}",
            counter.entity(),
            entity_id
        ))),
    }
}

const DRIFTED_POSTS_SQL: &str = r#"
    SELECT p.id
    FROM posts p
    WHERE p.likes_count <> (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id)
       OR p.comments_count <> (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id)
       OR p.shares_count <> (SELECT COUNT(*) FROM post_shares s WHERE s.post_id = p.id)
    ORDER BY p.created_at ASC, p.id ASC
    LIMIT $1
"#;

/// Counter reads, plus audit and repair of post counters against live
/// child rows. Mutations never go through here; they use `apply_delta`.
#[derive(Clone)]
pub struct CounterService {
    pg_pool: PgPool,
}

impl CounterService {
    pub fn new(pg_pool: PgPool) -> Self {
        Self { pg_pool }
    }

    /// Current stored value of a counter
    pub async fn current(&self, entity_id: Uuid, counter: Counter) -> ServiceResult<i64> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            counter.column(),
            counter.table()
        );

        let value: Option<i64> = sqlx::query_scalar(&sql)
            .bind(entity_id)
            .fetch_optional(&self.pg_pool)
            .await?;

        value.ok_or_else(|| ServiceError::NotFound(format!("{} {}", counter.entity(), entity_id)))
    }

    /// Stored counters next to live row counts for one post
    pub async fn audit_post(&self, post_id: Uuid) -> ServiceResult<Option<PostCounterAudit>> {
        let audit = sqlx::query_as::<_, PostCounterAudit>(
            r#"
            SELECT p.id AS post_id,
                   p.likes_count,
                   (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS live_likes,
                   p.comments_count,
                   (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS live_comments,
                   p.shares_count,
                   (SELECT COUNT(*) FROM post_shares s WHERE s.post_id = p.id) AS live_shares
            FROM posts p
            WHERE p.id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pg_pool)
        .await?;

        Ok(audit)
    }

    /// Live number of posts authored by a user next to the stored counter
    pub async fn audit_user_posts(&self, user_id: Uuid) -> ServiceResult<Option<(i64, i64)>> {
        let row: Option<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT u.posts_count,
                   (SELECT COUNT(*) FROM posts p WHERE p.author_id = u.id)
            FROM users u
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pg_pool)
        .await?;

        Ok(row)
    }

    /// Posts whose stored counters disagree with live child rows, oldest first
    pub async fn drifted_posts(&self, limit: i64) -> ServiceResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(DRIFTED_POSTS_SQL)
            .bind(limit)
            .fetch_all(&self.pg_pool)
            .await?;

        debug!(found = ids.len(), limit, "scanned for drifted post counters");
        Ok(ids)
    }

    /// Find up to `limit` drifted posts and repair them
    pub async fn reconcile_drifted(&self, limit: i64) -> ServiceResult<u64> {
        let drifted = self.drifted_posts(limit).await?;
        self.reconcile_posts(&drifted).await
    }

    /// Rewrite drifted post counters from live rows.
    ///
    /// Rows are locked for the duration so concurrent mutations queue
    /// behind the repair instead of racing it. Returns the number of posts
    /// whose counters changed.
    pub async fn reconcile_posts(&self, post_ids: &[Uuid]) -> ServiceResult<u64> {
        if post_ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pg_pool.begin().await?;

        sqlx::query("SELECT id FROM posts WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(post_ids)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            r#"
            UPDATE posts p
            SET likes_count = live.likes,
                comments_count = live.comments,
                shares_count = live.shares
            FROM (
                SELECT p2.id,
                       (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p2.id) AS likes,
                       (SELECT COUNT(*) FROM comments c WHERE c.post_id = p2.id) AS comments,
                       (SELECT COUNT(*) FROM post_shares s WHERE s.post_id = p2.id) AS shares
                FROM posts p2
                WHERE p2.id = ANY($1)
            ) AS live
            WHERE p.id = live.id
              AND (p.likes_count <> live.likes
                   OR p.comments_count <> live.comments
                   OR p.shares_count <> live.shares)
            "#,
        )
        .bind(post_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let repaired = result.rows_affected();
        if repaired > 0 {
            warn!(repaired, requested = post_ids.len(), "post counters drifted and were repaired");
        } else {
            info!(requested = post_ids.len(), "post counters consistent");
        }

        Ok(repaired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_targets() {
        assert_eq!(Counter::UserPosts.table(), "users");
        assert_eq!(Counter::UserPosts.column(), "posts_count");
        assert_eq!(Counter::PostLikes.table(), "posts");
        assert_eq!(Counter::PostComments.column(), "comments_count");
        assert_eq!(Counter::PostShares.column(), "shares_count");
        assert_eq!(Counter::CommentLikes.table(), "comments");
        assert_eq!(Counter::CommentLikes.entity(), "comment");
    }

    #[test]
    fn test_drift_scan_compares_every_post_counter() {
        for clause in [
            "p.likes_count <> (SELECT COUNT(*) FROM post_likes",
            "p.comments_count <> (SELECT COUNT(*) FROM comments",
            "p.shares_count <> (SELECT COUNT(*) FROM post_shares",
        ] {
            assert!(DRIFTED_POSTS_SQL.contains(clause), "missing {}", clause);
        }
        assert!(DRIFTED_POSTS_SQL.trim_end().ends_with("LIMIT $1"));
    }

    #[test]
    fn test_update_is_single_atomic_statement() {
        let sql = Counter::PostLikes.update_sql();
        assert_eq!(
            sql,
            "UPDATE posts SET likes_count = likes_count + $2 WHERE id = $1 RETURNING likes_count"
        );
    }
}
