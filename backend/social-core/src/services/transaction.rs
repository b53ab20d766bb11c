use crate::error::ServiceResult;
use futures::future::BoxFuture;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, warn};

/// Run `action` inside one transaction.
///
/// Commits only when `action` returns `Ok`; any `Err` rolls back every
/// write made so far. If the returned future is dropped before completion
/// (client went away), the transaction is dropped with it and PostgreSQL
/// discards the uncommitted writes.
///
/// ```ignore
/// let post = execute_mutation(&pool, "create_post", |tx| {
///     async move {
///         let post = PostRepository::insert_post(tx, author_id, &content).await?;
///         apply_delta(tx, author_id, Counter::UserPosts, 1).await?;
///         Ok(post)
///     }
///     .boxed()
/// })
/// .await?;
/// ```
#[tracing::instrument(skip(pool, action))]
pub async fn execute_mutation<T, F>(pool: &PgPool, operation: &'static str, action: F) -> ServiceResult<T>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut Transaction<'static, Postgres>) -> BoxFuture<'c, ServiceResult<T>>
        + Send,
{
    let mut tx = pool.begin().await?;

    match action(&mut tx).await {
        Ok(value) => {
            tx.commit().await?;
            debug!(operation, "mutation committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(operation, error = %rollback_err, "rollback failed");
            }
            debug!(operation, error = %err, "mutation rolled back");
            Err(err)
        }
    }
}
