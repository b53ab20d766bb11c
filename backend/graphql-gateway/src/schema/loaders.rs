//! DataLoader implementations for N+1 query prevention
//!
//! Every `author` field on a page of posts or comments resolves through one
//! `SELECT ... WHERE id = ANY($1)` per request instead of one per row.

use async_graphql::dataloader::Loader;
use social_core::domain::models::User;
use social_core::{ServiceError, SocialService};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// User ID loader - batches author lookups
#[derive(Clone)]
pub struct UserLoader {
    service: SocialService,
}

impl UserLoader {
    pub fn new(service: SocialService) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl Loader<Uuid> for UserLoader {
    type Value = User;
    type Error = Arc<ServiceError>;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        debug!(batch = keys.len(), "loading users");

        let users = self
            .service
            .get_users_by_ids(keys)
            .await
            .map_err(Arc::new)?;

        Ok(users.into_iter().map(|user| (user.id, user)).collect())
    }
}
