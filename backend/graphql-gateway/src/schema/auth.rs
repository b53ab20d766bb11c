//! Authentication schema and resolvers

use async_graphql::{Context, Object, Result as GraphQLResult, SimpleObject, ID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::errors::{unauthenticated, IntoGraphQLResult};
use crate::identity::{IdentityProvider, IssuedToken};
use crate::middleware::JwtVerifier;

#[derive(SimpleObject, Clone, Debug, Serialize, Deserialize)]
pub struct TokenPayload {
    pub token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

impl From<IssuedToken> for TokenPayload {
    fn from(issued: IssuedToken) -> Self {
        TokenPayload {
            token: issued.token,
            refresh_token: issued.refresh_token,
            expires_in: issued.expires_in,
        }
    }
}

#[derive(SimpleObject, Clone, Debug, Serialize, Deserialize)]
pub struct VerifyPayload {
    pub user_id: ID,
    pub email: Option<String>,
    pub expires_at: String,
}

#[derive(Default)]
pub struct AuthQuery;

#[Object]
impl AuthQuery {
    async fn health(&self) -> &str {
        "ok"
    }
}

#[derive(Default)]
pub struct AuthMutation;

#[Object]
impl AuthMutation {
    /// Exchange credentials for a token pair
    async fn token_auth(
        &self,
        ctx: &Context<'_>,
        email: String,
        password: String,
    ) -> GraphQLResult<TokenPayload> {
        let identity = ctx.data::<Arc<dyn IdentityProvider>>()?;

        identity
            .token_auth(&email, &password)
            .await
            .map(TokenPayload::from)
            .into_gql()
    }

    async fn refresh_token(
        &self,
        ctx: &Context<'_>,
        refresh_token: String,
    ) -> GraphQLResult<TokenPayload> {
        let identity = ctx.data::<Arc<dyn IdentityProvider>>()?;

        identity
            .refresh_token(&refresh_token)
            .await
            .map(TokenPayload::from)
            .into_gql()
    }

    /// Check a token against the shared key without calling out
    async fn verify_token(&self, ctx: &Context<'_>, token: String) -> GraphQLResult<VerifyPayload> {
        let verifier = ctx.data::<JwtVerifier>()?;

        let (user, claims) = verifier.authenticate(&token).map_err(|e| {
            warn!(error = %e, "verifyToken rejected");
            unauthenticated(e.to_string())
        })?;

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| claims.exp.to_string());

        Ok(VerifyPayload {
            user_id: ID::from(user.user_id.to_string()),
            email: user.email,
            expires_at,
        })
    }
}
