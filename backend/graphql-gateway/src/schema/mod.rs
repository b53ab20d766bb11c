//! GraphQL schema
//!
//! Resolvers stay thin: arguments are parsed, the caller identity is taken
//! from request data, and the work is handed to `social_core`.

pub mod auth;
pub mod content;
pub mod errors;
pub mod loaders;
pub mod social;
pub mod user;

use async_graphql::{dataloader::DataLoader, Context, EmptySubscription, MergedObject, Schema};
use social_core::{
    AuthenticatedUser, FeedMutation, MutationHandler, MutationOutcome, ServiceError, SocialService,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::GraphQLConfig;
use crate::identity::IdentityProvider;
use crate::middleware::JwtVerifier;
use errors::{service_error, IntoGraphQLResult};

/// Root query object
#[derive(MergedObject, Default)]
pub struct QueryRoot(content::ContentQuery, user::UserQuery, auth::AuthQuery);

/// Root mutation object
#[derive(MergedObject, Default)]
pub struct MutationRoot(content::ContentMutation, social::SocialMutation, auth::AuthMutation);

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// List size policy for `first` arguments
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl PageLimits {
    pub fn clamp(&self, first: Option<i32>) -> i64 {
        first
            .map(i64::from)
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }
}

impl From<&GraphQLConfig> for PageLimits {
    fn from(config: &GraphQLConfig) -> Self {
        Self {
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }
}

pub fn build_schema(
    service: SocialService,
    identity: Arc<dyn IdentityProvider>,
    verifier: JwtVerifier,
    config: &GraphQLConfig,
) -> AppSchema {
    let mut builder = Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(DataLoader::new(
        loaders::UserLoader::new(service.clone()),
        tokio::task::spawn,
    ))
    .data(service)
    .data(identity)
    .data(verifier)
    .data(PageLimits::from(config))
    .limit_depth(config.max_depth)
    .limit_complexity(config.max_complexity);

    if !config.introspection {
        builder = builder.disable_introspection();
    }

    builder.finish()
}

/// Route a mutation through the social core as the request's caller
pub(crate) async fn dispatch(
    ctx: &Context<'_>,
    mutation: FeedMutation,
) -> async_graphql::Result<MutationOutcome> {
    let service = ctx.data::<SocialService>()?;
    service
        .dispatch(ctx.data_opt::<AuthenticatedUser>(), mutation)
        .await
        .into_gql()
}

pub(crate) async fn load_author(ctx: &Context<'_>, author_id: Uuid) -> async_graphql::Result<user::User> {
    let loader = ctx.data::<DataLoader<loaders::UserLoader>>()?;

    loader
        .load_one(author_id)
        .await
        .map_err(|e| service_error(&e))?
        .map(user::User::from)
        .ok_or_else(|| service_error(&ServiceError::NotFound(format!("user {}", author_id))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdentityError, IssuedToken};
    use async_graphql::{Request, Value};
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use sqlx::postgres::PgPoolOptions;

    const SECRET: &str = "schema-test-secret";

    struct StubIdentity;

    #[async_trait::async_trait]
    impl IdentityProvider for StubIdentity {
        async fn token_auth(&self, email: &str, password: &str) -> Result<IssuedToken, IdentityError> {
            if email == "anna@example.com" && password == "hunter2" {
                Ok(IssuedToken {
                    token: "access".to_string(),
                    refresh_token: "refresh".to_string(),
                    expires_in: 300,
                })
            } else {
                Err(IdentityError::InvalidCredentials)
            }
        }

        async fn refresh_token(&self, _refresh_token: &str) -> Result<IssuedToken, IdentityError> {
            Err(IdentityError::Unavailable("offline".to_string()))
        }
    }

    fn test_schema() -> AppSchema {
        // Never connects: the queries below fail or finish before any I/O
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        build_schema(
            SocialService::new(pool),
            Arc::new(StubIdentity),
            JwtVerifier::new(SECRET, "JWT"),
            &GraphQLConfig::default(),
        )
    }

    fn first_error_code(response: &async_graphql::Response) -> Option<Value> {
        response
            .errors
            .first()
            .and_then(|e| e.extensions.as_ref())
            .and_then(|ext| ext.get("code").cloned())
    }

    #[tokio::test]
    async fn test_schema_builds() {
        let sdl = test_schema().sdl();
        assert!(sdl.contains("type Query"));
        assert!(sdl.contains("likePost(postId: ID!): LikePayload!"));
        assert!(sdl.contains("unlikeComment(commentId: ID!): LikePayload!"));
        assert!(sdl.contains("tokenAuth(email: String!, password: String!): TokenPayload!"));
        assert!(sdl.contains("sharesCount: Int!"));
    }

    #[tokio::test]
    async fn test_health_query() {
        let result = test_schema().execute("{ health }").await;

        assert!(result.errors.is_empty());
        assert_eq!(result.data.to_string(), r#"{health: "ok"}"#);
    }

    #[tokio::test]
    async fn test_anonymous_create_post_is_unauthenticated() {
        let response = test_schema()
            .execute(r#"mutation { createPost(content: "hi") { id } }"#)
            .await;

        assert_eq!(first_error_code(&response), Some(Value::from("UNAUTHENTICATED")));
    }

    #[tokio::test]
    async fn test_anonymous_me_is_unauthenticated() {
        let response = test_schema().execute("{ me { id } }").await;
        assert_eq!(first_error_code(&response), Some(Value::from("UNAUTHENTICATED")));
    }

    #[tokio::test]
    async fn test_blank_content_is_validation_error() {
        let request = Request::new(r#"mutation { createPost(content: "  ") { id } }"#)
            .data(AuthenticatedUser::new(Uuid::new_v4()));
        let response = test_schema().execute(request).await;

        assert_eq!(first_error_code(&response), Some(Value::from("VALIDATION_ERROR")));
    }

    #[tokio::test]
    async fn test_malformed_id_is_validation_error() {
        let request = Request::new(r#"mutation { likePost(postId: "nope") { ok } }"#)
            .data(AuthenticatedUser::new(Uuid::new_v4()));
        let response = test_schema().execute(request).await;

        assert_eq!(first_error_code(&response), Some(Value::from("VALIDATION_ERROR")));
    }

    #[tokio::test]
    async fn test_token_auth_delegates_to_identity_service() {
        let response = test_schema()
            .execute(
                r#"mutation { tokenAuth(email: "anna@example.com", password: "hunter2") { token refreshToken expiresIn } }"#,
            )
            .await;

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.to_string(),
            r#"{tokenAuth: {token: "access", refreshToken: "refresh", expiresIn: 300}}"#
        );
    }

    #[tokio::test]
    async fn test_token_auth_bad_credentials() {
        let response = test_schema()
            .execute(r#"mutation { tokenAuth(email: "anna@example.com", password: "nope") { token } }"#)
            .await;

        assert_eq!(first_error_code(&response), Some(Value::from("UNAUTHENTICATED")));
    }

    #[tokio::test]
    async fn test_refresh_failure_is_masked() {
        let response = test_schema()
            .execute(r#"mutation { refreshToken(refreshToken: "r") { token } }"#)
            .await;

        assert_eq!(first_error_code(&response), Some(Value::from("INTERNAL")));
        assert_eq!(response.errors[0].message, "Internal server error");
    }

    #[tokio::test]
    async fn test_verify_token() {
        let user_id = Uuid::new_v4();
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = crate::middleware::Claims {
            sub: user_id.to_string(),
            exp: now + 600,
            iat: now,
            email: Some("anna@example.com".to_string()),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let query = format!(r#"mutation {{ verifyToken(token: "{}") {{ userId email }} }}"#, token);
        let response = test_schema().execute(query).await;

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.to_string(),
            format!(r#"{{verifyToken: {{userId: "{}", email: "anna@example.com"}}}}"#, user_id)
        );

        let response = test_schema()
            .execute(r#"mutation { verifyToken(token: "garbage") { userId } }"#)
            .await;
        assert_eq!(first_error_code(&response), Some(Value::from("UNAUTHENTICATED")));
    }

    #[test]
    fn test_page_limits_clamp() {
        let limits = PageLimits {
            default_page_size: 20,
            max_page_size: 100,
        };
        assert_eq!(limits.clamp(None), 20);
        assert_eq!(limits.clamp(Some(0)), 1);
        assert_eq!(limits.clamp(Some(-5)), 1);
        assert_eq!(limits.clamp(Some(50)), 50);
        assert_eq!(limits.clamp(Some(5_000)), 100);
    }
}
