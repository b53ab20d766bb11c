//! HTTP surface: GraphQL endpoint, SDL and health check

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};
use social_core::AuthenticatedUser;

use crate::schema::AppSchema;

async fn graphql_handler(
    schema: web::Data<AppSchema>,
    http_req: HttpRequest,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();

    // Set by the JWT middleware; absent for anonymous callers
    let user = http_req.extensions().get::<AuthenticatedUser>().cloned();
    if let Some(user) = user {
        request = request.data(user);
    }

    schema.execute(request).await.into()
}

/// SDL (Schema Definition Language) endpoint for client code generation
async fn schema_handler(schema: web::Data<AppSchema>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(schema.sdl())
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/graphql", web::post().to(graphql_handler))
        .route("/graphql/schema", web::get().to(schema_handler))
        .route("/health", web::get().to(health_handler));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphQLConfig;
    use crate::identity::HttpIdentityProvider;
    use crate::middleware::{Claims, JwtMiddleware, JwtVerifier};
    use crate::schema::build_schema;
    use actix_web::{test, App};
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use social_core::SocialService;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use uuid::Uuid;

    const SECRET: &str = "routes-test-secret";

    fn test_schema() -> AppSchema {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        build_schema(
            SocialService::new(pool),
            Arc::new(HttpIdentityProvider::new("http://127.0.0.1:9")),
            JwtVerifier::new(SECRET, "JWT"),
            &GraphQLConfig::default(),
        )
    }

    fn token_for(user_id: Uuid) -> String {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + 600,
            iat: now,
            email: None,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[actix_web::test]
    async fn test_health_endpoint() {
        let app = test::init_service(
            App::new()
                .wrap(JwtMiddleware::new(JwtVerifier::new(SECRET, "JWT")))
                .app_data(web::Data::new(test_schema()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "ok".as_bytes());
    }

    #[actix_web::test]
    async fn test_schema_endpoint_serves_sdl() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_schema()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/graphql/schema").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let sdl = String::from_utf8(body.to_vec()).unwrap();
        assert!(sdl.contains("type Mutation"));
    }

    #[actix_web::test]
    async fn test_token_identity_reaches_resolvers() {
        let app = test::init_service(
            App::new()
                .wrap(JwtMiddleware::new(JwtVerifier::new(SECRET, "JWT")))
                .app_data(web::Data::new(test_schema()))
                .configure(configure),
        )
        .await;

        // Blank content fails validation after authentication, before any I/O
        let payload = serde_json::json!({
            "query": r#"mutation { createPost(content: " ") { id } }"#
        });

        let anonymous = test::TestRequest::post()
            .uri("/graphql")
            .set_json(&payload)
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, anonymous).await;
        assert_eq!(body["errors"][0]["extensions"]["code"], "UNAUTHENTICATED");

        let authenticated = test::TestRequest::post()
            .uri("/graphql")
            .insert_header(("Authorization", format!("Bearer {}", token_for(Uuid::new_v4()))))
            .set_json(&payload)
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, authenticated).await;
        assert_eq!(body["errors"][0]["extensions"]["code"], "VALIDATION_ERROR");
    }
}
