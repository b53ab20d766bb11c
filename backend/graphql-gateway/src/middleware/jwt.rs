//! JWT authentication middleware for GraphQL Gateway
//!
//! A request without an `Authorization` header passes through anonymously;
//! resolvers decide whether identity is required. A header that is present
//! but malformed, or carries an invalid token, is rejected with 401.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use social_core::AuthenticatedUser;
use std::future::{ready, Ready};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued at
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token: subject is not a user id")]
    BadSubject,

    #[error("Authorization header must use Bearer or {0} scheme")]
    BadScheme(String),
}

/// HS256 token verification shared by the middleware and `verifyToken`
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    header_prefix: String,
}

impl JwtVerifier {
    pub fn new(secret: &str, header_prefix: impl Into<String>) -> Self {
        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(Validation::new(Algorithm::HS256)),
            header_prefix: header_prefix.into(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// Verify `token` and resolve its subject to a user identity
    pub fn authenticate(&self, token: &str) -> Result<(AuthenticatedUser, Claims), TokenError> {
        let claims = self.verify(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| TokenError::BadSubject)?;

        let mut user = AuthenticatedUser::new(user_id);
        if let Some(email) = &claims.email {
            user = user.with_email(email.clone());
        }
        Ok((user, claims))
    }

    /// Strip `Bearer ` or the configured prefix from a header value
    pub fn extract_token<'a>(&self, header: &'a str) -> Result<&'a str, TokenError> {
        let token = header.strip_prefix("Bearer ").or_else(|| {
            header
                .strip_prefix(self.header_prefix.as_str())
                .and_then(|rest| rest.strip_prefix(' '))
        });

        match token.map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(TokenError::BadScheme(self.header_prefix.clone())),
        }
    }
}

/// JWT authentication middleware
pub struct JwtMiddleware {
    verifier: JwtVerifier,
}

impl JwtMiddleware {
    pub fn new(verifier: JwtVerifier) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddlewareService {
            service,
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: S,
    verifier: JwtVerifier,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Skip auth for health check endpoint
        if req.path() == "/health" {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        if !req.headers().contains_key("Authorization") {
            debug!(path = %req.path(), "anonymous request");
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let auth_str = match req
            .headers()
            .get("Authorization")
            .map(|header| header.to_str())
        {
            Some(Ok(s)) => s,
            _ => {
                warn!("rejected non-ASCII Authorization header");
                return Box::pin(async move {
                    Err(actix_web::error::ErrorUnauthorized("Invalid Authorization header"))
                });
            }
        };

        let authenticated = self
            .verifier
            .extract_token(auth_str)
            .and_then(|token| self.verifier.authenticate(token));

        let (user, claims) = match authenticated {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "rejected bearer token");
                let message = e.to_string();
                return Box::pin(async move {
                    Err(actix_web::error::ErrorUnauthorized(message))
                });
            }
        };

        debug!(user_id = %user.user_id, "authenticated request");

        // Stored for downstream handlers
        req.extensions_mut().insert(user);
        req.extensions_mut().insert(claims);

        let fut = self.service.call(req);
        Box::pin(fut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test as actix_test, web, App, HttpRequest, HttpResponse};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn create_test_jwt(user_id: &str, expires_in_seconds: i64, secret: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let exp = (now + expires_in_seconds) as usize;

        let claims = Claims {
            sub: user_id.to_string(),
            exp,
            iat: now as usize,
            email: Some("test@example.com".to_string()),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => HttpResponse::Ok().body(user.user_id.to_string()),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(SECRET, "JWT")
    }

    #[actix_web::test]
    async fn test_valid_jwt_sets_identity() {
        let app = actix_test::init_service(
            App::new()
                .wrap(JwtMiddleware::new(verifier()))
                .route("/test", web::get().to(whoami)),
        )
        .await;

        let user_id = Uuid::new_v4();
        let token = create_test_jwt(&user_id.to_string(), 3600, SECRET);

        let req = actix_test::TestRequest::get()
            .uri("/test")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();

        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, user_id.to_string().as_bytes());
    }

    #[actix_web::test]
    async fn test_custom_prefix_accepted() {
        let app = actix_test::init_service(
            App::new()
                .wrap(JwtMiddleware::new(verifier()))
                .route("/test", web::get().to(whoami)),
        )
        .await;

        let user_id = Uuid::new_v4();
        let token = create_test_jwt(&user_id.to_string(), 3600, SECRET);

        let req = actix_test::TestRequest::get()
            .uri("/test")
            .insert_header(("Authorization", format!("JWT {}", token)))
            .to_request();

        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, user_id.to_string().as_bytes());
    }

    #[actix_web::test]
    async fn test_missing_authorization_header_is_anonymous() {
        let app = actix_test::init_service(
            App::new()
                .wrap(JwtMiddleware::new(verifier()))
                .route("/test", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/test").to_request();

        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, "anonymous".as_bytes());
    }

    #[actix_web::test]
    async fn test_expired_jwt_rejected() {
        let app = actix_test::init_service(
            App::new()
                .wrap(JwtMiddleware::new(verifier()))
                .route("/test", web::get().to(whoami)),
        )
        .await;

        let expired_token = create_test_jwt(&Uuid::new_v4().to_string(), -3600, SECRET);

        let req = actix_test::TestRequest::get()
            .uri("/test")
            .insert_header(("Authorization", format!("Bearer {}", expired_token)))
            .to_request();

        let err = actix_test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), 401);
    }

    #[actix_web::test]
    async fn test_wrong_secret_rejected() {
        let app = actix_test::init_service(
            App::new()
                .wrap(JwtMiddleware::new(verifier()))
                .route("/test", web::get().to(whoami)),
        )
        .await;

        let token = create_test_jwt(&Uuid::new_v4().to_string(), 3600, "other-secret");

        let req = actix_test::TestRequest::get()
            .uri("/test")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();

        let err = actix_test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), 401);
    }

    #[actix_web::test]
    async fn test_unknown_scheme_rejected() {
        let app = actix_test::init_service(
            App::new()
                .wrap(JwtMiddleware::new(verifier()))
                .route("/test", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/test")
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_request();

        let err = actix_test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), 401);
    }

    #[actix_web::test]
    async fn test_health_check_bypasses_auth() {
        let app = actix_test::init_service(
            App::new()
                .wrap(JwtMiddleware::new(verifier()))
                .route("/health", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/health")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();

        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        let token = create_test_jwt("user-123", 3600, SECRET);
        assert!(matches!(
            verifier().authenticate(&token),
            Err(TokenError::BadSubject)
        ));
    }

    #[test]
    fn test_extract_token_requires_scheme() {
        let verifier = verifier();
        assert_eq!(verifier.extract_token("Bearer abc").unwrap(), "abc");
        assert_eq!(verifier.extract_token("JWT abc").unwrap(), "abc");
        assert!(verifier.extract_token("JWTabc").is_err());
        assert!(verifier.extract_token("Bearer ").is_err());
        assert!(verifier.extract_token("abc").is_err());
    }
}
