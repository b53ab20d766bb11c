//! GraphQL Gateway Middleware

pub mod jwt;

pub use jwt::{Claims, JwtMiddleware, JwtVerifier, TokenError};
