//! Configuration for GraphQL Gateway
//!
//! Loads settings from environment variables, with a `.env` file as the
//! local development fallback.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use social_core::config::DatabaseConfig;
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Environment label (development, staging, production)
    pub app_env: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Social store
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Token issuance collaborator
    pub identity: IdentityConfig,

    /// GraphQL configuration
    pub graphql: GraphQLConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 verification key
    pub secret: String,
    /// Accepted in addition to `Bearer`
    pub header_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Page size when a list query omits `first`
    pub default_page_size: i64,
    /// Upper bound for `first`
    pub max_page_size: i64,
    /// Max query depth
    pub max_depth: usize,
    /// Max query complexity
    pub max_complexity: usize,
    /// Enable introspection
    pub introspection: bool,
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
            max_depth: 10,
            max_complexity: 500,
            introspection: true,
        }
    }
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parsed_or("SERVER_PORT", 8080),
                workers: parsed_or("SERVER_WORKERS", num_cpus::get()),
            },
            database: DatabaseConfig::from_env()?,
            jwt: Self::jwt_from_env()?,
            identity: IdentityConfig {
                url: env::var("IDENTITY_SERVICE_URL")
                    .unwrap_or_else(|_| "http://identity-service:8081".to_string()),
            },
            graphql: Self::graphql_from_env()?,
        })
    }

    fn jwt_from_env() -> Result<JwtConfig> {
        let secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        Ok(JwtConfig {
            secret,
            header_prefix: env::var("JWT_AUTH_HEADER_PREFIX").unwrap_or_else(|_| "JWT".to_string()),
        })
    }

    fn graphql_from_env() -> Result<GraphQLConfig> {
        let defaults = GraphQLConfig::default();
        let config = GraphQLConfig {
            default_page_size: parsed_or("GRAPHQL_DEFAULT_PAGE_SIZE", defaults.default_page_size),
            max_page_size: parsed_or("GRAPHQL_MAX_PAGE_SIZE", defaults.max_page_size),
            max_depth: parsed_or("GRAPHQL_MAX_DEPTH", defaults.max_depth),
            max_complexity: parsed_or("GRAPHQL_MAX_COMPLEXITY", defaults.max_complexity),
            introspection: parsed_or("GRAPHQL_INTROSPECTION", defaults.introspection),
        };

        if config.max_page_size < 1 {
            bail!("GRAPHQL_MAX_PAGE_SIZE must be at least 1");
        }
        if config.default_page_size < 1 || config.default_page_size > config.max_page_size {
            bail!(
                "GRAPHQL_DEFAULT_PAGE_SIZE must be between 1 and {}",
                config.max_page_size
            );
        }

        Ok(config)
    }
}
