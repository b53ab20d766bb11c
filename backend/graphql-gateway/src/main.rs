use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;

use graphql_gateway::command::Command;
use graphql_gateway::config::Config;
use graphql_gateway::identity::{HttpIdentityProvider, IdentityProvider};
use graphql_gateway::middleware::{JwtMiddleware, JwtVerifier};
use graphql_gateway::routes;
use graphql_gateway::schema::build_schema;
use social_core::config::DatabaseConfig;
use social_core::services::CounterService;
use social_core::{db, SocialService};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Structured JSON logs with span context
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,graphql_gateway=debug,social_core=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true),
        )
        .init();

    match Command::from_args(std::env::args().skip(1))? {
        Command::Serve => serve().await,
        Command::ReconcileCounters { limit } => reconcile_counters(limit).await,
    }
}

/// One-shot repair of post counters that drifted from their child rows
async fn reconcile_counters(limit: i64) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database = DatabaseConfig::from_env().context("Failed to load database configuration")?;
    let pool = db::create_pool(&database)
        .await
        .context("Failed to connect to database")?;

    let repaired = CounterService::new(pool)
        .reconcile_drifted(limit)
        .await
        .context("Counter reconciliation failed")?;

    info!(repaired, limit, "counter reconciliation finished");
    Ok(())
}

async fn serve() -> anyhow::Result<()> {
    info!("Starting GraphQL Gateway...");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(app_env = %config.app_env, "configuration loaded");

    let pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to database")?;

    if config.database.run_migrations {
        db::migrate(&pool).await.context("Failed to run migrations")?;
    }

    let verifier = JwtVerifier::new(&config.jwt.secret, config.jwt.header_prefix.clone());
    let identity: Arc<dyn IdentityProvider> =
        Arc::new(HttpIdentityProvider::new(config.identity.url.clone()));
    info!(identity_url = %config.identity.url, "identity service client initialized");

    let schema = build_schema(
        SocialService::new(pool),
        identity,
        verifier.clone(),
        &config.graphql,
    );

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    info!("GraphQL Gateway starting on http://{}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(JwtMiddleware::new(verifier.clone()))
            .wrap(Logger::default())
            .app_data(web::Data::new(schema.clone()))
            .configure(routes::configure)
    })
    .workers(config.server.workers)
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
