mod auth;
mod config;
mod dashboard;
mod dates;
mod db;
mod errors;
mod filters;
mod handlers;
mod ingest;
mod metrics;
mod models;
mod series;
mod taxonomy;
mod tenant_store;
mod user_store;

use axum::{
    routing::{delete, get, post},
    Router,
};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::auth::{digest_password, AuthService};
use crate::config::Config;
use crate::db::Database;
use crate::ingest::LeadSourceClient;
use crate::user_store::UserStore;

/// Main entry point for the application.
///
/// Initializes logging, configuration, the database pool, the lead and
/// session caches, and the lead source HTTP client, then starts the Axum
/// server with rate limiting, CORS, and request tracing.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_dashboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Initialize database connection pool and verify the schema
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // Per-tenant canonical lead collections. Short TTL: the dashboard is
    // near-real-time and sources are cheap to re-fetch.
    let leads_cache = Cache::builder()
        .time_to_live(Duration::from_secs(config.leads_cache_ttl_secs))
        .max_capacity(1_000)
        .build();
    tracing::info!(
        "Lead cache initialized ({}s TTL)",
        config.leads_cache_ttl_secs
    );

    // Break-glass admin from the environment, if configured
    let env_admin = match (&config.admin_email, &config.admin_password) {
        (Some(email), Some(password)) => {
            tracing::info!("Environment admin account enabled");
            Some((email.clone(), digest_password(password)))
        }
        _ => None,
    };

    let auth = Arc::new(AuthService::new(
        UserStore::new(db.pool.clone()),
        Duration::from_secs(config.session_ttl_secs),
        env_admin,
    ));

    let source = Arc::new(LeadSourceClient::new(Duration::from_secs(
        config.fetch_timeout_secs,
    ))?);
    tracing::info!(
        "Lead source client initialized ({}s timeout)",
        config.fetch_timeout_secs
    );

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        db: db.pool.clone(),
        config: config.clone(),
        source,
        auth,
        leads_cache,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        // Auth
        .route("/api/v1/auth/login", post(handlers::login))
        .route("/api/v1/auth/logout", post(handlers::logout))
        .route("/api/v1/auth/me", get(handlers::me))
        // Dashboard
        .route("/api/v1/tenants", get(handlers::list_accessible_tenants))
        .route("/api/v1/dashboard/:slug", get(handlers::dashboard))
        // Back office: tenant registry
        .route(
            "/api/v1/admin/tenants",
            get(handlers::admin_list_tenants).post(handlers::admin_create_tenant),
        )
        .route(
            "/api/v1/admin/tenants/:slug",
            get(handlers::admin_get_tenant)
                .put(handlers::admin_update_tenant)
                .delete(handlers::admin_delete_tenant),
        )
        // Back office: operator accounts
        .route(
            "/api/v1/admin/users",
            get(handlers::admin_list_users).post(handlers::admin_save_user),
        )
        .route(
            "/api/v1/admin/users/:user_id",
            delete(handlers::admin_delete_user),
        )
        .route(
            "/api/v1/admin/password-suggestion",
            get(handlers::admin_password_suggestion),
        )
        .layer(
            ServiceBuilder::new()
                // Request size limit: 1MB max payload
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Health check bypasses rate limiting for platform probes
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
