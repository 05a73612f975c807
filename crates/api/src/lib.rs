//! # SkillSession API
//!
//! The API crate provides the web server for the SkillSession tutoring
//! marketplace: tutor availability, bookable slots, booking requests and
//! learner/teacher profiles.
//!
//! ## Architecture
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Implement request processing logic
//! - **Jobs**: Background work, currently the slot expiry sweep
//! - **Middleware**: Error mapping
//! - **Config**: Environment configuration
//!
//! Every handler reaches storage through the [`DocumentStore`] held in
//! [`ApiState`], so the same router runs against Postgres or the in-memory
//! store.

/// Configuration module for API settings
pub mod config;
/// Request handlers that implement business logic
pub mod handlers;
/// Scheduled and on-demand background jobs
pub mod jobs;
/// Middleware for error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use eyre::{Result, WrapErr, eyre};
use skillsession_core::slotting::SlotPolicy;
use skillsession_db::{DocumentStore, MemoryDocumentStore, PgDocumentStore, TableNames};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use config::{ApiConfig, StorageBackend};

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    /// Document store shared by every handler and job
    pub store: Arc<dyn DocumentStore>,
    pub tables: TableNames,
    pub slot_policy: SlotPolicy,
    /// Zone in which stored dates and times are interpreted
    pub timezone: Tz,
}

impl ApiState {
    /// State with default tables, a 60 minute slot policy and UTC.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            tables: TableNames::default(),
            slot_policy: SlotPolicy::default(),
            timezone: Tz::UTC,
        }
    }

    pub fn from_config(config: &ApiConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            tables: config.tables.clone(),
            slot_policy: config.slot_policy,
            timezone: config.timezone,
        }
    }

    /// Current wall-clock time in the deployment timezone.
    pub fn local_now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.timezone).naive_local()
    }
}

/// Opens the configured storage backend, creating the Postgres schema if needed.
pub async fn connect_store(config: &ApiConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.storage_backend {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| eyre!("DATABASE_URL environment variable must be set"))?;
            let pool = skillsession_db::create_pool(url)
                .await
                .wrap_err("Failed to connect to database")?;
            skillsession_db::schema::initialize_database(&pool).await?;
            info!("Using PostgreSQL document store");
            Ok(Arc::new(PgDocumentStore::new(pool).with_page_size(config.scan_page_size)))
        }
        StorageBackend::Memory => {
            info!("Using in-memory document store; data is lost on exit");
            Ok(Arc::new(MemoryDocumentStore::with_page_size(config.scan_page_size)))
        }
    }
}

/// Builds the application router with all routes
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Availability generation
        .merge(routes::availability::routes())
        // Slot listing and expiry
        .merge(routes::slots::routes())
        // Booking requests and tutor responses
        .merge(routes::bookings::routes())
        // Learner and teacher profiles
        .merge(routes::profiles::routes())
        // Attach shared state to all routes
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .wrap_err_with(|| format!("Invalid CORS origin '{}'", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_origin(origins)
        .allow_credentials(true))
}

/// Starts the API server with the provided configuration and store
///
/// Logging must already be initialized by the caller.
///
/// # Example
///
/// ```no_run
/// # async fn run() -> eyre::Result<()> {
/// use skillsession_api::{config::ApiConfig, connect_store, start_server};
///
/// let config = ApiConfig::from_env()?;
/// let store = connect_store(&config).await?;
/// start_server(config, store).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_server(config: ApiConfig, store: Arc<dyn DocumentStore>) -> Result<()> {
    let state = Arc::new(ApiState::from_config(&config, store));

    if let Some(seconds) = config.expiry_sweep_interval {
        info!("Running slot expiry sweep every {} second(s)", seconds);
        jobs::expiry::spawn_expiry_sweeper(state.clone(), std::time::Duration::from_secs(seconds));
    }

    let app = build_router(state);

    // Apply CORS configuration if origins are specified
    let app = match &config.cors_origins {
        Some(origins) if !origins.is_empty() => app.layer(cors_layer(origins)?),
        _ => app,
    };

    // Request tracing and timeout
    let app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(config.request_timeout())),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
