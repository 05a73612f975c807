//! # API Configuration Module
//!
//! This module loads configuration for the SkillSession API server from
//! environment variables, providing defaults where appropriate.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: The host address to bind the server to (default: "0.0.0.0")
//! - `API_PORT`: The port to listen on (default: 3000)
//! - `STORAGE_BACKEND`: `postgres` or `memory` (default: "postgres")
//! - `DATABASE_URL`: PostgreSQL connection string (required for `postgres`)
//! - `LOG_LEVEL`: Logging level (default: "info")
//! - `API_CORS_ORIGINS`: Comma-separated list of allowed CORS origins
//! - `API_REQUEST_TIMEOUT_SECONDS`: Per-request timeout (default: 30)
//! - `DEPLOYMENT_TIMEZONE`: IANA zone used to read stored dates (default: "UTC")
//! - `SLOT_DURATION_MINUTES`: Length of generated slots (default: 60)
//! - `SLOT_TRAILING_REMAINDER`: `drop` or `reject` (default: "drop")
//! - `EXPIRY_SWEEP_INTERVAL_SECONDS`: Run the expiry sweep in-process at this
//!   interval; unset disables it
//! - `SCAN_PAGE_SIZE`: Documents read per scan page (default: 100)
//! - `AVAILABILITY_TABLE`, `SLOTS_TABLE`, `BOOKINGS_TABLE`, `LEARNERS_TABLE`,
//!   `TEACHERS_TABLE`: Collection names

use std::{env, str::FromStr, time::Duration};

use chrono_tz::Tz;
use eyre::{Result, WrapErr, eyre};
use skillsession_core::slotting::{DEFAULT_SLOT_MINUTES, SlotPolicy, TrailingRemainder};
use skillsession_db::{TableNames, memory::DEFAULT_PAGE_SIZE};
use tracing::Level;

/// Where documents are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(eyre!("unknown storage backend '{}'", other)),
        }
    }
}

/// Configuration for the SkillSession API server
///
/// # Example
///
/// ```no_run
/// use eyre::Result;
/// use skillsession_api::config::ApiConfig;
///
/// fn example() -> Result<()> {
///     let config = ApiConfig::from_env()?;
///     println!("Starting server on {}", config.server_addr());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host address for the API server (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// Port for the API server to listen on
    pub port: u16,

    pub storage_backend: StorageBackend,

    /// PostgreSQL connection string; always set when the backend is Postgres
    pub database_url: Option<String>,

    /// Log level for the application
    pub log_level: Level,

    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    pub timezone: Tz,

    pub slot_policy: SlotPolicy,

    /// Seconds between in-process expiry sweeps; `None` disables them
    pub expiry_sweep_interval: Option<u64>,

    pub scan_page_size: usize,

    pub tables: TableNames,
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - `DATABASE_URL` is not set while the storage backend is Postgres
    /// - A numeric setting cannot be parsed
    /// - `DEPLOYMENT_TIMEZONE`, `STORAGE_BACKEND` or `SLOT_TRAILING_REMAINDER`
    ///   is not a recognised value
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        // Network settings
        let host = var("API_HOST", "0.0.0.0");
        let port = var("API_PORT", "3000")
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        // Storage settings
        let storage_backend: StorageBackend = var("STORAGE_BACKEND", "postgres")
            .parse()
            .wrap_err("Invalid STORAGE_BACKEND value")?;
        let database_url = get("DATABASE_URL");
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(eyre!("DATABASE_URL environment variable must be set"));
        }
        let scan_page_size = var("SCAN_PAGE_SIZE", &DEFAULT_PAGE_SIZE.to_string())
            .parse::<usize>()
            .wrap_err("Invalid SCAN_PAGE_SIZE value")?
            .max(1);

        let defaults = TableNames::default();
        let tables = TableNames {
            availability: var("AVAILABILITY_TABLE", &defaults.availability),
            slots: var("SLOTS_TABLE", &defaults.slots),
            bookings: var("BOOKINGS_TABLE", &defaults.bookings),
            learners: var("LEARNERS_TABLE", &defaults.learners),
            teachers: var("TEACHERS_TABLE", &defaults.teachers),
        };

        // Logging settings
        let log_level = match var("LOG_LEVEL", "info").as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // CORS settings
        let cors_origins = get("API_CORS_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Performance settings
        let request_timeout = var("API_REQUEST_TIMEOUT_SECONDS", "30").parse().unwrap_or(30);

        // Scheduling settings
        let timezone: Tz = var("DEPLOYMENT_TIMEZONE", "UTC")
            .parse()
            .map_err(|e| eyre!("Invalid DEPLOYMENT_TIMEZONE value: {}", e))?;
        let slot_minutes: i64 = var("SLOT_DURATION_MINUTES", &DEFAULT_SLOT_MINUTES.to_string())
            .parse()
            .wrap_err("Invalid SLOT_DURATION_MINUTES value")?;
        if slot_minutes <= 0 {
            return Err(eyre!("SLOT_DURATION_MINUTES must be positive, got {}", slot_minutes));
        }
        let trailing: TrailingRemainder = var("SLOT_TRAILING_REMAINDER", "drop")
            .parse()
            .map_err(|e: String| eyre!(e))
            .wrap_err("Invalid SLOT_TRAILING_REMAINDER value")?;
        let expiry_sweep_interval = get("EXPIRY_SWEEP_INTERVAL_SECONDS")
            .map(|raw| raw.parse::<u64>())
            .transpose()
            .wrap_err("Invalid EXPIRY_SWEEP_INTERVAL_SECONDS value")?
            .filter(|secs| *secs > 0);

        Ok(Self {
            host,
            port,
            storage_backend,
            database_url,
            log_level,
            cors_origins,
            request_timeout,
            timezone,
            slot_policy: SlotPolicy {
                slot_minutes,
                trailing,
            },
            expiry_sweep_interval,
            scan_page_size,
            tables,
        })
    }

    /// Returns the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
