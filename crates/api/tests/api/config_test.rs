use std::collections::HashMap;

use chrono_tz::Tz;
use pretty_assertions::assert_eq;
use skillsession_api::config::{ApiConfig, StorageBackend};
use skillsession_core::slotting::TrailingRemainder;
use tracing::Level;

fn config(pairs: &[(&str, &str)]) -> eyre::Result<ApiConfig> {
    let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    ApiConfig::from_vars(|key| vars.get(key).cloned())
}

#[test]
fn test_defaults() {
    let config = config(&[("DATABASE_URL", "postgres://localhost/skillsession")]).unwrap();

    assert_eq!(config.server_addr(), "0.0.0.0:3000");
    assert_eq!(config.storage_backend, StorageBackend::Postgres);
    assert_eq!(config.log_level, Level::INFO);
    assert_eq!(config.request_timeout, 30);
    assert_eq!(config.timezone, Tz::UTC);
    assert_eq!(config.slot_policy.slot_minutes, 60);
    assert_eq!(config.slot_policy.trailing, TrailingRemainder::Drop);
    assert_eq!(config.expiry_sweep_interval, None);
    assert_eq!(config.scan_page_size, 100);
    assert_eq!(config.tables.slots, "slots");
    assert_eq!(config.cors_origins, None);
}

#[test]
fn test_postgres_requires_database_url() {
    let err = config(&[]).unwrap_err();
    assert!(err.to_string().contains("DATABASE_URL"));

    let memory = config(&[("STORAGE_BACKEND", "memory")]).unwrap();
    assert_eq!(memory.storage_backend, StorageBackend::Memory);
    assert_eq!(memory.database_url, None);
}

#[test]
fn test_overrides() {
    let config = config(&[
        ("STORAGE_BACKEND", "memory"),
        ("API_PORT", "8080"),
        ("LOG_LEVEL", "debug"),
        ("API_CORS_ORIGINS", "http://localhost:5173, https://skillsession.app"),
        ("DEPLOYMENT_TIMEZONE", "Europe/London"),
        ("SLOT_DURATION_MINUTES", "30"),
        ("SLOT_TRAILING_REMAINDER", "reject"),
        ("EXPIRY_SWEEP_INTERVAL_SECONDS", "300"),
        ("SLOTS_TABLE", "slotdetails"),
    ])
    .unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.log_level, Level::DEBUG);
    assert_eq!(
        config.cors_origins,
        Some(vec!["http://localhost:5173".to_string(), "https://skillsession.app".to_string()])
    );
    assert_eq!(config.timezone, Tz::Europe__London);
    assert_eq!(config.slot_policy.slot_minutes, 30);
    assert_eq!(config.slot_policy.trailing, TrailingRemainder::Reject);
    assert_eq!(config.expiry_sweep_interval, Some(300));
    assert_eq!(config.tables.slots, "slotdetails");
    assert_eq!(config.tables.bookings, "bookings");
}

#[test]
fn test_invalid_values_are_errors() {
    assert!(config(&[("STORAGE_BACKEND", "memory"), ("DEPLOYMENT_TIMEZONE", "Mars/Olympus")]).is_err());
    assert!(config(&[("STORAGE_BACKEND", "memory"), ("SLOT_DURATION_MINUTES", "0")]).is_err());
    assert!(config(&[("STORAGE_BACKEND", "memory"), ("SLOT_TRAILING_REMAINDER", "round")]).is_err());
    assert!(config(&[("STORAGE_BACKEND", "memory"), ("API_PORT", "http")]).is_err());
    assert!(config(&[("STORAGE_BACKEND", "dynamo")]).is_err());
}
