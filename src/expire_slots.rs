//! One-shot slot expiry sweep for external schedulers.
//!
//! Prints `{"message", "results"}` and exits 0 on success, or
//! `{"message", "error"}` and exits 1 when the sweep fails.

use std::process::ExitCode;

use color_eyre::eyre::Result;
use dotenv::dotenv;
use serde_json::json;
use skillsession_api::{ApiState, config::ApiConfig, connect_store, jobs::expiry::run_expiry_sweep};
use skillsession_core::models::slot::ExpireSlotsResponse;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    let config = ApiConfig::from_env()?;

    // Logs go to stderr so stdout carries only the JSON result
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = connect_store(&config).await?;
    let state = ApiState::from_config(&config, store);

    match run_expiry_sweep(&state).await {
        Ok(results) => {
            let response = ExpireSlotsResponse {
                message: "Expired slots processed successfully".to_string(),
                results,
            };
            println!("{}", serde_json::to_string(&response)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Slot expiry sweep failed: {}", e);
            let response = json!({
                "message": "Error processing expired slots",
                "error": e.to_string(),
            });
            println!("{}", response);
            Ok(ExitCode::FAILURE)
        }
    }
}
