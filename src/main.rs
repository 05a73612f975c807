use color_eyre::eyre::Result;
use dotenv::dotenv;
use skillsession_api::{config::ApiConfig, connect_store};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = ApiConfig::from_env()?;

    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Open the document store
    let store = connect_store(&config).await?;

    // Start API server
    skillsession_api::start_server(config, store).await?;

    Ok(())
}
