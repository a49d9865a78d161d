use recap::core::config::AppConfig;
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    recap::setup_logging();

    // Missing credentials are fatal here, never during a summarization.
    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        e
    })?;

    recap::slack::run(config).await
}
