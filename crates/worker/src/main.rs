//! Lookout worker binary.
//!
//! Configuration via .env file or environment variables:
//!   DATABASE_URL       - SQLite URL (default: sqlite:lookout.db?mode=rwc)
//!   MATRIX_HOMESERVER  - homeserver base URL (required)
//!   MATRIX_USERNAME    - bot account username (required)
//!   MATRIX_PASSWORD    - bot account password (required)
//!   OPENAI_API_KEY     - completion API key (required)
//!   OPENAI_API_URL     - completion API base URL
//!   OPENAI_MODEL       - model name (default: gpt-4o-mini)

use std::env;

use lookout_database::Database;
use matrix_client::{HomeserverConfig, MatrixClient};
use openai_summarizer::OpenAiSummarizer;
use tokio_util::sync::CancellationToken;
use tracing::info;
use worker::{Worker, WorkerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:lookout.db?mode=rwc".to_string());
    let db = Database::connect(&database_url).await?;
    db.migrate().await?;

    let client = MatrixClient::new(HomeserverConfig::from_env()?)?;
    let session = client.login().await?;
    info!("Logged in as {}", session.user_id);

    // Model selection is resolved once here and handed to the
    // summarizer; nothing reads it ad hoc later.
    let summarizer = OpenAiSummarizer::from_env()?;
    info!("Using model {}", summarizer.config().model);

    let config = WorkerConfig::new(session.user_id);
    let worker = Worker::new(db, client, summarizer, config);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down gracefully");
            signal_token.cancel();
        }
    });

    worker.run(shutdown).await;

    Ok(())
}
