mod config;

use config::Config;
use downloads::{DownloadLimits, DownloadRegistry};
use server::MediaServer;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        port = config.port,
        bandwidth_limit = config.bandwidth_limit,
        max_concurrent = config.max_concurrent_downloads,
        chunk_size = config.chunk_size,
        "starting media download server"
    );

    let registry = DownloadRegistry::new(DownloadLimits {
        bandwidth_budget: config.bandwidth_limit,
        max_concurrent: config.max_concurrent_downloads,
        chunk_size: config.chunk_size,
    });

    let media_server = MediaServer::new(
        registry,
        config.media_roots(),
        config.allowed_extensions.clone(),
    );

    if let Err(e) = media_server.serve("0.0.0.0", config.port).await {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }
}
