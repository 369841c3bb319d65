//! docqa server binary
//!
//! Run with: cargo run -p docqa --bin docqa-server

use docqa::{
    config::{self, DocQaConfig},
    server::DocQaServer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(path) = config::load_env_file(None)? {
        tracing::info!("Loaded environment from {}", path.display());
    }
    let config = DocQaConfig::from_env()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Backend: {:?}", config.backend);
    tracing::info!("  - Documents: {}", config.documents.dir.display());
    tracing::info!(
        "  - Chunking: {} chars, {} overlap, page limit {:?}",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap,
        config.chunking.page_limit
    );
    tracing::info!("  - Top k: {}", config.retrieval.top_k);

    let server = DocQaServer::new(config)?;

    // Index in the background so the API is reachable during the first build
    let initial_build = server.state().pipeline().spawn_build();
    tokio::spawn(async move {
        match initial_build.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                tracing::warn!("Initial index build failed: {} (retry with POST /api/build)", e)
            }
            Err(e) => tracing::warn!("Initial index build task failed: {}", e),
        }
    });

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/build  - Build the index");
    println!("  POST /api/query  - Ask a question");
    println!("  GET  /api/status - Index status");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
