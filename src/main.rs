use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bookshelf_api::app::{app, AppState};
use bookshelf_api::auth::JwtKeys;
use bookshelf_api::config::{self, AppConfig};
use bookshelf_api::database::memory::sample_books;
use bookshelf_api::database::{DatabaseManager, MemoryRatingStore, PgRatingStore};
use bookshelf_api::ratings::RatingStore;

#[derive(Parser)]
#[command(name = "bookshelf-api")]
#[command(about = "Book catalog API with per-user star ratings")]
#[command(version)]
struct Args {
    #[arg(long, default_value = "0.0.0.0", help = "Address to bind")]
    host: String,

    #[arg(long, help = "Port to bind (defaults to the configured API port)")]
    port: Option<u16>,

    #[arg(long, help = "Serve a sample catalog from memory instead of PostgreSQL")]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = config::config();
    tracing::info!("Starting Bookshelf API in {:?} mode", config.environment);

    let keys = JwtKeys::from_config(&config.security).context("JWT_SECRET must be set")?;
    let bind_addr = format!("{}:{}", args.host, args.port.unwrap_or(config.api.port));

    if args.in_memory {
        tracing::warn!("Using in-memory store; ratings are lost on exit");
        let store = MemoryRatingStore::with_books(sample_books());
        return serve(AppState::new(store, keys), config, &bind_addr).await;
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let result = serve(AppState::new(PgRatingStore::new(pool.clone()), keys), config, &bind_addr).await;
    DatabaseManager::close(&pool).await;
    result
}

async fn serve<S: RatingStore>(state: AppState<S>, config: &AppConfig, bind_addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Bookshelf API listening on http://{}", bind_addr);

    axum::serve(listener, app(state, config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // Never resolve so the server keeps running
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
