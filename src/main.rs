//! Catalog Server - library catalog of authors and books
//!
//! `catalog-server [serve]` runs the HTTP server,
//! `catalog-server load-fixture [PATH]` replaces the catalog from a JSON file.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_server::{
    api,
    config::{AppConfig, StorageBackend},
    repository::Repository,
    AppState,
};

/// Library catalog server
#[derive(Parser, Debug)]
#[command(name = "catalog-server")]
#[command(version, about = "Library catalog server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Replace the whole catalog with the contents of a JSON fixture
    LoadFixture {
        /// Fixture file (defaults to `fixtures.path` from the configuration)
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load()?;

    init_tracing(&config);

    let repository = connect(&config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, repository).await,
        Command::LoadFixture { path } => {
            let path = path.unwrap_or_else(|| config.fixtures.path.clone());
            let state = AppState::new(config, repository);
            let summary = state.services.fixtures.load_file(&path).await?;
            println!(
                "Successfully loaded {} authors and {} books",
                summary.authors, summary.books
            );
            Ok(())
        }
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("catalog_server={},tower_http=debug", config.logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Open the configured catalog store
async fn connect(config: &AppConfig) -> anyhow::Result<Repository> {
    match config.database.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; the catalog is lost on exit");
            Ok(Repository::in_memory())
        }
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .connect(&config.database.url)
                .await?;

            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations").run(&pool).await?;

            tracing::info!("Database migrations completed");

            Ok(Repository::postgres(pool))
        }
    }
}

async fn serve(config: AppConfig, repository: Repository) -> anyhow::Result<()> {
    tracing::info!("Starting Catalog Server v{}", env!("CARGO_PKG_VERSION"));

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let state = AppState::new(config, repository);
    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
