use anyhow::Context;
use clap::{Parser, Subcommand};
use configuration::Settings;
use database::{DbRepository, InMemoryRepository, ItemRepository};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The HTTP listener's port. `GOPOS_PORT` is read into the settings but does not
/// move the listener.
const LISTEN_PORT: u16 = 8000;

/// The entry point for the POS item service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the variables may come from the real environment.
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let settings = configuration::load_settings().context("failed to load settings")?;

    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => handle_serve(args, settings).await,
        Commands::Migrate => handle_migrate(settings).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A small HTTP service for managing point-of-sale items in PostgreSQL.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Defaults to `serve` when omitted.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the database and serve the HTTP API.
    Serve(ServeArgs),
    /// Apply the embedded schema migrations and exit.
    Migrate,
}

#[derive(Parser, Default)]
struct ServeArgs {
    /// Keep items in process memory instead of PostgreSQL.
    #[arg(long)]
    in_memory: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_serve(args: ServeArgs, settings: Settings) -> anyhow::Result<()> {
    let items: Arc<dyn ItemRepository> = if args.in_memory {
        tracing::warn!("Serving from an in-memory store; items are lost on exit.");
        Arc::new(InMemoryRepository::new())
    } else {
        let pool = database::connect(&settings.database)
            .await
            .context("could not open the database")?;
        Arc::new(DbRepository::new(pool))
    };

    if settings.server.port != LISTEN_PORT {
        tracing::warn!(
            configured = settings.server.port,
            listening = LISTEN_PORT,
            "GOPOS_PORT is not applied to the HTTP listener."
        );
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], LISTEN_PORT));
    web_server::run_server(addr, items).await
}

async fn handle_migrate(settings: Settings) -> anyhow::Result<()> {
    let pool = database::connect(&settings.database)
        .await
        .context("could not open the database")?;
    database::run_migrations(&pool)
        .await
        .context("failed to apply migrations")?;
    pool.close().await;
    Ok(())
}
