//! # escd — Escrow Stack Daemon and Operator CLI
//!
//! `escd serve` runs the HTTP API over either the Postgres mirror or an
//! in-memory store. `escd abandoned` is the operator sweep: it lists
//! ACTIVE projects with no writes inside the staleness window so an admin
//! can decide which ones to refund.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use esc_api::AppState;
use esc_core::Timestamp;
use esc_engine::{subscribe, Engine, ABANDONED_AFTER_DAYS, DEFAULT_REFRESH_INTERVAL};
use esc_ledger::{LedgerGateway, StubLedger};
use esc_mirror::{MemoryStore, MirrorStore, PgStore};

/// Escrow stack daemon.
#[derive(Parser, Debug)]
#[command(name = "escd", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Postgres connection string; omit to run against an in-memory
    /// store that forgets everything on exit.
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server.
    Serve {
        /// Socket address to bind.
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: SocketAddr,

        /// Bearer token granting the admin capability; omitting it
        /// disables every admin endpoint.
        #[arg(long, env = "ESC_ADMIN_TOKEN")]
        admin_token: Option<String>,
    },

    /// List ACTIVE projects with no writes in the staleness window.
    Abandoned,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = open_store(cli.database_url.as_deref()).await?;

    match cli.command {
        Commands::Serve { bind, admin_token } => serve(store, bind, admin_token).await,
        Commands::Abandoned => abandoned(store).await,
    }
}

async fn open_store(database_url: Option<&str>) -> anyhow::Result<Arc<dyn MirrorStore>> {
    match database_url {
        Some(url) => {
            let store = PgStore::connect(url).await?;
            tracing::info!("connected to postgres mirror");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("no DATABASE_URL set; using in-memory mirror store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn serve(
    store: Arc<dyn MirrorStore>,
    bind: SocketAddr,
    admin_token: Option<String>,
) -> anyhow::Result<()> {
    if admin_token.is_none() {
        tracing::warn!("no admin token configured; admin endpoints are disabled");
    }

    // TODO: swap in the real chain gateway once its RPC surface is settled.
    let ledger: Arc<dyn LedgerGateway> = Arc::new(StubLedger::new());
    let engine = Arc::new(Engine::new(store, ledger));

    // Background snapshot loop for the operator dashboard.
    let (mut snapshots, refresh) = subscribe(engine.clone(), DEFAULT_REFRESH_INTERVAL);
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snap = *snapshots.borrow();
            tracing::debug!(
                total = snap.counts.total_projects,
                active = snap.counts.active,
                open_disputes = snap.counts.open_disputes,
                "mirror snapshot"
            );
        }
    });

    let app = esc_api::app(AppState::new(engine, admin_token));

    tracing::info!("escrow API listening on {bind}");
    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;

    refresh.stop();
    Ok(())
}

async fn abandoned(store: Arc<dyn MirrorStore>) -> anyhow::Result<()> {
    let cutoff = Timestamp::now().days_ago(ABANDONED_AFTER_DAYS);
    let projects = store.abandoned_projects(cutoff).await?;

    for project in &projects {
        println!(
            "{}",
            serde_json::json!({
                "id": project.id.as_uuid(),
                "client": project.client.as_str(),
                "freelancer": project.freelancer.as_ref().map(|w| w.as_str()),
                "title": project.title,
                "updated_at": project.updated_at.to_iso8601(),
            })
        );
    }
    tracing::info!(
        count = projects.len(),
        window_days = ABANDONED_AFTER_DAYS,
        "abandoned project sweep complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["escd", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { bind, admin_token } => {
                assert_eq!(bind, "0.0.0.0:8080".parse().unwrap());
                assert!(admin_token.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_abandoned_with_db() {
        let cli =
            Cli::try_parse_from(["escd", "--database-url", "postgres://x/y", "abandoned"]).unwrap();
        assert!(matches!(cli.command, Commands::Abandoned));
        assert_eq!(cli.database_url.as_deref(), Some("postgres://x/y"));
    }
}
