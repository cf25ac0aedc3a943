//! RepoDoctor daemon entry point.

mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;

use repodoctor_core::{Analyzer, RepoDoctorConfig};
use server::{build_router, AppState};

#[derive(Parser)]
#[command(name = "repodoctord")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "RepoDoctor HTTP daemon", long_about = None)]
struct Args {
    /// Listen address; overrides REPODOCTOR_BIND
    #[arg(long)]
    bind: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    repodoctor_core::init_tracing(args.json_logs, level);

    let config = RepoDoctorConfig::from_env();
    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; analyses will return heuristics only");
    }

    let bind = args.bind.unwrap_or_else(|| config.bind_addr.clone());
    let state = Arc::new(AppState::new(Analyzer::new(&config)));
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(%bind, version = repodoctor_core::VERSION, "repodoctord listening");

    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
