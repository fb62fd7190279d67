//! dvt-survey - participant-facing study service
//!
//! Serves the onboarding form and the drop feed, and writes participant and
//! response records to the configured backend. Without backend credentials
//! the study still runs; records are simply not saved.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};

use dvt_common::config::{resolve_backend_credentials, TomlConfig};
use dvt_common::store::connect_store;
use dvt_survey::catalog::load_catalog;
use dvt_survey::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(version, about = "Drop visuals study: participant service")]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "DVT_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides `[survey] port`)
    #[arg(short, long, env = "DVT_SURVEY_PORT")]
    port: Option<u16>,

    /// Drop catalog JSON (overrides `catalog_path`)
    #[arg(long, env = "DVT_CATALOG")]
    catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config, origin) = TomlConfig::load_with_origin(args.config.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .init();

    info!(
        "Starting Drop Visuals Test survey (dvt-survey) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    origin.log();

    let store = connect_store(resolve_backend_credentials(&config))?;

    let catalog_path = args.catalog.or(config.catalog_path.clone());
    let catalog = load_catalog(catalog_path.as_deref());
    if catalog.is_err() {
        warn!("Sessions will report \"Failed to load drops\" until restart");
    }

    let state = AppState::new(store, catalog);
    state.spawn_session_sweeper();
    let app = build_router(state);

    let port = args.port.unwrap_or_else(|| config.survey_port());
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("dvt-survey listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
