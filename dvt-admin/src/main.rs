//! dvt-admin - researcher export panel for the drop visuals study
//!
//! Downloads the participant and response tables as CSV. The panel is
//! locked unless an admin key is configured.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

use dvt_admin::{build_router, AppState};
use dvt_common::config::{resolve_admin_key, resolve_backend_credentials, TomlConfig};
use dvt_common::store::connect_store;

#[derive(Parser, Debug)]
#[command(version, about = "Drop visuals study: export panel")]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "DVT_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides `[admin] port`)
    #[arg(short, long, env = "DVT_ADMIN_PORT")]
    port: Option<u16>,
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
        "Starting Drop Visuals Test admin (dvt-admin) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    origin.log();

    let store = connect_store(resolve_backend_credentials(&config))?;
    let admin_key = resolve_admin_key(&config);
    if admin_key.is_some() {
        info!("✓ Admin key loaded; export panel enabled");
    }

    let state = AppState::new(store, admin_key);
    let app = build_router(state);

    let port = args.port.unwrap_or_else(|| config.admin_port());
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("dvt-admin listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
