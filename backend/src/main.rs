//! Backend entry-point: loads settings, opens the data directory and serves
//! the HTTP API, uploads, live feed and OpenAPI docs.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig as _;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use medrep::inbound::http::health::HealthState;
use medrep::inbound::http::session_config::{BuildMode, session_settings_from_env};
use server::{ServerConfig, ServerSettings, create_server, open_storage};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let storage = open_storage(&settings, Arc::clone(&clock)).await?;

    let config = ServerConfig::new(session, &settings);
    let bind_addr = config.bind_addr();
    let health_state = web::Data::new(HealthState::new());
    let server = match create_server(health_state.clone(), config, &storage, clock) {
        Ok(server) => server,
        Err(e) => {
            error!(address = %bind_addr, error = %e, "failed to bind listener");
            return Err(e);
        }
    };
    info!(address = %bind_addr, "listening");

    server.await
}
