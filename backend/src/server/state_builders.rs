//! Builders for the storage adapters and the HTTP state wired onto them.

use std::io;
use std::sync::Arc;

use actix_web::web;
use chrono::Duration;
use mockable::Clock;
use tracing::{info, warn};

use medrep::domain::ports::OperationLog as _;
use medrep::inbound::http::state::{HttpState, HttpStatePorts};
use medrep::outbound::live::BroadcastLiveFeed;
use medrep::outbound::persistence::{DataStore, ensure_admin};
use medrep::outbound::security::Argon2PasswordHasher;
use medrep::outbound::uploads::DirImageStore;

use super::ServerSettings;

/// Adapters opened over the configured directories.
pub(crate) struct Storage {
    pub(crate) store: DataStore,
    pub(crate) images: DirImageStore,
}

/// Open the data and uploads directories, seed the administrator on first
/// start and prune expired operation log entries.
///
/// # Errors
///
/// Returns an I/O error when a directory cannot be opened or the
/// administrator cannot be stored.
pub(crate) async fn open_storage(
    settings: &ServerSettings,
    clock: Arc<dyn Clock>,
) -> io::Result<Storage> {
    let data_dir = settings.data_dir();
    let store = DataStore::open(&data_dir).map_err(|err| {
        io::Error::other(format!("failed to open data directory {data_dir}: {err}"))
    })?;
    let uploads_dir = settings.uploads_dir();
    let images = DirImageStore::open(&uploads_dir, Arc::clone(&clock)).map_err(|err| {
        io::Error::other(format!("failed to open uploads directory {uploads_dir}: {err}"))
    })?;

    ensure_admin(
        &store.users,
        &Argon2PasswordHasher::new(),
        settings.admin_password(),
    )
    .await
    .map_err(|err| io::Error::other(format!("failed to seed administrator: {err}")))?;

    prune_operations(&store, clock.as_ref(), settings.operation_retention()).await;
    info!(data_dir = %data_dir, uploads_dir = %uploads_dir, "storage ready");
    Ok(Storage { store, images })
}

/// Drop operation log entries older than `retention`; failures are logged.
async fn prune_operations(store: &DataStore, clock: &dyn Clock, retention: Duration) {
    let cutoff = clock.utc() - retention;
    match store.operations.prune_before(cutoff).await {
        Ok(0) => {}
        Ok(removed) => info!(removed, %cutoff, "pruned operation log"),
        Err(err) => warn!(error = %err, "failed to prune operation log"),
    }
}

/// Build the shared HTTP state over opened storage.
pub(crate) fn build_http_state(storage: &Storage, clock: Arc<dyn Clock>) -> web::Data<HttpState> {
    let Storage { store, images } = storage;
    web::Data::new(HttpState::new(HttpStatePorts {
        users: store.users.clone(),
        hasher: Arc::new(Argon2PasswordHasher::new()),
        products: store.products.clone(),
        images: Arc::new(images.clone()),
        plans: store.plans.clone(),
        visits: store.visits.clone(),
        operations: store.operations.clone(),
        live: Arc::new(BroadcastLiveFeed::default()),
        clock,
    }))
}
