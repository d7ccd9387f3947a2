//! Uploaded product images stored as plain files.

use std::io::{self, Write as _};
use std::sync::Arc;

use async_trait::async_trait;
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use mockable::Clock;
use rand::Rng as _;
use rand::distributions::Alphanumeric;
use tracing::warn;

use crate::domain::ports::{ImageStore, ImageStoreError};

const NAME_MAX: usize = 128;
const SUFFIX_LEN: usize = 8;

/// Images stored in one directory under generated names.
#[derive(Clone)]
pub struct DirImageStore {
    dir: Arc<Dir>,
    clock: Arc<dyn Clock>,
}

impl DirImageStore {
    /// Create `path` if needed and store images inside it. Generated names
    /// take their timestamp from `clock`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the directory cannot be created or opened.
    pub fn open(path: &Utf8Path, clock: Arc<dyn Clock>) -> io::Result<Self> {
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self::in_dir(Arc::new(dir), clock))
    }

    /// Store rooted at an already opened directory.
    pub fn in_dir(dir: Arc<Dir>, clock: Arc<dyn Clock>) -> Self {
        Self { dir, clock }
    }
}

/// Generated names look like `p_<millis>_<suffix>.<ext>`.
fn generate_name(now: DateTime<Utc>, extension: &str) -> String {
    let millis = now.timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect();
    format!("p_{millis}_{suffix}.{extension}")
}

/// Names a client may request: a single file name, no hidden files.
fn is_servable_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= NAME_MAX
        && !name.starts_with('.')
        && name
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-'))
}

#[async_trait]
impl ImageStore for DirImageStore {
    async fn save(&self, bytes: Vec<u8>, extension: String) -> Result<String, ImageStoreError> {
        if !is_servable_name(&extension) {
            return Err(ImageStoreError::invalid_name(extension));
        }
        let name = generate_name(self.clock.utc(), &extension);
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        let mut file = self
            .dir
            .open_with(&name, &options)
            .map_err(|err| ImageStoreError::storage(err.to_string()))?;
        if let Err(err) = file.write_all(&bytes).and_then(|()| file.sync_all()) {
            drop(file);
            if let Err(cleanup) = self.dir.remove_file(&name) {
                warn!(file = %name, error = %cleanup, "failed to remove partial upload");
            }
            return Err(ImageStoreError::storage(err.to_string()));
        }
        Ok(name)
    }

    async fn load(&self, name: String) -> Result<Option<Vec<u8>>, ImageStoreError> {
        if !is_servable_name(&name) {
            return Err(ImageStoreError::invalid_name(name));
        }
        match self.dir.read(&name) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ImageStoreError::storage(err.to_string())),
        }
    }
}
