//! Durable storage of pending operations.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;

use crate::atomic_io::write_atomic;
use crate::entry::QueuedOperation;
use crate::error::QueueStoreError;

/// Storage port for the pending-operation list.
///
/// `load` returns entries in insertion order and `save` replaces the whole
/// list. Callers serialise read-modify-write cycles themselves.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Every pending operation, oldest first.
    async fn load(&self) -> Result<Vec<QueuedOperation>, QueueStoreError>;

    /// Replace the stored list with `entries`.
    async fn save(&self, entries: &[QueuedOperation]) -> Result<(), QueueStoreError>;
}

/// Queue persisted as one JSON array file.
pub struct FileQueueStore {
    dir: Dir,
    file_name: String,
    path: Utf8PathBuf,
}

impl FileQueueStore {
    /// Store the queue at `path`, creating its parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`QueueStoreError::Read`] when the path has no file name or
    /// the parent directory cannot be opened.
    pub fn open(path: &Utf8Path) -> Result<Self, QueueStoreError> {
        let read_error = |message: String| QueueStoreError::Read {
            path: path.to_path_buf(),
            message,
        };
        let file_name = path
            .file_name()
            .ok_or_else(|| read_error("queue path must name a file".to_owned()))?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        Dir::create_ambient_dir_all(parent, ambient_authority())
            .and_then(|()| Dir::open_ambient_dir(parent, ambient_authority()))
            .map(|dir| Self {
                dir,
                file_name: file_name.to_owned(),
                path: path.to_path_buf(),
            })
            .map_err(|err| read_error(err.to_string()))
    }

    /// Location of the queue file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

#[async_trait]
impl QueueStore for FileQueueStore {
    async fn load(&self) -> Result<Vec<QueuedOperation>, QueueStoreError> {
        let bytes = match self.dir.read(&self.file_name) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(QueueStoreError::Read {
                    path: self.path.clone(),
                    message: err.to_string(),
                });
            }
        };
        serde_json::from_slice(&bytes).map_err(|err| QueueStoreError::Malformed {
            path: self.path.clone(),
            message: err.to_string(),
        })
    }

    async fn save(&self, entries: &[QueuedOperation]) -> Result<(), QueueStoreError> {
        let write_error = |message: String| QueueStoreError::Write {
            path: self.path.clone(),
            message,
        };
        let contents =
            serde_json::to_vec_pretty(entries).map_err(|err| write_error(err.to_string()))?;
        write_atomic(&self.dir, &self.file_name, &contents).map_err(|err| write_error(err.to_string()))
    }
}

/// Queue kept in memory, for tests and short-lived clients.
#[derive(Clone, Default)]
pub struct MemoryQueueStore {
    entries: Arc<Mutex<Vec<QueuedOperation>>>,
}

impl MemoryQueueStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the stored entries.
    #[must_use]
    pub fn snapshot(&self) -> Vec<QueuedOperation> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn load(&self) -> Result<Vec<QueuedOperation>, QueueStoreError> {
        Ok(self.snapshot())
    }

    async fn save(&self, entries: &[QueuedOperation]) -> Result<(), QueueStoreError> {
        *self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = entries.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    fn entry(op_id: &str) -> QueuedOperation {
        QueuedOperation {
            op_id: op_id.to_owned(),
            endpoint: "/api/visits".to_owned(),
            payload: json!({
                "op_id": op_id,
                "client_ts": "2024-04-02T09:30:00.000Z",
                "date": "2024-04-02",
                "doctor": "Dr. A",
            }),
            queued_at: Utc
                .with_ymd_and_hms(2024, 4, 2, 9, 30, 0)
                .single()
                .expect("valid instant"),
        }
    }

    #[fixture]
    fn scratch() -> (TempDir, Utf8PathBuf) {
        let tmp = TempDir::new().expect("temp dir");
        let path = Utf8Path::from_path(tmp.path())
            .expect("utf-8 path")
            .join("client")
            .join("queue.json");
        (tmp, path)
    }

    #[rstest]
    #[tokio::test]
    async fn missing_file_is_an_empty_queue(scratch: (TempDir, Utf8PathBuf)) {
        let (_tmp, path) = scratch;
        let store = FileQueueStore::open(&path).expect("open");

        assert!(store.load().await.expect("load").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn entries_survive_a_reopen_verbatim(scratch: (TempDir, Utf8PathBuf)) {
        let (_tmp, path) = scratch;
        let entries = vec![entry("a"), entry("b")];
        FileQueueStore::open(&path)
            .expect("open")
            .save(&entries)
            .await
            .expect("save");

        let reopened = FileQueueStore::open(&path).expect("reopen");

        assert_eq!(reopened.load().await.expect("load"), entries);
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_files_are_reported(scratch: (TempDir, Utf8PathBuf)) {
        let (_tmp, path) = scratch;
        let store = FileQueueStore::open(&path).expect("open");
        std::fs::write(path.as_std_path(), b"{not json").expect("corrupt file");

        let err = store.load().await.expect_err("malformed");

        assert!(matches!(err, QueueStoreError::Malformed { .. }), "{err}");
    }

    #[rstest]
    #[tokio::test]
    async fn memory_store_replaces_its_contents() {
        let store = MemoryQueueStore::new();
        store.save(&[entry("a"), entry("b")]).await.expect("save");
        store.save(&[entry("b")]).await.expect("save");

        assert_eq!(store.load().await.expect("load"), vec![entry("b")]);
    }
}
