//! One JSON array file per collection, guarded by a single-writer lock.

use std::io;
use std::marker::PhantomData;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs::Dir;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::StoreError;
use super::atomic_io::write_atomic;

/// Result of a mutation closure: whether the collection must be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change<R> {
    /// Persist the mutated records, then return the value.
    Write(R),
    /// Leave the file untouched and return the value.
    Keep(R),
}

/// A collection of records persisted as a pretty-printed JSON array.
///
/// Reads and read-modify-write cycles both hold the collection lock, so
/// identifier assignment and uniqueness checks see every earlier write.
pub struct JsonCollection<T> {
    dir: Arc<Dir>,
    file_name: Utf8PathBuf,
    lock: Mutex<()>,
    records: PhantomData<fn() -> T>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Collection stored as `file_name` inside `dir`.
    pub fn new(dir: Arc<Dir>, file_name: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dir,
            file_name: file_name.into(),
            lock: Mutex::new(()),
            records: PhantomData,
        }
    }

    /// File backing the collection.
    pub fn file_name(&self) -> &Utf8Path {
        &self.file_name
    }

    /// Whether the backing file exists yet.
    pub fn exists(&self) -> bool {
        self.dir.exists(&self.file_name)
    }

    /// Every record. Missing or unreadable files load as empty.
    pub async fn load(&self) -> Vec<T> {
        let _guard = self.lock.lock().await;
        self.read_all().0
    }

    /// Run `mutate` over the records and persist them when it asks to.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the rewritten file cannot be stored; the
    /// on-disk collection is then unchanged.
    ///
    /// A damaged file is moved to `<file>.corrupt` before the first rewrite
    /// replaces it.
    pub async fn update<R>(
        &self,
        mutate: impl FnOnce(&mut Vec<T>) -> Change<R>,
    ) -> Result<R, StoreError> {
        let _guard = self.lock.lock().await;
        let (mut records, damaged) = self.read_all();
        match mutate(&mut records) {
            Change::Keep(value) => Ok(value),
            Change::Write(value) => {
                if damaged {
                    self.set_aside()?;
                }
                self.write_all(&records)?;
                Ok(value)
            }
        }
    }

    /// Records on disk and whether an existing file had to be ignored.
    fn read_all(&self) -> (Vec<T>, bool) {
        let text = match self.dir.read_to_string(&self.file_name) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return (Vec::new(), false),
            Err(err) => {
                warn!(file = %self.file_name, error = %err, "collection unreadable; using empty set");
                return (Vec::new(), true);
            }
        };
        match serde_json::from_str(&text) {
            Ok(records) => (records, false),
            Err(err) => {
                warn!(file = %self.file_name, error = %err, "collection corrupt; using empty set");
                (Vec::new(), true)
            }
        }
    }

    fn set_aside(&self) -> Result<(), StoreError> {
        let target = Utf8PathBuf::from(format!("{}.corrupt", self.file_name));
        match self.dir.rename(&self.file_name, &self.dir, &target) {
            Ok(()) => {
                info!(file = %self.file_name, kept_as = %target, "damaged collection set aside");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Write {
                path: self.file_name.clone(),
                message: format!("cannot keep damaged copy as {target}: {err}"),
            }),
        }
    }

    fn write_all(&self, records: &[T]) -> Result<(), StoreError> {
        let mut text =
            serde_json::to_vec_pretty(records).map_err(|err| StoreError::Encode {
                path: self.file_name.clone(),
                message: err.to_string(),
            })?;
        text.push(b'\n');
        write_atomic(&self.dir, &self.file_name, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::persistence::test_support::scratch_dir;
    use rstest::rstest;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Row {
        id: u64,
    }

    #[rstest]
    #[tokio::test]
    async fn missing_file_is_empty() {
        let (_tmp, dir) = scratch_dir();
        let rows: JsonCollection<Row> = JsonCollection::new(dir, "rows.json");

        assert!(!rows.exists());
        assert!(rows.load().await.is_empty());
    }

    #[rstest]
    #[case("")]
    #[case("{not json")]
    #[case("{\"id\": 1}")]
    #[tokio::test]
    async fn corrupt_file_is_empty(#[case] contents: &str) {
        let (_tmp, dir) = scratch_dir();
        dir.write("rows.json", contents).expect("seed");
        let rows: JsonCollection<Row> = JsonCollection::new(Arc::clone(&dir), "rows.json");

        assert!(rows.load().await.is_empty());
        assert!(!dir.exists("rows.json.corrupt"));
    }

    #[rstest]
    #[tokio::test]
    async fn corrupt_file_survives_the_next_write() {
        let (_tmp, dir) = scratch_dir();
        dir.write("rows.json", "[{\"id\": 1},").expect("seed");
        let rows: JsonCollection<Row> = JsonCollection::new(Arc::clone(&dir), "rows.json");

        rows.update(|records| {
            records.push(Row { id: 7 });
            Change::Write(())
        })
        .await
        .expect("write");
        rows.update(|records| {
            records.push(Row { id: 8 });
            Change::Write(())
        })
        .await
        .expect("second write");

        let kept = dir.read_to_string("rows.json.corrupt").expect("damaged copy");
        assert_eq!(kept, "[{\"id\": 1},");
        assert_eq!(rows.load().await, vec![Row { id: 7 }, Row { id: 8 }]);
    }

    #[rstest]
    #[tokio::test]
    async fn keep_leaves_a_corrupt_file_in_place() {
        let (_tmp, dir) = scratch_dir();
        dir.write("rows.json", "{not json").expect("seed");
        let rows: JsonCollection<Row> = JsonCollection::new(Arc::clone(&dir), "rows.json");

        rows.update(|_| Change::Keep(())).await.expect("keep");

        assert_eq!(dir.read_to_string("rows.json").expect("read"), "{not json");
        assert!(!dir.exists("rows.json.corrupt"));
    }

    #[rstest]
    #[tokio::test]
    async fn write_persists_and_keep_does_not() {
        let (_tmp, dir) = scratch_dir();
        let rows: JsonCollection<Row> = JsonCollection::new(Arc::clone(&dir), "rows.json");

        let written = rows
            .update(|records| {
                records.push(Row { id: 1 });
                Change::Write(records.len())
            })
            .await
            .expect("write");
        rows.update(|records| {
            records.push(Row { id: 2 });
            Change::Keep(())
        })
        .await
        .expect("keep");

        assert_eq!(written, 1);
        assert_eq!(rows.load().await, vec![Row { id: 1 }]);
        let text = dir.read_to_string("rows.json").expect("read");
        assert!(text.contains("\"id\": 1"), "pretty printed: {text}");
    }

    #[rstest]
    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let (_tmp, dir) = scratch_dir();
        let rows: Arc<JsonCollection<Row>> = Arc::new(JsonCollection::new(dir, "rows.json"));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let rows = Arc::clone(&rows);
                tokio::spawn(async move {
                    rows.update(|records| {
                        let id = records.iter().map(|row| row.id).max().unwrap_or(0) + 1;
                        records.push(Row { id });
                        Change::Write(id)
                    })
                    .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.expect("join").expect("update");
        }

        let ids: Vec<u64> = rows.load().await.iter().map(|row| row.id).collect();
        assert_eq!(ids, (1..=16).collect::<Vec<_>>());
    }
}
