//! Whole-file replacement via temp file, fsync and rename.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Component, Utf8Path};
use cap_std::fs::{Dir, OpenOptions};

use super::StoreError;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `file_name` inside `dir` with `contents`.
///
/// A hidden temporary sibling is written and synced first, then renamed over
/// the target, so readers observe either the old or the new file.
///
/// # Errors
///
/// Returns [`StoreError::Write`] when `file_name` is not a bare file name or
/// any filesystem step fails.
pub(crate) fn write_atomic(
    dir: &Dir,
    file_name: &Utf8Path,
    contents: &[u8],
) -> Result<(), StoreError> {
    let mut components = file_name.components();
    let (Some(Utf8Component::Normal(name)), None) = (components.next(), components.next()) else {
        return Err(write_error(file_name, "collection path must be a bare file name"));
    };
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    let tmp_name = format!(".{name}.tmp.{}.{stamp}.{counter}", std::process::id());

    write_temp(dir, &tmp_name, contents).map_err(|err| {
        discard(dir, &tmp_name);
        write_error(file_name, err)
    })?;
    rename(dir, &tmp_name, name).map_err(|err| {
        discard(dir, &tmp_name);
        write_error(file_name, err)
    })?;
    sync_directory(dir);
    Ok(())
}

fn write_temp(dir: &Dir, tmp_name: &str, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(tmp_name, &options)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(windows)]
fn rename(dir: &Dir, tmp_name: &str, target: &str) -> io::Result<()> {
    match dir.remove_file(target) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    dir.rename(tmp_name, dir, target)
}

#[cfg(not(windows))]
fn rename(dir: &Dir, tmp_name: &str, target: &str) -> io::Result<()> {
    dir.rename(tmp_name, dir, target)
}

fn discard(dir: &Dir, tmp_name: &str) {
    if dir.remove_file(tmp_name).is_err() {
        // Already gone or never created.
    }
}

fn sync_directory(dir: &Dir) {
    if dir.open(".").and_then(|handle| handle.sync_all()).is_err() {
        // Best effort; not every platform can sync a directory handle.
    }
}

fn write_error(path: &Utf8Path, err: impl ToString) -> StoreError {
    StoreError::Write {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
