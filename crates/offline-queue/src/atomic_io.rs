//! Atomic replacement of the queue file.
//!
//! Contents go to a hidden temporary file in the same directory which is
//! then renamed over the target, so a crash never leaves a half-written
//! queue behind.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use cap_std::fs::{Dir, OpenOptions};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `file_name` inside `dir` with `contents`.
///
/// # Errors
///
/// Returns the I/O error from creating, writing, syncing or renaming the
/// temporary file. The temporary file is removed on failure.
pub(crate) fn write_atomic(dir: &Dir, file_name: &str, contents: &[u8]) -> io::Result<()> {
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    let tmp_name = format!(
        ".{file_name}.tmp.{}.{suffix}.{counter}",
        std::process::id()
    );

    let written = write_temp_file(dir, &tmp_name, contents)
        .and_then(|()| dir.rename(&tmp_name, dir, file_name));
    if let Err(err) = written {
        drop(dir.remove_file(&tmp_name));
        return Err(err);
    }
    sync_directory(dir);
    Ok(())
}

fn write_temp_file(dir: &Dir, tmp_name: &str, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(tmp_name, &options)?;
    file.write_all(contents)?;
    file.sync_all()
}

fn sync_directory(dir: &Dir) {
    // Best-effort; the rename already happened.
    drop(dir.open(".").and_then(|handle| handle.sync_all()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use cap_std::ambient_authority;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    fn replaces_existing_contents_without_leftovers() {
        let tmp = TempDir::new().expect("temp dir");
        let dir = Dir::open_ambient_dir(tmp.path(), ambient_authority()).expect("open dir");

        write_atomic(&dir, "queue.json", b"[1]").expect("first write");
        write_atomic(&dir, "queue.json", b"[2]").expect("second write");

        assert_eq!(dir.read_to_string("queue.json").expect("read"), "[2]");
        let names: Vec<_> = dir
            .entries()
            .expect("list dir")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name())
            .collect();
        assert_eq!(names.len(), 1, "{names:?}");
    }
}
