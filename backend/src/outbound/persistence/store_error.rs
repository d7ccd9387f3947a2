//! Errors raised by the flat-file store.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Failure writing or opening a collection file.
///
/// Read failures never surface here: unreadable files load as empty
/// collections and are reported through `warn!`. A damaged file that cannot
/// be set aside before a rewrite is reported as [`StoreError::Write`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The data directory could not be created or opened.
    #[error("failed to open data directory {path}: {message}")]
    Open {
        /// Directory path.
        path: Utf8PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// Records could not be serialised.
    #[error("failed to encode {path}: {message}")]
    Encode {
        /// Collection file.
        path: Utf8PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// The collection file could not be replaced.
    #[error("failed to write {path}: {message}")]
    Write {
        /// File being written.
        path: Utf8PathBuf,
        /// Underlying error text.
        message: String,
    },
}
