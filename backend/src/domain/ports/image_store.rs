//! Port for uploaded product images.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by image store adapters.
    pub enum ImageStoreError {
        /// The requested name is not a stored image name.
        InvalidName { name } => "invalid image name: {name}",
        /// The backing directory could not be read or written.
        Storage { message } => "image store failed: {message}",
    }
}

/// Storage for uploaded images, addressed by generated file name.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `bytes` under a fresh name ending in `.{extension}` and return
    /// the name.
    async fn save(&self, bytes: Vec<u8>, extension: String) -> Result<String, ImageStoreError>;

    /// Bytes stored under `name`.
    async fn load(&self, name: String) -> Result<Option<Vec<u8>>, ImageStoreError>;
}
