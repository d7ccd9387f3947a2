//! The data directory and the repositories backed by its files.

use std::sync::Arc;

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs::Dir;

use super::json_collection::JsonCollection;
use super::{
    JsonOperationLog, JsonPlanRepository, JsonProductRepository, JsonUserRepository,
    JsonVisitRepository, StoreError,
};

/// Account file.
pub const USERS_FILE: &str = "users.json";
/// Product file.
pub const PRODUCTS_FILE: &str = "products.json";
/// Plan file.
pub const PLANS_FILE: &str = "plans.json";
/// Visit file.
pub const VISITS_FILE: &str = "visits.json";
/// Operation log file.
pub const OPERATIONS_FILE: &str = "operations.json";

/// Repositories sharing one data directory.
#[derive(Clone)]
pub struct DataStore {
    /// Accounts.
    pub users: Arc<JsonUserRepository>,
    /// Products.
    pub products: Arc<JsonProductRepository>,
    /// Weekly plans.
    pub plans: Arc<JsonPlanRepository>,
    /// Visits.
    pub visits: Arc<JsonVisitRepository>,
    /// Applied operation ids.
    pub operations: Arc<JsonOperationLog>,
}

impl DataStore {
    /// Create `path` if needed and open the store inside it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] when the directory cannot be created or
    /// opened.
    pub fn open(path: &Utf8Path) -> Result<Self, StoreError> {
        let open_error = |err: std::io::Error| StoreError::Open {
            path: path.to_path_buf(),
            message: err.to_string(),
        };
        Dir::create_ambient_dir_all(path, ambient_authority()).map_err(open_error)?;
        let dir = Dir::open_ambient_dir(path, ambient_authority()).map_err(open_error)?;
        Ok(Self::in_dir(Arc::new(dir)))
    }

    /// Store rooted at an already opened directory.
    pub fn in_dir(dir: Arc<Dir>) -> Self {
        Self {
            users: Arc::new(JsonUserRepository::new(JsonCollection::new(
                Arc::clone(&dir),
                USERS_FILE,
            ))),
            products: Arc::new(JsonProductRepository::new(JsonCollection::new(
                Arc::clone(&dir),
                PRODUCTS_FILE,
            ))),
            plans: Arc::new(JsonPlanRepository::new(JsonCollection::new(
                Arc::clone(&dir),
                PLANS_FILE,
            ))),
            visits: Arc::new(JsonVisitRepository::new(JsonCollection::new(
                Arc::clone(&dir),
                VISITS_FILE,
            ))),
            operations: Arc::new(JsonOperationLog::new(JsonCollection::new(
                dir,
                OPERATIONS_FILE,
            ))),
        }
    }
}
