//! Flat-file persistence: one JSON array file per collection.
//!
//! Every mutation reads the whole collection, changes it and rewrites the
//! file atomically while holding that collection's lock. Unreadable files
//! load as empty collections and are reported through `warn!`; failed writes
//! surface as port storage errors.

mod atomic_io;
mod bootstrap;
mod data_store;
mod json_collection;
mod json_operation_log;
mod json_plan_repository;
mod json_product_repository;
mod json_user_repository;
mod json_visit_repository;
mod store_error;

pub use bootstrap::{
    ADMIN_DISPLAY_NAME, ADMIN_USERNAME, BootstrapError, DEFAULT_ADMIN_PASSWORD, ensure_admin,
};
pub use data_store::{
    DataStore, OPERATIONS_FILE, PLANS_FILE, PRODUCTS_FILE, USERS_FILE, VISITS_FILE,
};
pub use json_collection::{Change, JsonCollection};
pub use json_operation_log::JsonOperationLog;
pub use json_plan_repository::JsonPlanRepository;
pub use json_product_repository::JsonProductRepository;
pub use json_user_repository::JsonUserRepository;
pub use json_visit_repository::JsonVisitRepository;
pub use store_error::StoreError;
