//! Domain ports: the traits outbound adapters implement.
//!
//! Each port reports failures through its own `thiserror` enum so services
//! can map adapter problems onto domain errors deliberately.

mod macros;
pub(crate) use macros::define_port_error;

mod image_store;
mod live_feed;
mod operation_log;
mod password_hasher;
mod plan_repository;
mod product_repository;
mod user_repository;
mod visit_repository;

#[cfg(test)]
pub use image_store::MockImageStore;
pub use image_store::{ImageStore, ImageStoreError};
#[cfg(test)]
pub use live_feed::MockLiveFeed;
pub use live_feed::{LiveEvent, LiveFeed, VisitNotice};
#[cfg(test)]
pub use operation_log::MockOperationLog;
pub use operation_log::{OperationLog, OperationLogError};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordCheck, PasswordHasher, PasswordHasherError};
#[cfg(test)]
pub use plan_repository::MockPlanRepository;
pub use plan_repository::{PlanRepository, PlanRepositoryError};
#[cfg(test)]
pub use product_repository::MockProductRepository;
pub use product_repository::{ProductRepository, ProductRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
#[cfg(test)]
pub use visit_repository::MockVisitRepository;
pub use visit_repository::{VisitRepository, VisitRepositoryError};
