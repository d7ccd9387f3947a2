//! Domain primitives, ports and services.
//!
//! Purpose: define strongly typed entities for accounts, products, weekly
//! plans and visits, the ports outbound adapters implement, and the services
//! inbound handlers call. Services own role checks and map port failures to
//! [`Error`]; nothing in here knows about HTTP or the filesystem.
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: API error payload and its stable code.
//! - [`FieldError`]: field-level validation failure with a machine code.
//! - Entities: [`User`], [`Product`], [`Plan`], [`Visit`] and their drafts.
//! - [`SessionClaims`]: identity carried by a signed session cookie.
//! - [`IdempotentWriter`]: exactly-once application of tagged writes.
//! - Services: [`AccountService`], [`CatalogueService`], [`PlanService`],
//!   [`VisitService`], [`ReportService`].

pub mod auth;
pub mod error;
pub mod operation;
pub mod plan;
pub mod ports;
pub mod product;
pub mod report;
pub mod trace_id;
pub mod user;
pub mod validation;
pub mod visit;

mod account_service;
mod catalogue_service;
mod idempotent_writer;
mod plan_service;
mod record_id;
mod report_service;
mod visit_service;

pub use self::account_service::{AccountService, Registration, UserEdit};
pub use self::auth::{LoginCredentials, SessionClaims, password_text, require_role};
pub use self::catalogue_service::{
    CatalogueService, DEFAULT_IMAGE_EXTENSION, UPLOADS_PREFIX, decode_image, sanitize_extension,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::idempotent_writer::{
    IdempotentWriter, OperationTarget, TaggedWrite, WriteOutcome,
};
pub use self::operation::{
    OPERATION_ID_MAX, OperationId, OperationIdError, OperationKind, OperationRecord,
    PayloadHash, PayloadHashError, canonicalize_and_hash,
};
pub use self::plan::{
    DayIndex, Plan, PlanDraft, PlanDraftError, PlanId, PlanItem, PlanItemParts, WeekStart,
};
pub use self::plan_service::{PlanReceipt, PlanService};
pub use self::product::{Product, ProductDraft, ProductId};
pub use self::record_id::{Identified, next_id};
pub use self::report::{DateRange, Overview, ProductTally, UNKNOWN_PRODUCT};
pub use self::report_service::ReportService;
pub use self::trace_id::TraceId;
pub use self::user::{
    DisplayName, NewUser, Role, User, UserAccount, UserChanges, UserId, Username,
};
pub use self::validation::{FieldError, FieldErrorCode, NestedFieldError};
pub use self::visit::{Visit, VisitDraft, VisitId, VisitParts, sort_newest_first};
pub use self::visit_service::{VisitReceipt, VisitService, VisitServiceDeps};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use medrep::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
