//! Backend library modules.
//!
//! The binary in `main.rs` wires these onto an Actix server; integration
//! tests drive the same route table through [`inbound::http::configure`].

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(test)]
pub(crate) mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
