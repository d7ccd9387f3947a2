//! Request middleware.
//!
//! Purpose: request lifecycle concerns that sit outside the route handlers,
//! currently trace identifiers and request logging.

pub mod trace;

pub use trace::Trace;
