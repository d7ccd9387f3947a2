//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: JSON files in the data directory, one per collection
//! - **security**: Argon2id password verifiers
//! - **live**: in-process broadcast of live events
//! - **uploads**: product images stored as files
//!
//! Adapters translate between domain types and their storage shape and hold
//! no business rules.

pub mod live;
pub mod persistence;
pub mod security;
pub mod uploads;
