//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! HTTP handlers, including the server-sent live feed, live under [`http`].

pub mod http;
