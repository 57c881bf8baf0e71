//! InLands queue service library.
//!
//! Exposes config, state, error handling, the queue service and routes so
//! integration tests and the binary entrypoint share them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod queue;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
