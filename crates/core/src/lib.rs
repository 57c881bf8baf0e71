//! Domain types and pure logic for the InLands job relay.
//!
//! Shared by the queue service (`inlands-api`) and the worker
//! (`inlands-agent`). Has no internal dependencies.

pub mod error;
pub mod job;
pub mod log;
pub mod project;
pub mod prompt;
pub mod protocol;
pub mod stability;
pub mod status;
pub mod types;
pub mod validation;
