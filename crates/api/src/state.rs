use std::sync::Arc;

use crate::config::ServerConfig;
use crate::queue::QueueService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Queues, projects and logs.
    pub queue: Arc<QueueService>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
