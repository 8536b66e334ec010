use crate::config::Config;
use crate::notifications::NotificationCenter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// One notification session per process; torn down on shutdown.
    pub notifications: NotificationCenter,
}
