// In-app notifications: ordered store, timed lifecycle with hover-pause,
// read-only presentation, and the center that ties them together.
// Timers go through the Scheduler trait so tests can drive a simulated clock.

pub mod center;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod presenter;
pub mod scheduler;
pub mod store;

use thiserror::Error;

pub use center::{CenterOptions, NotificationCenter};
pub use scheduler::TokioScheduler;

/// Errors surfaced to callers of the notification API. Everything else
/// (stale timers, repeated removals) resolves to a silent no-op.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Invalid notification spec: {0}")]
    InvalidSpec(String),
}
