//! Use case layer: application workflows and orchestration.

pub mod batching;
pub mod bootstrap;
pub mod chat_session;
pub mod context;
pub mod contracts;
pub mod quiet_timer;
pub mod realtime_sync;
pub mod subscription;

/// Returns the usecases module name for smoke checks.
pub fn module_name() -> &'static str {
    "usecases"
}
