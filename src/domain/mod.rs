//! Domain layer: core entities and business rules.

pub mod conversation_state;
pub mod events;
pub mod message;
pub mod pending_batch;
pub mod session;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
