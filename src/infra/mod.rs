//! Infrastructure layer: adapters for config, logging, the message store
//! and the relay endpoint.

pub mod config;
pub mod contracts;
pub mod error;
pub mod logging;
pub mod memory_store;
pub mod relay_http;
pub mod storage_layout;

/// Returns the infra module name for smoke checks.
pub fn module_name() -> &'static str {
    "infra"
}
