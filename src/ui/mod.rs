//! UI layer: the line-oriented chat shell and its transcript rendering.

pub mod input_source;
pub mod shell;
pub mod transcript;

/// Returns the UI module name for smoke checks.
pub fn module_name() -> &'static str {
    "ui"
}
