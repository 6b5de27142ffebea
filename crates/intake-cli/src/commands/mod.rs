//! CLI command implementations.

pub mod detect;
pub mod info;
pub mod run;
pub mod sheets;
pub mod templates;
