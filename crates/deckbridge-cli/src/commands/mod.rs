//! CLI command implementations.

pub mod notify;
pub mod run;
pub mod scan;
pub mod show_config;
