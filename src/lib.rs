//! webstate library
//!
//! Exposes the CLI building blocks for integration testing

pub mod bridge;
pub mod cli;
pub mod config;

pub use bridge::{breadcrumb_for, record_navigation_breadcrumbs};
pub use config::{load_config, AppConfig, LoadedConfig};
