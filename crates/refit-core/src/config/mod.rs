//! Configuration loading and management

mod loader;

pub use loader::{RefitConfig, CONFIG_ENV_VAR};
