//! # refit-core
//!
//! Core library for the Refit plugin updater providing:
//! - Configuration file parsing (refit.yaml)
//! - Type definitions for plugins and their update state
//! - Shared path utilities

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use config::RefitConfig;
pub use error::{Error, Result};
