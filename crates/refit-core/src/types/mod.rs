//! Type definitions for Refit configuration and update state

mod config_types;
mod state_types;

pub use config_types::*;
pub use state_types::*;
