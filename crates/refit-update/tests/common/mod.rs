//! Common test utilities for refit-update
//!
//! This module provides shared test infrastructure including:
//! - A temporary host layout with plugins, rollback and state locations
//! - Mock version-control and restart implementations

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
