//! Portal-core: Shared types, errors, and configuration
//!
//! This crate provides the foundational types used across the Portal workspace.

pub mod config;
pub mod errors;
pub mod format;
pub mod registry;
pub mod types;

pub use config::*;
pub use errors::*;
pub use registry::{NetworkGroup, NetworkRegistry};
pub use types::*;
