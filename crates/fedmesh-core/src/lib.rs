//! fedmesh Core Library
//!
//! Shared functionality for fedmesh components:
//! - Configuration resolution and hierarchy
//! - Tunnel record model shared by the publisher and the status checks
//! - Tracing initialisation
//! - Common error types

pub mod config;
pub mod error;
pub mod record;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
pub use record::{TunnelRecord, validate_node_name};
