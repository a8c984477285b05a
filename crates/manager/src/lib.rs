//! Breakpoint Manager - the public face of breakpoint management
//!
//! Ties the core store and resolver to a marker store and its change feed:
//! - [`BreakpointManager`]: startup scan, change-feed attachment, registry operations
//! - [`ManagerConfig`]: TOML configuration with defaults for every field
//! - [`ConfiguredCapabilities`]: breakpoint kinds declared in configuration
//! - [`logging::init`]: tracing subscriber setup

pub mod capabilities;
pub mod config;
pub mod logging;
pub mod manager;

pub use capabilities::ConfiguredCapabilities;
pub use config::{BreakpointTypeConfig, LoggingConfig, ManagerConfig};
pub use manager::{BreakpointManager, ManagerStats};
