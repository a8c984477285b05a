//! Log subscriber setup

use crate::config::LoggingConfig;
use anyhow::Result;

/// Install the global fmt subscriber described by `config`
///
/// Returns `Ok(false)` when another global subscriber was installed first;
/// that one stays in effect.
pub fn init(config: &LoggingConfig) -> Result<bool> {
    let level = config.max_level()?;
    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(config.ansi)
        .with_target(false)
        .try_init()
        .is_ok();
    Ok(installed)
}
