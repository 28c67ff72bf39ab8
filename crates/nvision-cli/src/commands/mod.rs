//! CLI command implementations

pub mod analyze;
pub mod doctor;
pub mod sample;
pub mod worker;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::backends::OrchestratorConfig;

/// Loads the orchestrator configuration, or the defaults if no file is given.
///
/// Bundled-worker entries without an explicit path run the current
/// executable, so an uninstalled build still finds its own worker.
pub(crate) fn load_config(path: Option<&Path>) -> Result<OrchestratorConfig> {
    let config = match path {
        Some(path) => OrchestratorConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => OrchestratorConfig::default(),
    };
    match std::env::current_exe() {
        Ok(exe) => Ok(config.worker_program(&exe)),
        Err(e) => {
            debug!(error = %e, "cannot resolve current executable, worker found via PATH");
            Ok(config)
        }
    }
}
