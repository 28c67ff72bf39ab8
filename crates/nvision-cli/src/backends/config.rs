//! Orchestrator configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use nvision_backend_process::{ExternalConfig, ExternalProcessBackend};
use nvision_engine::{
    InProcessBackend, SampleProfile, SyntheticBackend, DEFAULT_SAMPLE_SEED, IN_PROCESS_ID,
    SYNTHETIC_ID,
};
use nvision_spec::{CodedError, DetectionBackend, DEFAULT_MAX_OUTPUT_BYTES};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Id of the bundled `nvision worker` backend in the default ordering.
pub const WORKER_ID: &str = "worker";

/// Base of the automatic timeout.
const AUTO_TIMEOUT_BASE_SECS: u64 = 5;
/// Cells per extra second of automatic timeout.
const AUTO_TIMEOUT_CELLS_PER_SEC: usize = 100_000;
/// Upper bound of the automatic timeout.
const AUTO_TIMEOUT_MAX_SECS: u64 = 60;

/// Timeout used when none is configured: 5 s plus 1 s per 100 000 cells,
/// capped at 60 s.
pub fn auto_timeout(cells: usize) -> Duration {
    let extra = (cells / AUTO_TIMEOUT_CELLS_PER_SEC) as u64;
    Duration::from_secs((AUTO_TIMEOUT_BASE_SECS + extra).min(AUTO_TIMEOUT_MAX_SECS))
}

fn default_in_process_id() -> String {
    IN_PROCESS_ID.to_string()
}

fn default_synthetic_id() -> String {
    SYNTHETIC_ID.to_string()
}

fn default_seed() -> u32 {
    DEFAULT_SAMPLE_SEED
}

/// One backend candidate, in the order it should be tried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendSpec {
    /// A separate program speaking the file protocol.
    External(ExternalConfig),
    /// The engine in the current process.
    InProcess {
        #[serde(default = "default_in_process_id")]
        id: String,
    },
    /// The engine on generated sample data.
    Synthetic {
        #[serde(default = "default_synthetic_id")]
        id: String,
        #[serde(default = "default_seed")]
        seed: u32,
        #[serde(default)]
        profile: SampleProfile,
    },
}

impl BackendSpec {
    /// The in-process backend with its default id.
    pub fn in_process() -> Self {
        BackendSpec::InProcess {
            id: default_in_process_id(),
        }
    }

    /// The synthetic backend with its default id.
    pub fn synthetic(seed: u32, profile: SampleProfile) -> Self {
        BackendSpec::Synthetic {
            id: default_synthetic_id(),
            seed,
            profile,
        }
    }

    /// Backend id reported in outcomes.
    pub fn id(&self) -> &str {
        match self {
            BackendSpec::External(config) => &config.id,
            BackendSpec::InProcess { id } => id,
            BackendSpec::Synthetic { id, .. } => id,
        }
    }

    /// Instantiates the backend.
    pub fn build(&self) -> Box<dyn DetectionBackend> {
        match self {
            BackendSpec::External(config) => Box::new(ExternalProcessBackend::new(config.clone())),
            BackendSpec::InProcess { id } => Box::new(InProcessBackend::with_id(id.clone())),
            BackendSpec::Synthetic { id, seed, profile } => {
                Box::new(SyntheticBackend::new(*seed, *profile).with_id(id.clone()))
            }
        }
    }
}

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid configuration.
    #[error("Failed to parse config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The configuration names no backends.
    #[error("Config '{path}' lists no backends")]
    NoBackends { path: PathBuf },
}

impl CodedError for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "CONFIG_001",
            ConfigError::Parse { .. } => "CONFIG_002",
            ConfigError::NoBackends { .. } => "CONFIG_003",
        }
    }

    fn category(&self) -> &'static str {
        "config"
    }
}

/// Configuration for the backend orchestrator.
///
/// Every field has a default, so `{}` is a valid configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Backend candidates, most preferred first.
    pub backends: Vec<BackendSpec>,
    /// Per-backend timeout in seconds. Derived from the grid size if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Capture limit for each output stream of an external backend.
    pub max_output_bytes: usize,
    /// Directory for the image and result artifacts. Nothing is stored if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_dir: Option<PathBuf>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            backends: vec![
                BackendSpec::External(ExternalConfig::bundled_worker(WORKER_ID)),
                BackendSpec::in_process(),
                BackendSpec::synthetic(DEFAULT_SAMPLE_SEED, SampleProfile::Fallback),
            ],
            timeout_secs: None,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            artifact_dir: None,
        }
    }
}

impl OrchestratorConfig {
    /// Loads a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        if config.backends.is_empty() {
            return Err(ConfigError::NoBackends {
                path: path.to_path_buf(),
            });
        }
        Ok(config)
    }

    /// Sets the backend candidates.
    pub fn backends(mut self, backends: Vec<BackendSpec>) -> Self {
        self.backends = backends;
        self
    }

    /// Sets the per-backend timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Sets the output capture limit.
    pub fn max_output_bytes(mut self, limit: usize) -> Self {
        self.max_output_bytes = limit;
        self
    }

    /// Sets the artifact directory.
    pub fn artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    /// Points bundled-worker entries that have no explicit path at `exe`.
    ///
    /// Entries whose override variable is set in the environment are left
    /// alone so the override still wins.
    pub fn worker_program(mut self, exe: &Path) -> Self {
        for spec in &mut self.backends {
            let BackendSpec::External(external) = spec else {
                continue;
            };
            let overridden = external
                .env_var
                .as_deref()
                .is_some_and(|var| std::env::var_os(var).is_some());
            if external.is_bundled_worker() && external.program_path.is_none() && !overridden {
                external.program_path = Some(exe.to_path_buf());
            }
        }
        self
    }

    /// Instantiates every configured backend, in order.
    pub fn build_backends(&self) -> Vec<Box<dyn DetectionBackend>> {
        self.backends.iter().map(BackendSpec::build).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nvision_spec::BackendKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_ordering() {
        let config = OrchestratorConfig::default();
        let ids: Vec<&str> = config.backends.iter().map(BackendSpec::id).collect();
        assert_eq!(ids, vec!["worker", "in_process", "synthetic"]);

        let kinds: Vec<BackendKind> = config.build_backends().iter().map(|b| b.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                BackendKind::ExternalProcess,
                BackendKind::InProcess,
                BackendKind::Synthetic
            ]
        );
    }

    #[test]
    fn test_auto_timeout() {
        assert_eq!(auto_timeout(100 * 100), Duration::from_secs(5));
        assert_eq!(auto_timeout(250_000), Duration::from_secs(7));
        assert_eq!(auto_timeout(100_000_000), Duration::from_secs(60));
    }

    #[test]
    fn test_worker_program_fills_bundled_worker_only() {
        let exe = Path::new("/opt/nvision/bin/nvision");
        let config = OrchestratorConfig::default()
            .backends(vec![
                BackendSpec::External(ExternalConfig::bundled_worker("worker").env_var(None)),
                BackendSpec::External(
                    ExternalConfig::bundled_worker("pinned")
                        .env_var(None)
                        .program_path("/usr/local/bin/nvision"),
                ),
                BackendSpec::External(ExternalConfig::new("scipy", "python3").env_var(None)),
                BackendSpec::in_process(),
            ])
            .worker_program(exe);

        let paths: Vec<Option<PathBuf>> = config
            .backends
            .iter()
            .filter_map(|spec| match spec {
                BackendSpec::External(external) => Some(external.program_path.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            paths,
            vec![
                Some(exe.to_path_buf()),
                Some(PathBuf::from("/usr/local/bin/nvision")),
                None
            ]
        );
    }

    #[test]
    fn test_empty_object_is_default() {
        let config: OrchestratorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, OrchestratorConfig::default());
    }

    #[test]
    fn test_parse_backend_list() {
        let json = r#"{
            "backends": [
                { "type": "external", "id": "scipy", "program": "python3",
                  "args": ["detect_nv.py"], "probe_args": ["-c", "import scipy"] },
                { "type": "in_process" },
                { "type": "synthetic", "seed": 7, "profile": "demo" }
            ],
            "timeout_secs": 12,
            "artifact_dir": "out"
        }"#;
        let config: OrchestratorConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.backends.len(), 3);
        assert_eq!(config.backends[0].id(), "scipy");
        assert_eq!(config.backends[1], BackendSpec::in_process());
        assert_eq!(
            config.backends[2],
            BackendSpec::synthetic(7, SampleProfile::Demo)
        );
        assert_eq!(config.timeout_secs, Some(12));
        assert_eq!(config.max_output_bytes, DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(config.artifact_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = OrchestratorConfig::load(&missing).unwrap_err();
        assert_eq!(err.code(), "CONFIG_001");

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert_eq!(OrchestratorConfig::load(&bad).unwrap_err().code(), "CONFIG_002");

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, r#"{ "backends": [] }"#).unwrap();
        assert_eq!(
            OrchestratorConfig::load(&empty).unwrap_err().code(),
            "CONFIG_003"
        );
    }
}
