//! nvision External Process Backend
//!
//! Runs peak detection in a separate program and talks to it through files.
//! This is how a feature-richer numerical stack (for example a Python
//! interpreter with numpy and scipy) or the bundled `nvision worker` command
//! plugs into the orchestrator.
//!
//! # Protocol
//!
//! 1. The program is found via the configured path, `NVISION_BACKEND`, or `PATH`
//! 2. An optional probe command checks its dependencies
//! 3. It is spawned as
//!    `<program> <args...> <input.json> <output.png> <thresholdFactor> <minDistance>`
//!    in a private scratch directory, with stdin closed
//! 4. It writes the image to `output.png` and the result to `output.json`
//! 5. Exit code 0 with a non-empty image and a parseable result is success
//!
//! The run is bounded by a timeout and per-stream output caps, and the child
//! is killed if the request is cancelled.
//!
//! # Example
//!
//! ```no_run
//! use nvision_backend_process::{ExternalConfig, ExternalProcessBackend};
//! use nvision_spec::DetectionBackend;
//!
//! let backend = ExternalProcessBackend::new(
//!     ExternalConfig::new("scipy", "python3")
//!         .args(["detect_nv.py"])
//!         .probe_args(["-c", "import numpy, scipy"]),
//! );
//! println!("{:?}", backend.probe());
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod locate;
pub mod runner;

pub use backend::{ExternalProcessBackend, SIGMA_ENV_VAR};
pub use config::{ExternalConfig, BACKEND_ENV_VAR, DEFAULT_PROBE_TIMEOUT_SECS};
pub use error::{ProcessError, ProcessResult};
pub use locate::{find_program, probe_dependencies};
pub use runner::{run_command, CapturedOutput, CapturedStream, RunLimits};
