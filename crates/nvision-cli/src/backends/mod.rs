//! Backend orchestration.
//!
//! A request is run through an ordered list of interchangeable backends,
//! degrading gracefully when a preferred one is unavailable or fails.
//!
//! # Flow
//!
//! 1. **Validation**: the input is checked once; bad input aborts the request
//! 2. **Probe**: each candidate's availability is probed, once per process
//! 3. **Run**: the candidate analyses the frame under a timeout
//! 4. **Check**: its result is validated against the analysed grid shape
//! 5. **Outcome**: the first accepted result is returned with provenance
//!
//! The default ordering is the bundled `nvision worker` program, then the
//! in-process engine, then the engine on synthetic sample data.
//!
//! # Example
//!
//! ```
//! use nvision_cli::backends::{BackendSpec, Orchestrator, OrchestratorConfig};
//! use nvision_spec::{CancellationToken, DetectionParameters, ScanFrame};
//!
//! let config = OrchestratorConfig::default().backends(vec![BackendSpec::in_process()]);
//! let orchestrator = Orchestrator::from_config(&config);
//!
//! let mut counts = vec![vec![10.0; 5]; 5];
//! counts[2][2] = 100.0;
//! let outcome = orchestrator
//!     .run(
//!         &ScanFrame::new(counts),
//!         &DetectionParameters::new(1.0, 1),
//!         &CancellationToken::new(),
//!     )
//!     .unwrap();
//! assert_eq!(outcome.backend_id, "in_process");
//! assert!(!outcome.degraded);
//! ```

mod config;
mod orchestrator;
mod probe_cache;

pub use config::{auto_timeout, BackendSpec, ConfigError, OrchestratorConfig, WORKER_ID};
pub use orchestrator::{Orchestrator, OrchestratorError};
pub use probe_cache::ProbeCache;
