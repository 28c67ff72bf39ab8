//! Process-wide cache of backend availability probes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use nvision_spec::{DetectionBackend, ProbeStatus};
use tracing::debug;

/// Probe results keyed by backend id.
///
/// The first probe of an id is stored and reused until the process exits.
#[derive(Debug, Default)]
pub struct ProbeCache {
    entries: Mutex<HashMap<String, ProbeStatus>>,
}

impl ProbeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by every orchestrator in this process.
    pub fn global() -> Arc<ProbeCache> {
        static GLOBAL: OnceLock<Arc<ProbeCache>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(ProbeCache::new())).clone()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ProbeStatus>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the cached status for `backend`, probing it on first use.
    ///
    /// The probe runs without the lock held; if two threads race, the first
    /// stored status wins.
    pub fn probe(&self, backend: &dyn DetectionBackend) -> ProbeStatus {
        if let Some(status) = self.get(backend.id()) {
            return status;
        }

        let status = backend.probe();
        debug!(backend = backend.id(), status = ?status, "probed backend");
        self.lock()
            .entry(backend.id().to_string())
            .or_insert(status)
            .clone()
    }

    /// Returns the cached status for `id`, if any.
    pub fn get(&self, id: &str) -> Option<ProbeStatus> {
        self.lock().get(id).cloned()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been probed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
