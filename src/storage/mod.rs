//! Job-storage backend collaborators.
//!
//! The publisher never talks to a job-processing system directly. It asks a
//! [`BackendSource`] for the current [`JobStorage`], asks that storage for a
//! [`MonitoringApi`], and asks the monitoring API for a [`StatisticsSnapshot`].
//! Each step may fail or come back empty.
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::statistics::StatisticsSnapshot;

pub mod memory;

pub use memory::MemoryStorage;

/// Fault raised by a backend collaborator.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

// ---------- Traits ----------

/// A configured job-storage backend.
pub trait JobStorage: Send + Sync {
    /// Monitoring capability of this backend. `Ok(None)` means the backend has none to offer.
    fn monitoring_api(&self) -> Result<Option<Arc<dyn MonitoringApi>>, BackendError>;
}

/// Read-only statistics view of a backend.
pub trait MonitoringApi: Send + Sync {
    fn statistics(&self) -> Result<Option<StatisticsSnapshot>, BackendError>;
}

/// Resolves the backend to publish from at the start of every cycle.
pub trait BackendSource: Send + Sync {
    fn current(&self) -> Option<Arc<dyn JobStorage>>;
}

impl<S: JobStorage + 'static> BackendSource for Arc<S> {
    fn current(&self) -> Option<Arc<dyn JobStorage>> {
        Some(self.clone() as Arc<dyn JobStorage>)
    }
}

// ---------- Process-wide backend ----------

static CURRENT: Lazy<RwLock<Option<Arc<dyn JobStorage>>>> = Lazy::new(|| RwLock::new(None));

/// Install the backend used by [`GlobalBackend`].
pub fn set_current(storage: Arc<dyn JobStorage>) {
    *CURRENT.write() = Some(storage);
}

pub fn clear_current() {
    CURRENT.write().take();
}

pub fn current() -> Option<Arc<dyn JobStorage>> {
    CURRENT.read().clone()
}

/// Reads whatever backend was last installed with [`set_current`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalBackend;

impl BackendSource for GlobalBackend {
    fn current(&self) -> Option<Arc<dyn JobStorage>> {
        current()
    }
}
