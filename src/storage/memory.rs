//! In-process backend with live counters.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{BackendError, JobStorage, MonitoringApi};
use crate::statistics::StatisticsSnapshot;

#[derive(Default)]
struct Counters {
    servers: AtomicU64,
    recurring: AtomicU64,
    enqueued: AtomicU64,
    queues: AtomicU64,
    scheduled: AtomicU64,
    processing: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    deleted: AtomicU64,
}

/// Job storage kept entirely in memory. Cloning shares the counters.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    counters: Arc<Counters>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite every counter at once.
    pub fn set(&self, s: StatisticsSnapshot) {
        let c = &self.counters;
        c.servers.store(s.servers, Ordering::Relaxed);
        c.recurring.store(s.recurring, Ordering::Relaxed);
        c.enqueued.store(s.enqueued, Ordering::Relaxed);
        c.queues.store(s.queues, Ordering::Relaxed);
        c.scheduled.store(s.scheduled, Ordering::Relaxed);
        c.processing.store(s.processing, Ordering::Relaxed);
        c.succeeded.store(s.succeeded, Ordering::Relaxed);
        c.failed.store(s.failed, Ordering::Relaxed);
        c.deleted.store(s.deleted, Ordering::Relaxed);
    }

    pub fn set_servers(&self, n: u64) {
        self.counters.servers.store(n, Ordering::Relaxed);
    }

    pub fn set_queues(&self, n: u64) {
        self.counters.queues.store(n, Ordering::Relaxed);
    }

    pub fn set_recurring(&self, n: u64) {
        self.counters.recurring.store(n, Ordering::Relaxed);
    }

    pub fn record_enqueued(&self) {
        self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scheduled(&self) {
        self.counters.scheduled.fetch_add(1, Ordering::Relaxed);
    }

    /// Job picked up by a worker: leaves `enqueued`, enters `processing`.
    pub fn record_started(&self) {
        saturating_dec(&self.counters.enqueued);
        self.counters.processing.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_succeeded(&self) {
        saturating_dec(&self.counters.processing);
        self.counters.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        saturating_dec(&self.counters.processing);
        self.counters.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deleted(&self) {
        self.counters.deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        let c = &self.counters;
        StatisticsSnapshot {
            servers: c.servers.load(Ordering::Relaxed),
            recurring: c.recurring.load(Ordering::Relaxed),
            enqueued: c.enqueued.load(Ordering::Relaxed),
            queues: c.queues.load(Ordering::Relaxed),
            scheduled: c.scheduled.load(Ordering::Relaxed),
            processing: c.processing.load(Ordering::Relaxed),
            succeeded: c.succeeded.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            deleted: c.deleted.load(Ordering::Relaxed),
        }
    }
}

fn saturating_dec(counter: &AtomicU64) {
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
}

impl JobStorage for MemoryStorage {
    fn monitoring_api(&self) -> Result<Option<Arc<dyn MonitoringApi>>, BackendError> {
        let api: Arc<dyn MonitoringApi> = Arc::new(self.clone());
        Ok(Some(api))
    }
}

impl MonitoringApi for MemoryStorage {
    fn statistics(&self) -> Result<Option<StatisticsSnapshot>, BackendError> {
        Ok(Some(self.snapshot()))
    }
}
