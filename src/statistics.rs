//! Statistics snapshot and its wire representation.
use serde::{Deserialize, Serialize};

// ---------- StatisticsSnapshot ----------

/// Point-in-time counters reported by a job-storage backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub servers: u64,
    pub recurring: u64,
    pub enqueued: u64,
    pub queues: u64,
    pub scheduled: u64,
    pub processing: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub deleted: u64,
}

// ---------- Payload ----------

/// Body of `POST /api/statistics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub statistics: StatisticsSnapshot,
}

impl Payload {
    pub fn new(name: Option<&str>, statistics: StatisticsSnapshot) -> Self {
        Self {
            name: name.map(str::to_owned),
            statistics,
        }
    }

    /// Canonical JSON document sent to the collector.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// ==========================================
// TESTS
// ==========================================
