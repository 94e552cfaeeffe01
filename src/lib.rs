pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod publisher;
pub mod scheduler;
pub mod statistics;
pub mod storage;

pub use config::MonitorConfig;
pub use error::MonitorError;
pub use host::MonitorHost;
pub use publisher::{Publish, StatisticsPublisher};
pub use scheduler::{Cancelled, StatisticsService};
pub use statistics::{Payload, StatisticsSnapshot};
pub use storage::{BackendSource, GlobalBackend, JobStorage, MemoryStorage, MonitoringApi};
