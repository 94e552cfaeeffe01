use std::sync::Arc;
use std::time::Duration;

use job_monitor::logging::init_logging;
use job_monitor::{storage, GlobalBackend, MemoryStorage, MonitorConfig, MonitorHost};

// ========================================
// MAIN ENTRY POINT
// ========================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = MonitorConfig::from_env()?;
    init_logging(&config.log_level);

    // Demo backend: a local worker that keeps the counters moving.
    let jobs = MemoryStorage::new();
    jobs.set_servers(1);
    jobs.set_queues(1);
    storage::set_current(Arc::new(jobs.clone()));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        let mut n: u64 = 0;
        loop {
            ticker.tick().await;
            n += 1;
            jobs.record_enqueued();
            jobs.record_started();
            if n % 10 == 0 {
                jobs.record_failed();
            } else {
                jobs.record_succeeded();
            }
        }
    });

    let host = MonitorHost::from_config(GlobalBackend, &config)?;
    tracing::info!("Job monitor running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    host.stop().await;
    storage::clear_current();
    Ok(())
}
