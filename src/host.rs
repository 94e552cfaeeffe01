//! Background-service wrapper around [`StatisticsService`].
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{error, info};

use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::publisher::{Publish, StatisticsPublisher};
use crate::scheduler::{Cancelled, StatisticsService};
use crate::storage::BackendSource;

/// Owns the scheduler task and the token that stops it.
///
/// Dropping the host without [`MonitorHost::stop`] still cancels the loop; the
/// publisher is released once the task lets go of the service.
pub struct MonitorHost<P: Publish + 'static> {
    service: Arc<StatisticsService<P>>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    _cancel_on_drop: DropGuard,
}

impl<B: BackendSource + 'static> MonitorHost<StatisticsPublisher<B>> {
    /// Build publisher and scheduler from `config` and start publishing.
    pub fn from_config(backend: B, config: &MonitorConfig) -> Result<Self, MonitorError> {
        let publisher = StatisticsPublisher::new(backend, config)?;
        info!(
            endpoint = %publisher.endpoint(),
            name = config.name.as_deref().unwrap_or("-"),
            "Job monitor configured"
        );
        Ok(Self::start(StatisticsService::from_config(config, publisher)))
    }
}

impl<P: Publish + 'static> MonitorHost<P> {
    /// Spawn the scheduler loop on the current tokio runtime.
    pub fn start(service: StatisticsService<P>) -> Self {
        let service = Arc::new(service);
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let service = service.clone();
            let cancel = cancel.clone();
            async move {
                match service.run(&cancel).await {
                    Ok(never) => match never {},
                    Err(Cancelled) => info!("Job monitor stopped"),
                }
            }
        });

        let _cancel_on_drop = cancel.clone().drop_guard();
        Self {
            service,
            cancel,
            task,
            _cancel_on_drop,
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn service(&self) -> &StatisticsService<P> {
        &self.service
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the loop, wait for it to wind down, release the publisher.
    pub async fn stop(self) {
        self.cancel.cancel();

        if let Err(e) = self.task.await {
            if e.is_panic() {
                error!("Job monitor task panicked: {}", e);
            } else {
                error!("Job monitor task aborted: {}", e);
            }
        }

        self.service.close();
    }
}
