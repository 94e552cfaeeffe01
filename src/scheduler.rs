//! Fixed-cadence driver for a [`Publish`] implementation.
//!
//! `startup delay -> { publish -> interval }*` until the token is cancelled.
//! Cycles never overlap: the next wait starts only after `publish` returned.
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::MonitorConfig;
use crate::publisher::Publish;

/// The loop was asked to stop. This is the only way [`StatisticsService::run`] ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("statistics service cancelled")]
pub struct Cancelled;

pub struct StatisticsService<P: Publish> {
    startup_delay: Duration,
    interval: Duration,
    publisher: P,
    closed: AtomicBool,
}

impl<P: Publish> StatisticsService<P> {
    pub fn new(startup_delay: Duration, interval: Duration, publisher: P) -> Self {
        Self {
            startup_delay,
            interval,
            publisher,
            closed: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &MonitorConfig, publisher: P) -> Self {
        Self::new(config.startup_delay, config.interval, publisher)
    }

    pub fn startup_delay(&self) -> Duration {
        self.startup_delay
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Drive publish cycles until `cancel` fires.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<Infallible, Cancelled> {
        info!(
            startup_delay = ?self.startup_delay,
            interval = ?self.interval,
            "Statistics service starting"
        );

        wait(self.startup_delay, cancel).await?;

        loop {
            // Publish may have swallowed a cancelled request.
            if cancel.is_cancelled() {
                break;
            }
            self.publisher.publish(cancel).await;
            wait(self.interval, cancel).await?;
        }

        debug!("Statistics service stopped");
        Err(Cancelled)
    }

    /// Release the publisher. Only the first call reaches it.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.publisher.close();
        }
    }
}

impl<P: Publish> Drop for StatisticsService<P> {
    fn drop(&mut self) {
        self.close();
    }
}

async fn wait(duration: Duration, cancel: &CancellationToken) -> Result<(), Cancelled> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Statistics service cancelled");
            Err(Cancelled)
        }
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
