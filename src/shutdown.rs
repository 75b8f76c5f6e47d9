use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::light::TrafficLight;

/// Graceful shutdown coordinator for a running light
pub struct ShutdownCoordinator {
    light: Arc<TrafficLight>,
    grace_period: Duration,
}

impl ShutdownCoordinator {
    pub fn new(light: Arc<TrafficLight>) -> Self {
        // One poll interval is enough for the cycle loop to notice the stop
        // flag; the rest is slack for a slow scheduler.
        let grace_period = light.config().poll_interval() + Duration::from_secs(5);
        Self {
            light,
            grace_period,
        }
    }

    /// Wait for Ctrl-C
    pub async fn wait_for_signal() -> Result<()> {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;
        info!("Received Ctrl-C, shutting down");
        Ok(())
    }

    /// Stop the light and join its cycle thread off the async runtime
    pub async fn shutdown(self) -> Result<()> {
        info!(light_id = %self.light.light_id(), "Initiating graceful shutdown");

        let light = Arc::clone(&self.light);
        let joined = timeout(
            self.grace_period,
            tokio::task::spawn_blocking(move || light.shutdown()),
        )
        .await;

        match joined {
            Ok(Ok(Ok(()))) => {
                info!("Graceful shutdown completed successfully");
                Ok(())
            }
            Ok(Ok(Err(e))) => Err(e).context("Traffic light did not stop cleanly"),
            Ok(Err(e)) => Err(e).context("Shutdown task failed"),
            Err(_) => {
                warn!(
                    grace_period_ms = self.grace_period.as_millis() as u64,
                    "Timeout waiting for cycle thread to stop"
                );
                Err(anyhow::anyhow!("Timeout waiting for cycle thread to stop"))
            }
        }
    }
}
