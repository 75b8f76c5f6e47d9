//! Vehicle Simulation Module
//!
//! Vehicles are the external actors that pause at the light until it turns
//! green. The light's wait is a blocking call, so async callers hand it to
//! tokio's blocking pool.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::light::TrafficLight;
use crate::phase::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vehicle {
    pub id: u32,
}

/// Outcome of one vehicle passing the light
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossingReport {
    pub vehicle_id: u32,
    /// Time spent blocked at the light
    pub waited: Duration,
    /// Phase read right after the wait returned
    pub phase_at_crossing: Phase,
}

impl Vehicle {
    pub fn new(id: u32) -> Self {
        Self { id }
    }

    /// Wait at `light` until it shows green, then cross.
    pub async fn approach(self, light: Arc<TrafficLight>) -> Result<CrossingReport> {
        info!(vehicle_id = self.id, light_id = %light.light_id(), "Vehicle waiting at light");
        let arrived = Instant::now();

        let waiting = Arc::clone(&light);
        tokio::task::spawn_blocking(move || waiting.wait_for_green())
            .await
            .context("Wait task failed")?
            .with_context(|| format!("Vehicle {} never saw green", self.id))?;

        let report = CrossingReport {
            vehicle_id: self.id,
            waited: arrived.elapsed(),
            phase_at_crossing: light.current_phase(),
        };
        info!(
            vehicle_id = self.id,
            waited_ms = report.waited.as_millis() as u64,
            "Vehicle crossed"
        );
        Ok(report)
    }
}

/// Queue `count` vehicles at `light`, one every `arrival_gap`, and collect
/// one result per vehicle in arrival order.
pub async fn run_vehicles(
    light: Arc<TrafficLight>,
    count: u32,
    arrival_gap: Duration,
) -> Vec<Result<CrossingReport>> {
    let mut handles = Vec::with_capacity(count as usize);
    for id in 0..count {
        if id > 0 && !arrival_gap.is_zero() {
            tokio::time::sleep(arrival_gap).await;
        }
        let light = Arc::clone(&light);
        handles.push(tokio::spawn(Vehicle::new(id).approach(light)));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        reports.push(match handle.await {
            Ok(result) => result,
            Err(e) => Err(anyhow::Error::new(e).context("Vehicle task failed")),
        });
    }
    reports
}
