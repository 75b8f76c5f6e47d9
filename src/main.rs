use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use traffic_light::{
    init_telemetry, run_vehicles, shutdown_telemetry, ShutdownCoordinator, TrafficLight,
    TrafficLightConfig,
};

const ARRIVAL_GAP: Duration = Duration::from_millis(750);

#[tokio::main]
async fn main() -> Result<()> {
    TrafficLightConfig::load_env_file()?;
    let config = TrafficLightConfig::load()?;
    init_telemetry(&config.observability)?;

    let light = Arc::new(TrafficLight::new(config.cycle.clone())?);
    light.start()?;
    info!(
        light_id = %light.light_id(),
        vehicles = config.simulation.vehicles,
        run_seconds = config.simulation.run_seconds,
        "Simulation running"
    );

    let run_for = Duration::from_secs(config.simulation.run_seconds);
    tokio::select! {
        reports = run_vehicles(Arc::clone(&light), config.simulation.vehicles, ARRIVAL_GAP) => {
            for report in reports {
                match report {
                    Ok(report) => info!(
                        vehicle_id = report.vehicle_id,
                        waited_ms = report.waited.as_millis() as u64,
                        phase = %report.phase_at_crossing,
                        "Crossing recorded"
                    ),
                    Err(e) => warn!("Vehicle did not cross: {:#}", e),
                }
            }
        }
        _ = tokio::time::sleep(run_for) => {
            info!("Simulation time elapsed");
        }
        result = ShutdownCoordinator::wait_for_signal() => {
            result?;
        }
    }

    let toggles = light.toggle_count();
    ShutdownCoordinator::new(light).shutdown().await?;
    info!(toggles, "Simulation finished");
    shutdown_telemetry();
    Ok(())
}
