// Traffic Light Library - concurrent phase state machine
// A timer thread toggles the phase and hands each transition to waiting
// callers through a single-slot channel.

pub mod phase;
pub mod channel;
pub mod threshold;
pub mod cycle;
pub mod light;
pub mod simulation;
pub mod config;
pub mod telemetry;
pub mod shutdown;
pub mod error;

// Re-export key types for easy access
pub use phase::{AtomicPhase, Phase};
pub use channel::PhaseChannel;
pub use threshold::{FixedThreshold, RandomThreshold, ThresholdSource};
pub use cycle::CycleEvent;
pub use light::TrafficLight;
pub use simulation::{run_vehicles, CrossingReport, Vehicle};
pub use config::{CycleConfig, ObservabilityConfig, SimulationConfig, TrafficLightConfig};
pub use telemetry::{init_telemetry, shutdown_telemetry, generate_correlation_id, create_light_span};
pub use shutdown::ShutdownCoordinator;
pub use error::{ChannelError, LightError};
