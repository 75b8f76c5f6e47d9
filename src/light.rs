//! Traffic light phase state machine
//!
//! A [`TrafficLight`] owns the authoritative current phase and one
//! background thread that toggles it. Callers can read the phase at any
//! time or block until the light turns green.
//!
//! Liveness: `wait_for_green` only returns once the cycle loop publishes a
//! green phase, so waiting on a light that is never started blocks until
//! the light is shut down.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::channel::PhaseChannel;
use crate::config::CycleConfig;
use crate::cycle::run_cycle;
use crate::error::{ChannelError, LightError};
use crate::phase::{AtomicPhase, Phase};
use crate::telemetry::{create_light_span, generate_correlation_id};
use crate::threshold::{RandomThreshold, ThresholdSource};

/// State shared between a light and its cycle thread
#[derive(Debug)]
pub(crate) struct LightShared {
    pub(crate) light_id: String,
    pub(crate) phase: AtomicPhase,
    pub(crate) channel: PhaseChannel<Phase>,
    pub(crate) toggles: AtomicU64,
    pub(crate) stopping: AtomicBool,
    pub(crate) poll_interval: Duration,
}

impl LightShared {
    pub(crate) fn new(light_id: String, poll_interval: Duration) -> Self {
        Self {
            light_id,
            phase: AtomicPhase::new(Phase::Red),
            channel: PhaseChannel::new(),
            toggles: AtomicU64::new(0),
            stopping: AtomicBool::new(false),
            poll_interval,
        }
    }
}

pub struct TrafficLight {
    shared: Arc<LightShared>,
    config: CycleConfig,
    started: AtomicBool,
    thresholds: Mutex<Option<Box<dyn ThresholdSource>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TrafficLight {
    /// A red light with uniformly random phase durations from `config`
    pub fn new(config: CycleConfig) -> Result<Self, LightError> {
        config.validate()?;
        let thresholds = RandomThreshold::from_config(&config);
        Self::with_threshold_source(config, thresholds)
    }

    /// A red light whose phase durations come from `thresholds`.
    ///
    /// Only the poll interval of `config` is used for timing; the cycle
    /// bounds are still validated.
    pub fn with_threshold_source<S>(config: CycleConfig, thresholds: S) -> Result<Self, LightError>
    where
        S: ThresholdSource + 'static,
    {
        config.validate()?;
        let shared = LightShared::new(generate_correlation_id(), config.poll_interval());
        Ok(Self {
            shared: Arc::new(shared),
            config,
            started: AtomicBool::new(false),
            thresholds: Mutex::new(Some(Box::new(thresholds))),
            worker: Mutex::new(None),
        })
    }

    pub fn light_id(&self) -> &str {
        &self.shared.light_id
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    /// Last phase written by the cycle loop. Never blocks.
    pub fn current_phase(&self) -> Phase {
        self.shared.phase.load()
    }

    /// Number of toggles published since start
    pub fn toggle_count(&self) -> u64 {
        self.shared.toggles.load(Ordering::Relaxed)
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Launch the background cycle loop.
    ///
    /// Succeeds at most once per light. Later calls return
    /// [`LightError::AlreadyStarted`] without spawning anything, and a light
    /// that was shut down cannot be started.
    pub fn start(&self) -> Result<(), LightError> {
        if self.shared.stopping.load(Ordering::Acquire) {
            return Err(LightError::ShutDown);
        }
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            error!(
                light_id = %self.shared.light_id,
                "Refusing to start a second cycle loop"
            );
            return Err(LightError::AlreadyStarted {
                light_id: self.shared.light_id.clone(),
            });
        }

        let thresholds = self
            .thresholds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| LightError::AlreadyStarted {
                light_id: self.shared.light_id.clone(),
            })?;

        let shared = Arc::clone(&self.shared);
        let span = create_light_span(&self.shared.light_id);
        let short_id: String = self.shared.light_id.chars().take(8).collect();
        let handle = thread::Builder::new()
            .name(format!("traffic-light-{short_id}"))
            .spawn(move || {
                let _entered = span.enter();
                run_cycle(shared, thresholds);
            })?;

        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        info!(
            light_id = %self.shared.light_id,
            min_cycle_ms = self.config.min_cycle_ms,
            max_cycle_ms = self.config.max_cycle_ms,
            "Traffic light started"
        );
        Ok(())
    }

    fn warn_if_not_started(&self) {
        if !self.is_started() {
            warn!(
                light_id = %self.shared.light_id,
                "Waiting for green on a light that has not been started; no liveness guarantee until start"
            );
        }
    }

    /// Block until the light publishes a green phase.
    ///
    /// Red phases received along the way are discarded. Returns
    /// [`LightError::ShutDown`] if the light is shut down first.
    pub fn wait_for_green(&self) -> Result<(), LightError> {
        self.warn_if_not_started();
        loop {
            match self.shared.channel.receive() {
                Ok(Phase::Green) => return Ok(()),
                Ok(Phase::Red) => continue,
                Err(_) => return Err(LightError::ShutDown),
            }
        }
    }

    /// [`wait_for_green`](Self::wait_for_green) bounded by `timeout`.
    ///
    /// A timeout too large to represent as a deadline waits without bound.
    pub fn wait_for_green_timeout(&self, timeout: Duration) -> Result<(), LightError> {
        let started_waiting = Instant::now();
        let Some(deadline) = started_waiting.checked_add(timeout) else {
            return self.wait_for_green();
        };
        self.warn_if_not_started();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.shared.channel.receive_timeout(remaining) {
                Ok(Phase::Green) => return Ok(()),
                Ok(Phase::Red) => continue,
                Err(ChannelError::Closed) => return Err(LightError::ShutDown),
                Err(ChannelError::Timeout) => {
                    return Err(LightError::Timeout {
                        waited_ms: started_waiting.elapsed().as_millis() as u64,
                    })
                }
            }
        }
    }

    /// Stop the cycle loop, wake every waiter, and join the cycle thread.
    ///
    /// Safe to call more than once and on a light that never started.
    pub fn shutdown(&self) -> Result<(), LightError> {
        self.signal_stop();

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.join().map_err(|_| LightError::WorkerPanicked)?;
            info!(
                light_id = %self.shared.light_id,
                toggles = self.toggle_count(),
                "Traffic light shut down"
            );
        }
        Ok(())
    }

    fn signal_stop(&self) {
        self.shared.stopping.store(true, Ordering::Release);
        self.shared.channel.close();
    }
}

impl Drop for TrafficLight {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

impl std::fmt::Debug for TrafficLight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficLight")
            .field("light_id", &self.shared.light_id)
            .field("phase", &self.current_phase())
            .field("started", &self.is_started())
            .field("toggles", &self.toggle_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::FixedThreshold;

    fn fast_config() -> CycleConfig {
        CycleConfig {
            min_cycle_ms: 4000,
            max_cycle_ms: 6000,
            poll_interval_ms: 5,
        }
    }

    #[test]
    fn test_new_light_is_red_and_idle() {
        let light = TrafficLight::new(CycleConfig::default()).unwrap();
        assert_eq!(light.current_phase(), Phase::Red);
        assert!(!light.is_started());
        assert_eq!(light.toggle_count(), 0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = CycleConfig {
            poll_interval_ms: 0,
            ..CycleConfig::default()
        };
        assert!(matches!(
            TrafficLight::new(config),
            Err(LightError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_second_start_is_refused() {
        let light =
            TrafficLight::with_threshold_source(fast_config(), FixedThreshold(Duration::from_secs(60)))
                .unwrap();
        light.start().unwrap();

        let err = light.start().unwrap_err();
        assert!(matches!(err, LightError::AlreadyStarted { ref light_id } if light_id == light.light_id()));

        light.shutdown().unwrap();
    }

    #[test]
    fn test_shutdown_wakes_blocked_waiter() {
        let light = Arc::new(
            TrafficLight::with_threshold_source(fast_config(), FixedThreshold(Duration::from_secs(60)))
                .unwrap(),
        );
        light.start().unwrap();

        let waiter = {
            let light = Arc::clone(&light);
            thread::spawn(move || light.wait_for_green())
        };
        thread::sleep(Duration::from_millis(30));
        light.shutdown().unwrap();

        assert!(matches!(waiter.join().unwrap(), Err(LightError::ShutDown)));
    }

    #[test]
    fn test_shutdown_is_idempotent_and_blocks_restart() {
        let light = TrafficLight::new(fast_config()).unwrap();
        light.shutdown().unwrap();
        light.shutdown().unwrap();
        assert!(matches!(light.start(), Err(LightError::ShutDown)));
    }

    #[test]
    fn test_unrepresentable_wait_timeout_waits_for_green() {
        let mut first = true;
        let toggle_once = move || {
            if std::mem::take(&mut first) {
                Duration::ZERO
            } else {
                Duration::from_secs(3600)
            }
        };
        let light = Arc::new(TrafficLight::with_threshold_source(fast_config(), toggle_once).unwrap());
        light.start().unwrap();
        light.wait_for_green_timeout(Duration::MAX).unwrap();
        assert_eq!(light.current_phase(), Phase::Green);

        let waiter = {
            let light = Arc::clone(&light);
            thread::spawn(move || light.wait_for_green_timeout(Duration::MAX))
        };
        thread::sleep(Duration::from_millis(30));
        light.shutdown().unwrap();
        assert!(matches!(waiter.join().unwrap(), Err(LightError::ShutDown)));
    }

    #[test]
    fn test_wait_timeout_without_start() {
        let light = TrafficLight::new(fast_config()).unwrap();
        let err = light
            .wait_for_green_timeout(Duration::from_millis(20))
            .unwrap_err();
        assert!(matches!(err, LightError::Timeout { waited_ms } if waited_ms >= 20));
    }
}
