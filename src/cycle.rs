use statig::prelude::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::light::LightShared;
use crate::phase::Phase;
use crate::threshold::ThresholdSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleEvent {
    /// The current phase has been held for at least its threshold
    ThresholdElapsed,
}

/// Drives phase transitions for one light.
///
/// Each transition writes the phase field first and then sends the new
/// phase into the channel, so a reader of `current_phase` may briefly see
/// the new phase before a waiter receives it, never the other way round.
pub struct SignalCycle {
    shared: Arc<LightShared>,
}

impl SignalCycle {
    pub(crate) fn new(shared: Arc<LightShared>) -> Self {
        Self { shared }
    }

    fn publish(&self, phase: Phase) {
        self.shared.phase.store(phase);
        let toggles = self.shared.toggles.fetch_add(1, Ordering::Relaxed) + 1;
        self.shared.channel.send(phase);
        debug!(
            light_id = %self.shared.light_id,
            phase = %phase,
            toggles = toggles,
            "Phase toggled"
        );
    }
}

#[state_machine(initial = "State::red()")]
impl SignalCycle {
    #[state]
    fn red(&mut self, event: &CycleEvent) -> Outcome<State> {
        match event {
            CycleEvent::ThresholdElapsed => {
                self.publish(Phase::Green);
                Transition(State::green())
            }
        }
    }

    #[state]
    fn green(&mut self, event: &CycleEvent) -> Outcome<State> {
        match event {
            CycleEvent::ThresholdElapsed => {
                self.publish(Phase::Red);
                Transition(State::red())
            }
        }
    }
}

/// Body of the cycle thread.
///
/// Sleeps one poll interval per iteration and fires `ThresholdElapsed` once
/// the current phase has been held for its threshold, then draws a fresh
/// threshold. Exits when the light's stop flag is raised.
pub(crate) fn run_cycle(shared: Arc<LightShared>, mut thresholds: Box<dyn ThresholdSource>) {
    let poll_interval = shared.poll_interval;
    let mut machine = SignalCycle::new(Arc::clone(&shared)).state_machine();

    let mut threshold = thresholds.next_threshold();
    let mut phase_started = Instant::now();
    info!(
        light_id = %shared.light_id,
        threshold_ms = threshold.as_millis() as u64,
        poll_interval_ms = poll_interval.as_millis() as u64,
        "Cycle loop started"
    );

    while !shared.stopping.load(Ordering::Acquire) {
        std::thread::sleep(poll_interval);
        if shared.stopping.load(Ordering::Acquire) {
            break;
        }

        if phase_started.elapsed() >= threshold {
            machine.handle(&CycleEvent::ThresholdElapsed);
            threshold = thresholds.next_threshold();
            phase_started = Instant::now();
            debug!(
                light_id = %shared.light_id,
                threshold_ms = threshold.as_millis() as u64,
                "Next threshold drawn"
            );
        }
    }

    info!(
        light_id = %shared.light_id,
        toggles = shared.toggles.load(Ordering::Relaxed),
        "Cycle loop stopped"
    );
}
