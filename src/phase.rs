// Signal phases and the lock-free cell that publishes the current one

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// The signal a traffic light is showing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Red,
    Green,
}

impl Phase {
    /// The opposite phase. Toggling always alternates.
    pub fn toggled(self) -> Self {
        match self {
            Phase::Red => Phase::Green,
            Phase::Green => Phase::Red,
        }
    }

    pub fn is_green(self) -> bool {
        matches!(self, Phase::Green)
    }

    fn as_u8(self) -> u8 {
        match self {
            Phase::Red => 0,
            Phase::Green => 1,
        }
    }

    fn from_u8(raw: u8) -> Self {
        if raw == 0 {
            Phase::Red
        } else {
            Phase::Green
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Red => write!(f, "red"),
            Phase::Green => write!(f, "green"),
        }
    }
}

/// Single-writer, multi-reader phase cell.
///
/// The timer thread is the only writer; any thread may read. Stores use
/// `Release` and loads use `Acquire`, so a reader that observes a phase
/// also observes everything the writer did before publishing it.
#[derive(Debug)]
pub struct AtomicPhase {
    inner: AtomicU8,
}

impl AtomicPhase {
    pub fn new(phase: Phase) -> Self {
        Self {
            inner: AtomicU8::new(phase.as_u8()),
        }
    }

    pub fn load(&self) -> Phase {
        Phase::from_u8(self.inner.load(Ordering::Acquire))
    }

    pub fn store(&self, phase: Phase) {
        self.inner.store(phase.as_u8(), Ordering::Release);
    }
}

impl Default for AtomicPhase {
    fn default() -> Self {
        Self::new(Phase::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_alternates() {
        let mut phase = Phase::Red;
        let mut previous = phase;
        for _ in 0..10 {
            phase = phase.toggled();
            assert_ne!(phase, previous);
            previous = phase;
        }
        assert_eq!(Phase::Red.toggled().toggled(), Phase::Red);
    }

    #[test]
    fn test_default_is_red() {
        assert_eq!(Phase::default(), Phase::Red);
        assert_eq!(AtomicPhase::default().load(), Phase::Red);
    }

    #[test]
    fn test_atomic_phase_store_and_load() {
        let cell = AtomicPhase::new(Phase::Red);
        cell.store(Phase::Green);
        assert_eq!(cell.load(), Phase::Green);
        cell.store(Phase::Red);
        assert_eq!(cell.load(), Phase::Red);
    }

    #[test]
    fn test_display_and_serde_names() {
        assert_eq!(Phase::Green.to_string(), "green");
        assert_eq!(Phase::Red.to_string(), "red");

        let parsed: Phase = toml::from_str::<Wrapper>("phase = \"green\"").unwrap().phase;
        assert_eq!(parsed, Phase::Green);
    }

    #[derive(Deserialize)]
    struct Wrapper {
        phase: Phase,
    }
}
