use thiserror::Error;

/// Failures of a bounded or interrupted receive on a [`PhaseChannel`](crate::channel::PhaseChannel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("channel closed with no buffered value")]
    Closed,
    #[error("timed out waiting for a value")]
    Timeout,
}

#[derive(Debug, Error)]
pub enum LightError {
    #[error("traffic light {light_id} already started; the cycle loop runs at most once")]
    AlreadyStarted { light_id: String },
    #[error("traffic light shut down while waiting")]
    ShutDown,
    #[error("gave up waiting for green after {waited_ms}ms")]
    Timeout { waited_ms: u64 },
    #[error("failed to spawn cycle thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("cycle thread panicked")]
    WorkerPanicked,
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}
