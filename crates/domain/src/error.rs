//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HueError`]
//! via `#[from]`. Cancellation is never an error: effects and waits report
//! it through their outcome types instead.

use std::time::Duration;

/// Top-level error surfaced by every caller-facing entry point.
#[derive(Debug, thiserror::Error)]
pub enum HueError {
    /// The light collaborator failed (connection lost, write rejected, …).
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// A schedule trigger was malformed; nothing was started.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(#[from] InvalidScheduleError),

    /// Work was submitted after the execution bridge was stopped.
    #[error("execution bridge is closed")]
    BridgeClosed,

    /// The background execution context could not be brought up.
    #[error("execution bridge failed to start")]
    BridgeStartup(#[source] std::io::Error),

    /// A blocking call did not finish within its deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Another effect is still running against the light.
    #[error("an effect is already running")]
    AlreadyRunning,

    /// No light is connected to the session.
    #[error("no light connected")]
    NotConnected,

    /// A submitted operation panicked before producing a result.
    #[error("execution aborted: {0}")]
    Aborted(String),
}

/// Coarse classification of a [`HueError`], for callers that render a
/// status line rather than a full message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Device,
    InvalidSchedule,
    BridgeClosed,
    Timeout,
    Busy,
    Aborted,
}

impl HueError {
    /// The kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Device(_) | Self::NotConnected => ErrorKind::Device,
            Self::InvalidSchedule(_) => ErrorKind::InvalidSchedule,
            Self::BridgeClosed | Self::BridgeStartup(_) => ErrorKind::BridgeClosed,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::AlreadyRunning => ErrorKind::Busy,
            Self::Aborted(_) => ErrorKind::Aborted,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device => f.write_str("device"),
            Self::InvalidSchedule => f.write_str("invalid_schedule"),
            Self::BridgeClosed => f.write_str("bridge_closed"),
            Self::Timeout => f.write_str("timeout"),
            Self::Busy => f.write_str("busy"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

/// Failure reported by a light collaborator.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// No device with the given address was found during discovery.
    #[error("could not find device with address {address}")]
    NotFound { address: String },

    /// The connection to the device dropped.
    #[error("connection to the light was lost")]
    Disconnected,

    /// The device refused a command.
    #[error("light rejected {command}")]
    Rejected { command: &'static str },

    /// Any other transport-level failure.
    #[error("light transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Why a [`ScheduleTrigger`](crate::schedule::ScheduleTrigger) was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidScheduleError {
    #[error("hour {0} is outside 0-23")]
    HourOutOfRange(u8),

    #[error("minute {0} is outside 0-59")]
    MinuteOutOfRange(u8),

    #[error("delay of {0} minutes is negative")]
    NegativeDelay(f64),

    #[error("delay is not a finite number")]
    NonFiniteDelay,

    #[error("delay of {0} minutes is too long")]
    DelayTooLong(f64),
}
