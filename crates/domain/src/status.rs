//! Status events: what a running effect, wait or routine reports to its
//! observer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::effect::EffectKind;

/// A routine step transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStatus {
    /// 1-based index of the step.
    pub index: usize,
    pub total: usize,
    pub kind: EffectKind,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Step {}/{}] {}", self.index, self.total, self.kind)
    }
}

/// Everything an observer can be told while work runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusEvent {
    /// Fade progress in `[0, 1]`.
    Progress { fraction: f64 },
    /// Time left before a scheduled start.
    WaitTick { remaining: Duration },
    /// A routine moved to a new step.
    Step(StepStatus),
}

impl std::fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Progress { fraction } => write!(f, "{:.0}%", fraction * 100.0),
            Self::WaitTick { remaining } => {
                write!(f, "{} remaining", format_remaining(*remaining))
            }
            Self::Step(step) => step.fmt(f),
        }
    }
}

/// Render a countdown: `"1h 5m"` past the hour, `"4m 3s"` below it.
#[must_use]
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.as_secs();
    let (minutes, seconds) = (total / 60, total % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {seconds}s")
    }
}
