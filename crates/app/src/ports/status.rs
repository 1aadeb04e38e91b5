//! Status port: how running work reports to its observer.

use std::sync::Arc;
use std::time::Duration;

use hueflow_domain::status::StepStatus;

/// Receives progress while effects, waits and routines run.
///
/// Methods are synchronous and must not block: they are called from the
/// background execution context between device calls. Every method
/// defaults to a no-op so observers implement only what they render.
pub trait StatusSink: Send + Sync {
    /// Fade progress in `[0, 1]`, reported after each applied step.
    fn on_progress(&self, _fraction: f64) {}

    /// Time left before a scheduled start, reported about once a second.
    fn on_wait_tick(&self, _remaining: Duration) {}

    /// A routine moved to a new step.
    fn on_step(&self, _step: StepStatus) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl StatusSink for NoopSink {}

impl<T: StatusSink + ?Sized> StatusSink for Arc<T> {
    fn on_progress(&self, fraction: f64) {
        (**self).on_progress(fraction);
    }

    fn on_wait_tick(&self, remaining: Duration) {
        (**self).on_wait_tick(remaining);
    }

    fn on_step(&self, step: StepStatus) {
        (**self).on_step(step);
    }
}
