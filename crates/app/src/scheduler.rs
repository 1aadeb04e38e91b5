//! Scheduler: waits cooperatively until a trigger fires.
//!
//! Wall-clock time is consulted once, to turn the trigger into a wait
//! duration. The countdown itself runs on the tokio clock, which makes it
//! immune to wall-clock jumps during the wait.

use std::time::Duration;

use tokio::time::Instant;

use hueflow_domain::error::InvalidScheduleError;
use hueflow_domain::schedule::ScheduleTrigger;
use hueflow_domain::time;

use crate::CancellationToken;
use crate::ports::StatusSink;

/// Default cadence of cancellation checks and countdown reports.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How a wait ended.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    /// The trigger fired.
    Elapsed,
    /// The token was cancelled first.
    Cancelled,
    /// The trigger's values were rejected; nothing was waited for.
    Invalid(InvalidScheduleError),
}

/// Waits for schedule triggers.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    poll_interval: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl Scheduler {
    #[must_use]
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Wait until `trigger` fires, reporting the time left at each poll.
    pub async fn wait_until<S: StatusSink + ?Sized>(
        &self,
        trigger: &ScheduleTrigger,
        token: &CancellationToken,
        sink: &S,
    ) -> WaitOutcome {
        match trigger.wait_duration(time::now().naive_local()) {
            Ok(wait) => {
                tracing::info!(%trigger, wait_secs = wait.as_secs(), "waiting for trigger");
                self.wait_for(wait, token, sink).await
            }
            Err(err) => {
                tracing::warn!(%trigger, %err, "rejected schedule trigger");
                WaitOutcome::Invalid(err)
            }
        }
    }

    /// Wait for `wait`, checking the token every poll interval.
    ///
    /// A zero wait returns at once: [`WaitOutcome::Cancelled`] if the token
    /// is already cancelled, [`WaitOutcome::Elapsed`] otherwise. Cancellation
    /// is noticed at the next poll, never in the middle of a sleep.
    pub async fn wait_for<S: StatusSink + ?Sized>(
        &self,
        wait: Duration,
        token: &CancellationToken,
        sink: &S,
    ) -> WaitOutcome {
        // `None` when the deadline is past the clock's range: only a cancel ends it
        let deadline = Instant::now().checked_add(wait);
        loop {
            if token.is_cancelled() {
                tracing::info!("wait cancelled");
                return WaitOutcome::Cancelled;
            }
            let remaining =
                deadline.map_or(wait, |end| end.saturating_duration_since(Instant::now()));
            if remaining.is_zero() {
                return WaitOutcome::Elapsed;
            }
            sink.on_wait_tick(remaining);
            tokio::time::sleep(remaining.min(self.poll_interval)).await;
        }
    }
}
