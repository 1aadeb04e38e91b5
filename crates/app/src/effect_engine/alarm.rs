//! Alarm effect: flash, fast flash or breathing in one colour.

use std::time::Duration;

use tokio::time::Instant;

use hueflow_domain::colour::ColourXY;
use hueflow_domain::effect::{
    AlarmStyle, BREATHING_PAUSE, EffectOutcome, alarm_run_time, breathing_ramp_down,
    breathing_ramp_up,
};
use hueflow_domain::error::HueError;
use hueflow_domain::light::Brightness;

use super::EffectEngine;
use crate::CancellationToken;
use crate::ports::Light;

/// When an alarm stops: on cancellation, or once its run time elapses.
struct StopCondition<'a> {
    token: &'a CancellationToken,
    deadline: Option<Instant>,
}

impl StopCondition<'_> {
    fn reached(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|end| Instant::now() >= end)
    }
}

impl<L: Light> EffectEngine<L> {
    /// Run an alarm until cancelled or, when `duration_minutes` is positive,
    /// until that many minutes have elapsed.
    ///
    /// However the loop ends (short of a device error) the light is left on
    /// at full brightness.
    ///
    /// # Errors
    ///
    /// Returns [`HueError::Device`] when the light rejects a command. No
    /// restore is attempted in that case.
    pub async fn alarm(
        &self,
        colour: ColourXY,
        style: AlarmStyle,
        duration_minutes: Option<f64>,
        token: &CancellationToken,
    ) -> Result<EffectOutcome, HueError> {
        self.light.set_power(true).await?;
        self.light.set_brightness(Brightness::MAX).await?;
        self.light.set_colour_xy(colour).await?;

        let run_time = alarm_run_time(duration_minutes);
        tracing::debug!(%style, %colour, run_time_secs = run_time.map(|d| d.as_secs_f64()), "alarm running");
        let stop = StopCondition {
            token,
            // past the clock's range the alarm only ends on cancel
            deadline: run_time.and_then(|run_time| Instant::now().checked_add(run_time)),
        };

        match style.toggle_interval() {
            Some(interval) => self.toggle(interval, &stop).await?,
            None => self.breathe(&stop).await?,
        }

        self.light.set_power(true).await?;
        self.light.set_brightness(Brightness::MAX).await?;

        if token.is_cancelled() {
            Ok(EffectOutcome::Cancelled)
        } else {
            Ok(EffectOutcome::Completed)
        }
    }

    async fn toggle(&self, interval: Duration, stop: &StopCondition<'_>) -> Result<(), HueError> {
        let mut on = true;
        while !stop.reached() {
            on = !on;
            self.light.set_power(on).await?;
            tokio::time::sleep(interval).await;
        }
        Ok(())
    }

    async fn breathe(&self, stop: &StopCondition<'_>) -> Result<(), HueError> {
        while !stop.reached() {
            for level in breathing_ramp_down().chain(breathing_ramp_up()) {
                if stop.reached() {
                    return Ok(());
                }
                self.light.set_brightness(level).await?;
                tokio::time::sleep(BREATHING_PAUSE).await;
            }
        }
        Ok(())
    }
}
