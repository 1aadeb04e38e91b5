//! Sunrise and sunset fades.

use hueflow_domain::effect::{EffectOutcome, FadeDirection, FadePlan};
use hueflow_domain::error::HueError;

use super::EffectEngine;
use crate::CancellationToken;
use crate::ports::{Light, StatusSink};

impl<L: Light> EffectEngine<L> {
    /// Ramp from dim/warm to bright/cool over `duration_minutes`.
    ///
    /// # Errors
    ///
    /// Returns [`HueError::Device`] when the light rejects a command.
    pub async fn fade_in<S: StatusSink + ?Sized>(
        &self,
        duration_minutes: f64,
        token: &CancellationToken,
        sink: &S,
    ) -> Result<EffectOutcome, HueError> {
        self.fade(FadeDirection::In, duration_minutes, token, sink)
            .await
    }

    /// Ramp from bright/cool to dim/warm over `duration_minutes`, then
    /// switch off. A cancelled fade leaves the light on.
    ///
    /// # Errors
    ///
    /// Returns [`HueError::Device`] when the light rejects a command.
    pub async fn fade_out<S: StatusSink + ?Sized>(
        &self,
        duration_minutes: f64,
        token: &CancellationToken,
        sink: &S,
    ) -> Result<EffectOutcome, HueError> {
        let outcome = self
            .fade(FadeDirection::Out, duration_minutes, token, sink)
            .await?;
        if outcome.is_completed() {
            self.light.set_power(false).await?;
        }
        Ok(outcome)
    }

    async fn fade<S: StatusSink + ?Sized>(
        &self,
        direction: FadeDirection,
        duration_minutes: f64,
        token: &CancellationToken,
        sink: &S,
    ) -> Result<EffectOutcome, HueError> {
        let initial = direction.initial_frame();
        self.light.set_power(true).await?;
        self.light.set_brightness(initial.brightness).await?;
        self.light
            .set_colour_temperature(initial.temperature)
            .await?;

        let plan = FadePlan::new(duration_minutes);
        tracing::debug!(
            ?direction,
            steps = plan.steps,
            step_delay_ms = plan.step_delay.as_millis(),
            "fade planned"
        );

        for index in 0..=plan.steps {
            if token.is_cancelled() {
                tracing::info!(?direction, step = index, "fade cancelled");
                return Ok(EffectOutcome::Cancelled);
            }
            let progress = plan.progress(index);
            let frame = direction.frame(progress);
            self.light.set_brightness(frame.brightness).await?;
            self.light.set_colour_temperature(frame.temperature).await?;
            sink.on_progress(progress);

            if index < plan.steps {
                tokio::time::sleep(plan.step_delay).await;
            }
        }
        Ok(EffectOutcome::Completed)
    }
}
