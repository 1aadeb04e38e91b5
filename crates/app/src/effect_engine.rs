//! Effect engine: runs fades and alarms against a [`Light`].
//!
//! Every effect is cooperative: it checks its [`CancellationToken`] at each
//! step boundary and never preempts an in-flight device call or sleep.
//! A device error aborts the effect immediately; no cleanup writes are
//! attempted afterwards.

mod alarm;
mod fade;

use hueflow_domain::effect::{EffectOutcome, EffectSpec};
use hueflow_domain::error::HueError;

use crate::CancellationToken;
use crate::ports::{Light, StatusSink};

/// Drives effects against one light.
#[derive(Debug, Clone)]
pub struct EffectEngine<L> {
    light: L,
}

impl<L: Light> EffectEngine<L> {
    #[must_use]
    pub fn new(light: L) -> Self {
        Self { light }
    }

    /// The light this engine drives.
    #[must_use]
    pub fn light(&self) -> &L {
        &self.light
    }

    /// Run any effect to completion or cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`HueError::Device`] when the light rejects a command.
    pub async fn run<S: StatusSink + ?Sized>(
        &self,
        effect: &EffectSpec,
        token: &CancellationToken,
        sink: &S,
    ) -> Result<EffectOutcome, HueError> {
        tracing::info!(%effect, "effect started");
        let outcome = match effect {
            EffectSpec::FadeIn { duration_minutes } => {
                self.fade_in(*duration_minutes, token, sink).await
            }
            EffectSpec::FadeOut { duration_minutes } => {
                self.fade_out(*duration_minutes, token, sink).await
            }
            EffectSpec::Alarm {
                colour,
                style,
                duration_minutes,
            } => self.alarm(*colour, *style, *duration_minutes, token).await,
        }
        .inspect_err(|err| tracing::error!(kind = %effect.kind(), %err, "effect aborted"))?;
        tracing::info!(kind = %effect.kind(), ?outcome, "effect finished");
        Ok(outcome)
    }
}
