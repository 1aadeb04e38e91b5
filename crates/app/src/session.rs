//! Session: what a synchronous front end holds on to.
//!
//! A session owns the [`ExecutionBridge`], the connected light and the
//! current effect execution. It enforces that at most one effect or
//! routine runs at a time; direct controls (power, brightness, colour) are
//! short blocking calls and may be issued while an effect runs.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hueflow_domain::colour::{ColourPreset, ColourXY, Rgb};
use hueflow_domain::effect::{EffectOutcome, EffectSpec};
use hueflow_domain::error::{DeviceError, HueError};
use hueflow_domain::id::ExecutionId;
use hueflow_domain::light::{Brightness, Mireds};
use hueflow_domain::schedule::{Routine, ScheduleTrigger, ScheduledPlan};

use crate::CancellationToken;
use crate::bridge::{ExecutionBridge, ExecutionHandle, ExecutionStatus};
use crate::effect_engine::EffectEngine;
use crate::ports::{Light, LightConnector, StatusSink};
use crate::routine_runner::RoutineRunner;
use crate::scheduler::Scheduler;

/// Upper bound for connecting and for each direct control call.
pub const DEFAULT_CONTROL_TIMEOUT: Duration = Duration::from_secs(30);

/// A light plus the machinery to drive it from synchronous code.
pub struct Session<L> {
    bridge: ExecutionBridge,
    light: Option<Arc<L>>,
    current: Option<ExecutionHandle<EffectOutcome>>,
    scheduler: Scheduler,
    control_timeout: Duration,
}

impl<L> std::fmt::Debug for Session<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("bridge", &self.bridge)
            .field("connected", &self.light.is_some())
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<L: Light + 'static> Session<L> {
    #[must_use]
    pub fn new(bridge: ExecutionBridge) -> Self {
        Self {
            bridge,
            light: None,
            current: None,
            scheduler: Scheduler::default(),
            control_timeout: DEFAULT_CONTROL_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_control_timeout(mut self, timeout: Duration) -> Self {
        self.control_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// The background context, for callers that submit their own work.
    #[must_use]
    pub fn bridge(&self) -> &ExecutionBridge {
        &self.bridge
    }

    /// Use an already connected light.
    pub fn attach(&mut self, light: L) {
        self.light = Some(Arc::new(light));
    }

    /// Connect through `connector`, blocking for at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`HueError::Device`] when discovery or connection fails,
    /// [`HueError::Timeout`] when it takes too long, or
    /// [`HueError::BridgeClosed`] after [`close`](Self::close).
    pub fn connect<C>(&mut self, connector: C, timeout: Duration) -> Result<(), HueError>
    where
        C: LightConnector<Light = L> + 'static,
    {
        tracing::info!(?timeout, "connecting to light");
        let light = self.bridge.run_blocking(
            move |token| async move {
                // a timed-out connect is cancelled, dropping the discovery with it
                match token.run_until_cancelled(connector.connect()).await {
                    Some(result) => result.map_err(HueError::from),
                    None => Err(HueError::Timeout(timeout)),
                }
            },
            timeout,
        )?;
        tracing::info!("light connected");
        self.light = Some(Arc::new(light));
        Ok(())
    }

    /// Cancel any running effect, close the light's connection once the
    /// effect has settled, and forget the light. A light that fails to close
    /// is forgotten all the same.
    pub fn disconnect(&mut self) {
        self.stop_current();
        let Some(light) = self.light.take() else {
            return;
        };
        let settled = self.current.as_ref().map(ExecutionHandle::settled);
        let result = self.bridge.run_blocking(
            move |_token| async move {
                if let Some(settled) = settled {
                    settled.await;
                }
                light.disconnect().await.map_err(HueError::from)
            },
            self.control_timeout,
        );
        match result {
            Ok(()) => tracing::info!("light disconnected"),
            Err(err) => tracing::warn!(%err, "failed to disconnect light"),
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.light.is_some()
    }

    /// The connected light.
    ///
    /// # Errors
    ///
    /// Returns [`HueError::NotConnected`] before a successful connect.
    pub fn light(&self) -> Result<Arc<L>, HueError> {
        self.light.clone().ok_or(HueError::NotConnected)
    }

    /// Whether an effect or routine is still running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Status of the most recently started effect or routine.
    #[must_use]
    pub fn current_status(&self) -> Option<ExecutionStatus> {
        self.current.as_ref().map(ExecutionHandle::status)
    }

    /// Token of the most recently started effect or routine, for callers
    /// that cancel from another thread.
    #[must_use]
    pub fn current_token(&self) -> Option<CancellationToken> {
        self.current.as_ref().map(|handle| handle.token().clone())
    }

    /// Schedule a single effect.
    ///
    /// # Errors
    ///
    /// See [`start_plan`](Self::start_plan).
    pub fn start_effect(
        &mut self,
        trigger: ScheduleTrigger,
        effect: EffectSpec,
        sink: Arc<dyn StatusSink>,
    ) -> Result<ExecutionId, HueError> {
        self.start_plan(ScheduledPlan::Single { trigger, effect }, sink)
    }

    /// Schedule a routine.
    ///
    /// # Errors
    ///
    /// See [`start_plan`](Self::start_plan).
    pub fn start_routine(
        &mut self,
        routine: Routine,
        sink: Arc<dyn StatusSink>,
    ) -> Result<ExecutionId, HueError> {
        self.start_plan(ScheduledPlan::Routine { routine }, sink)
    }

    /// Submit `plan` to the background context and return at once.
    ///
    /// # Errors
    ///
    /// Returns [`HueError::AlreadyRunning`] while another effect runs,
    /// [`HueError::InvalidSchedule`] for a rejected trigger (nothing is
    /// submitted), [`HueError::NotConnected`] without a light, or
    /// [`HueError::BridgeClosed`] after [`close`](Self::close).
    pub fn start_plan(
        &mut self,
        plan: ScheduledPlan,
        sink: Arc<dyn StatusSink>,
    ) -> Result<ExecutionId, HueError> {
        if self.is_busy() {
            return Err(HueError::AlreadyRunning);
        }
        plan.validate()?;
        let light = self.light()?;
        let scheduler = self.scheduler;

        let handle = self.bridge.submit(move |token| async move {
            let runner = RoutineRunner::new(EffectEngine::new(light), scheduler);
            runner.run_plan(&plan, &token, sink.as_ref()).await
        })?;
        let id = handle.id();
        tracing::info!(%id, "plan started");
        self.current = Some(handle);
        Ok(id)
    }

    /// Request cancellation of the running effect. Returns whether one was
    /// running.
    pub fn stop_current(&self) -> bool {
        match &self.current {
            Some(handle) if !handle.is_finished() => {
                self.bridge.cancel(handle);
                true
            }
            _ => false,
        }
    }

    /// Block until the current effect finishes and return its outcome.
    /// `None` when nothing was started since the last wait.
    pub fn wait_current(&mut self) -> Option<Result<EffectOutcome, HueError>> {
        self.current.take().map(ExecutionHandle::wait)
    }

    /// Switch the light on at `brightness`.
    ///
    /// # Errors
    ///
    /// See [`set_brightness`](Self::set_brightness).
    pub fn turn_on(&self, brightness: Brightness) -> Result<(), HueError> {
        self.control("power on", move |light| async move {
            light.set_power(true).await?;
            light.set_brightness(brightness).await
        })
    }

    /// Switch the light off.
    ///
    /// # Errors
    ///
    /// See [`set_brightness`](Self::set_brightness).
    pub fn turn_off(&self) -> Result<(), HueError> {
        self.control("power off", |light| async move { light.set_power(false).await })
    }

    /// Set the brightness, blocking until the light acknowledges.
    ///
    /// # Errors
    ///
    /// Returns [`HueError::NotConnected`] without a light,
    /// [`HueError::Device`] when the light rejects the command,
    /// [`HueError::Timeout`] past the control timeout, or
    /// [`HueError::BridgeClosed`] after [`close`](Self::close).
    pub fn set_brightness(&self, brightness: Brightness) -> Result<(), HueError> {
        self.control("brightness", move |light| async move {
            light.set_brightness(brightness).await
        })
    }

    /// # Errors
    ///
    /// See [`set_brightness`](Self::set_brightness).
    pub fn set_colour_temperature(&self, temperature: Mireds) -> Result<(), HueError> {
        self.control("temperature", move |light| async move {
            light.set_colour_temperature(temperature).await
        })
    }

    /// # Errors
    ///
    /// See [`set_brightness`](Self::set_brightness).
    pub fn set_colour_xy(&self, colour: ColourXY) -> Result<(), HueError> {
        self.control("colour", move |light| async move {
            light.set_colour_xy(colour).await
        })
    }

    /// # Errors
    ///
    /// See [`set_brightness`](Self::set_brightness).
    pub fn set_colour_preset(&self, preset: ColourPreset) -> Result<(), HueError> {
        self.set_colour_xy(preset.xy())
    }

    /// # Errors
    ///
    /// See [`set_brightness`](Self::set_brightness).
    pub fn set_colour_rgb(&self, rgb: Rgb) -> Result<(), HueError> {
        self.set_colour_xy(ColourXY::from_rgb(rgb))
    }

    fn control<F, Fut>(&self, command: &'static str, send: F) -> Result<(), HueError>
    where
        F: FnOnce(Arc<L>) -> Fut,
        Fut: Future<Output = Result<(), DeviceError>> + Send + 'static,
    {
        let light = self.light()?;
        tracing::debug!(command, "direct control");
        let pending = send(light);
        self.bridge.run_blocking(
            move |_token| async move { pending.await.map_err(HueError::from) },
            self.control_timeout,
        )
    }

    /// Cancel the running effect and stop the bridge. Further calls fail
    /// with [`HueError::BridgeClosed`]. Idempotent.
    pub fn close(&mut self) {
        self.stop_current();
        self.bridge.stop();
    }

    /// [`disconnect`](Self::disconnect) and [`close`](Self::close), then
    /// block until the background thread has drained and exited.
    pub fn shutdown(&mut self) {
        self.disconnect();
        self.close();
        self.bridge.shutdown();
    }
}

impl<L> Drop for Session<L> {
    fn drop(&mut self) {
        if let Some(handle) = &self.current {
            handle.cancel();
        }
        self.bridge.stop();
    }
}
