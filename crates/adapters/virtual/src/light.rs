//! Virtual light: tracks power, brightness, colour and temperature.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use hueflow_app::ports::Light;
use hueflow_domain::colour::ColourXY;
use hueflow_domain::error::DeviceError;
use hueflow_domain::light::{Brightness, Mireds};

/// One command received by a [`VirtualLight`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightCommand {
    Power(bool),
    Brightness(Brightness),
    Colour(ColourXY),
    Temperature(Mireds),
}

impl LightCommand {
    fn name(self) -> &'static str {
        match self {
            Self::Power(_) => "power",
            Self::Brightness(_) => "brightness",
            Self::Colour(_) => "colour",
            Self::Temperature(_) => "temperature",
        }
    }
}

impl std::fmt::Display for LightCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Power(true) => f.write_str("power on"),
            Self::Power(false) => f.write_str("power off"),
            Self::Brightness(level) => write!(f, "brightness {level}"),
            Self::Colour(colour) => write!(f, "colour {colour}"),
            Self::Temperature(mireds) => write!(f, "temperature {mireds}"),
        }
    }
}

/// What the light currently shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSnapshot {
    pub on: bool,
    pub brightness: Brightness,
    /// Set once a colour is applied; cleared by a temperature.
    pub colour: Option<ColourXY>,
    /// Set once a temperature is applied; cleared by a colour.
    pub temperature: Option<Mireds>,
}

impl Default for LightSnapshot {
    fn default() -> Self {
        Self {
            on: false,
            brightness: Brightness::MAX,
            colour: None,
            temperature: None,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    snapshot: LightSnapshot,
    history: Vec<LightCommand>,
}

/// A simulated colour light.
#[derive(Debug, Default)]
pub struct VirtualLight {
    inner: Mutex<Inner>,
    latency: Duration,
    fail_after: Option<usize>,
}

impl VirtualLight {
    /// Delay every command by `latency`, like a radio round trip.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Accept the first `count` commands, then reject every further one.
    #[must_use]
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    #[must_use]
    pub fn snapshot(&self) -> LightSnapshot {
        self.lock().snapshot
    }

    /// Every accepted command, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<LightCommand> {
        self.lock().history.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn apply(&self, command: LightCommand) -> Result<(), DeviceError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut inner = self.lock();
        if self
            .fail_after
            .is_some_and(|limit| inner.history.len() >= limit)
        {
            tracing::debug!(%command, "virtual light rejected command");
            return Err(DeviceError::Rejected {
                command: command.name(),
            });
        }

        let snapshot = &mut inner.snapshot;
        match command {
            LightCommand::Power(on) => snapshot.on = on,
            LightCommand::Brightness(level) => snapshot.brightness = level,
            LightCommand::Colour(colour) => {
                snapshot.colour = Some(colour);
                snapshot.temperature = None;
            }
            LightCommand::Temperature(mireds) => {
                snapshot.temperature = Some(mireds);
                snapshot.colour = None;
            }
        }
        inner.history.push(command);
        tracing::trace!(%command, "virtual light applied command");
        Ok(())
    }
}

impl Light for VirtualLight {
    async fn set_power(&self, on: bool) -> Result<(), DeviceError> {
        self.apply(LightCommand::Power(on)).await
    }

    async fn set_brightness(&self, brightness: Brightness) -> Result<(), DeviceError> {
        self.apply(LightCommand::Brightness(brightness)).await
    }

    async fn set_colour_xy(&self, colour: ColourXY) -> Result<(), DeviceError> {
        self.apply(LightCommand::Colour(colour)).await
    }

    async fn set_colour_temperature(&self, temperature: Mireds) -> Result<(), DeviceError> {
        self.apply(LightCommand::Temperature(temperature)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hueflow_domain::colour::ColourPreset;

    #[tokio::test]
    async fn should_default_to_off() {
        let light = VirtualLight::default();
        assert!(!light.snapshot().on);
        assert!(light.history().is_empty());
    }

    #[tokio::test]
    async fn should_track_power_and_brightness() {
        let light = VirtualLight::default();
        light.set_power(true).await.unwrap();
        light
            .set_brightness(Brightness::saturating(42))
            .await
            .unwrap();

        let snapshot = light.snapshot();
        assert!(snapshot.on);
        assert_eq!(snapshot.brightness.value(), 42);
    }

    #[tokio::test]
    async fn should_replace_temperature_with_colour() {
        let light = VirtualLight::default();
        light
            .set_colour_temperature(Mireds::WARMEST)
            .await
            .unwrap();
        light
            .set_colour_xy(ColourPreset::Cyan.xy())
            .await
            .unwrap();

        let snapshot = light.snapshot();
        assert_eq!(snapshot.colour, Some(ColourPreset::Cyan.xy()));
        assert_eq!(snapshot.temperature, None);
    }

    #[tokio::test]
    async fn should_record_history_in_order() {
        let light = VirtualLight::default();
        light.set_power(true).await.unwrap();
        light.set_power(false).await.unwrap();

        assert_eq!(
            light.history(),
            vec![LightCommand::Power(true), LightCommand::Power(false)]
        );
    }

    #[tokio::test]
    async fn should_reject_commands_after_limit() {
        let light = VirtualLight::default().failing_after(1);
        light.set_power(true).await.unwrap();

        let err = light.set_brightness(Brightness::MIN).await.unwrap_err();

        assert!(matches!(
            err,
            DeviceError::Rejected {
                command: "brightness"
            }
        ));
        assert_eq!(light.history().len(), 1);
        assert_eq!(light.snapshot().brightness, Brightness::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn should_delay_commands_by_latency() {
        let light = VirtualLight::default().with_latency(Duration::from_millis(80));
        let started = tokio::time::Instant::now();

        light.set_power(true).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn should_display_commands() {
        assert_eq!(LightCommand::Power(true).to_string(), "power on");
        assert_eq!(
            LightCommand::Brightness(Brightness::saturating(10)).to_string(),
            "brightness 10"
        );
    }
}
