//! In-memory fakes shared by the unit tests of this crate.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use hueflow_domain::colour::ColourXY;
use hueflow_domain::error::DeviceError;
use hueflow_domain::light::{Brightness, Mireds};
use hueflow_domain::status::StepStatus;

use crate::CancellationToken;
use crate::ports::{Light, StatusSink};

// ── Recording light ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Power(bool),
    Brightness(u8),
    Colour(ColourXY),
    Temperature(u16),
    Disconnect,
}

/// Records every command; optionally rejects everything after the first
/// `fail_after` commands.
#[derive(Debug, Default)]
pub struct RecordingLight {
    commands: Mutex<Vec<Command>>,
    fail_after: Option<usize>,
}

impl RecordingLight {
    pub fn failing_after(count: usize) -> Self {
        Self {
            commands: Mutex::default(),
            fail_after: Some(count),
        }
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn brightness_levels(&self) -> Vec<u8> {
        self.commands()
            .into_iter()
            .filter_map(|cmd| match cmd {
                Command::Brightness(level) => Some(level),
                _ => None,
            })
            .collect()
    }

    pub fn temperatures(&self) -> Vec<u16> {
        self.commands()
            .into_iter()
            .filter_map(|cmd| match cmd {
                Command::Temperature(mireds) => Some(mireds),
                _ => None,
            })
            .collect()
    }

    fn record(&self, command: Command, name: &'static str) -> Result<(), DeviceError> {
        let mut commands = self.commands.lock().unwrap_or_else(PoisonError::into_inner);
        if self.fail_after.is_some_and(|limit| commands.len() >= limit) {
            return Err(DeviceError::Rejected { command: name });
        }
        commands.push(command);
        Ok(())
    }
}

impl Light for RecordingLight {
    async fn set_power(&self, on: bool) -> Result<(), DeviceError> {
        self.record(Command::Power(on), "power")
    }

    async fn set_brightness(&self, brightness: Brightness) -> Result<(), DeviceError> {
        self.record(Command::Brightness(brightness.value()), "brightness")
    }

    async fn set_colour_xy(&self, colour: ColourXY) -> Result<(), DeviceError> {
        self.record(Command::Colour(colour), "colour")
    }

    async fn set_colour_temperature(&self, temperature: Mireds) -> Result<(), DeviceError> {
        self.record(Command::Temperature(temperature.value()), "temperature")
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        self.record(Command::Disconnect, "disconnect")
    }
}

// ── Recording sink ──────────────────────────────────────────────────

/// Records every report and can cancel a token once progress reaches a
/// threshold.
#[derive(Debug, Default)]
pub struct RecordingSink {
    progress: Mutex<Vec<f64>>,
    ticks: Mutex<Vec<Duration>>,
    steps: Mutex<Vec<StepStatus>>,
    cancel_at: Option<(f64, CancellationToken)>,
}

impl RecordingSink {
    pub fn cancelling_at(threshold: f64, token: CancellationToken) -> Self {
        Self {
            cancel_at: Some((threshold, token)),
            ..Self::default()
        }
    }

    pub fn progress(&self) -> Vec<f64> {
        self.progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn ticks(&self) -> Vec<Duration> {
        self.ticks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn steps(&self) -> Vec<StepStatus> {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StatusSink for RecordingSink {
    fn on_progress(&self, fraction: f64) {
        self.progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(fraction);
        if let Some((threshold, token)) = &self.cancel_at
            && fraction >= *threshold
        {
            token.cancel();
        }
    }

    fn on_wait_tick(&self, remaining: Duration) {
        self.ticks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(remaining);
    }

    fn on_step(&self, step: StepStatus) {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(step);
    }
}

pub fn shared_light() -> Arc<RecordingLight> {
    Arc::new(RecordingLight::default())
}
