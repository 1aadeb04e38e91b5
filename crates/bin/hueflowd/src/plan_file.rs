//! The saved plan: a JSON file holding either one scheduled effect or a
//! routine of them.
//!
//! A single effect is a flat record:
//!
//! ```json
//! { "hour": 7, "minute": 30, "effect": "fade_in", "duration": 15,
//!   "colour": "red", "alarm_style": "flash", "use_time": true,
//!   "delay_mins": 0, "alarm_duration": 0 }
//! ```
//!
//! A routine wraps the same records: `{ "routine": [ ... ] }`. Missing
//! fields take the defaults shown above. An unknown colour falls back to
//! red and an unknown alarm style to flash.

use std::path::Path;

use serde::{Deserialize, Serialize};

use hueflow_domain::colour::{ColourPreset, ColourXY};
use hueflow_domain::effect::{AlarmStyle, EffectSpec};
use hueflow_domain::schedule::{Routine, RoutineStep, ScheduleTrigger, ScheduledPlan};

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum PlanFile {
    Routine { routine: Vec<PlanRecord> },
    Single(PlanRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct PlanRecord {
    hour: u8,
    minute: u8,
    effect: String,
    /// Fade length in minutes.
    duration: f64,
    colour: String,
    /// Exact alarm colour when it is not one of the presets.
    #[serde(skip_serializing_if = "Option::is_none")]
    colour_xy: Option<ColourXY>,
    alarm_style: String,
    use_time: bool,
    delay_mins: f64,
    /// Alarm run time in minutes, `0` for "until stopped".
    alarm_duration: f64,
}

impl Default for PlanRecord {
    fn default() -> Self {
        Self {
            hour: 7,
            minute: 30,
            effect: "fade_in".to_string(),
            duration: 15.0,
            colour: ColourPreset::Red.name().to_string(),
            colour_xy: None,
            alarm_style: AlarmStyle::Flash.to_string(),
            use_time: true,
            delay_mins: 0.0,
            alarm_duration: 0.0,
        }
    }
}

impl PlanRecord {
    fn trigger(&self) -> ScheduleTrigger {
        if self.use_time {
            ScheduleTrigger::AtClockTime {
                hour: self.hour,
                minute: self.minute,
            }
        } else {
            ScheduleTrigger::AfterDelay {
                minutes: self.delay_mins,
            }
        }
    }

    fn effect(&self) -> Result<EffectSpec, PlanFileError> {
        match self.effect.as_str() {
            "fade_in" => Ok(EffectSpec::FadeIn {
                duration_minutes: self.duration,
            }),
            "fade_out" => Ok(EffectSpec::FadeOut {
                duration_minutes: self.duration,
            }),
            "alarm" => Ok(EffectSpec::Alarm {
                colour: self.colour(),
                style: self.alarm_style.parse().unwrap_or_else(|err| {
                    tracing::warn!(%err, "falling back to flash");
                    AlarmStyle::Flash
                }),
                duration_minutes: (self.alarm_duration > 0.0).then_some(self.alarm_duration),
            }),
            other => Err(PlanFileError::UnknownEffect(other.to_string())),
        }
    }

    fn colour(&self) -> ColourXY {
        if let Some(colour) = self.colour_xy {
            return colour;
        }
        self.colour
            .parse::<ColourPreset>()
            .unwrap_or_else(|err| {
                tracing::warn!(%err, "falling back to red");
                ColourPreset::Red
            })
            .xy()
    }

    fn step(&self) -> Result<RoutineStep, PlanFileError> {
        Ok(RoutineStep::new(self.trigger(), self.effect()?))
    }

    fn from_step(trigger: ScheduleTrigger, effect: &EffectSpec) -> Self {
        let mut record = Self::default();
        match trigger {
            ScheduleTrigger::AtClockTime { hour, minute } => {
                record.hour = hour;
                record.minute = minute;
            }
            ScheduleTrigger::AfterDelay { minutes } => {
                record.use_time = false;
                record.delay_mins = minutes;
            }
        }
        match *effect {
            EffectSpec::FadeIn { duration_minutes } => {
                record.duration = duration_minutes;
            }
            EffectSpec::FadeOut { duration_minutes } => {
                record.effect = "fade_out".to_string();
                record.duration = duration_minutes;
            }
            EffectSpec::Alarm {
                colour,
                style,
                duration_minutes,
            } => {
                record.effect = "alarm".to_string();
                match ColourPreset::all()
                    .into_iter()
                    .find(|preset| preset.xy() == colour)
                {
                    Some(preset) => record.colour = preset.name().to_string(),
                    None => record.colour_xy = Some(colour),
                }
                record.alarm_style = style.to_string();
                record.alarm_duration = duration_minutes.unwrap_or(0.0);
            }
        }
        record
    }
}

impl PlanFile {
    /// A top-level `routine` key selects the routine form, so a broken step
    /// fails to decode instead of being read as a defaulted single record.
    fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let mut value: serde_json::Value = serde_json::from_str(content)?;
        match value.get_mut("routine").map(serde_json::Value::take) {
            Some(routine) => Ok(Self::Routine {
                routine: serde_json::from_value(routine)?,
            }),
            None => serde_json::from_value(value).map(Self::Single),
        }
    }

    fn into_plan(self) -> Result<ScheduledPlan, PlanFileError> {
        match self {
            Self::Single(record) => Ok(ScheduledPlan::Single {
                trigger: record.trigger(),
                effect: record.effect()?,
            }),
            Self::Routine { routine } => Ok(ScheduledPlan::Routine {
                routine: routine
                    .iter()
                    .map(PlanRecord::step)
                    .collect::<Result<Routine, _>>()?,
            }),
        }
    }

    fn from_plan(plan: &ScheduledPlan) -> Self {
        match plan {
            ScheduledPlan::Single { trigger, effect } => {
                Self::Single(PlanRecord::from_step(*trigger, effect))
            }
            ScheduledPlan::Routine { routine } => Self::Routine {
                routine: routine
                    .steps()
                    .iter()
                    .map(|step| PlanRecord::from_step(step.trigger, &step.effect))
                    .collect(),
            },
        }
    }
}

/// Decode a plan from its JSON text.
///
/// # Errors
///
/// Returns [`PlanFileError::Json`] for malformed JSON or a malformed
/// record, or [`PlanFileError::UnknownEffect`] for an effect name other than
/// `fade_in`, `fade_out` or `alarm`.
pub fn parse(content: &str) -> Result<ScheduledPlan, PlanFileError> {
    PlanFile::from_json(content)?.into_plan()
}

/// Read the plan saved at `path`. `None` when there is no file.
///
/// # Errors
///
/// See [`parse`]; I/O failures other than a missing file are
/// [`PlanFileError::Io`].
pub fn load(path: &Path) -> Result<Option<ScheduledPlan>, PlanFileError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse(&content).map(Some),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(PlanFileError::Io(err)),
    }
}

/// Write `plan` to `path` as pretty JSON, creating parent directories.
///
/// # Errors
///
/// Returns [`PlanFileError::Io`] when the file cannot be written.
pub fn save(path: &Path, plan: &ScheduledPlan) -> Result<(), PlanFileError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(&PlanFile::from_plan(plan))?;
    std::fs::write(path, content)?;
    tracing::debug!(path = %path.display(), "plan saved");
    Ok(())
}

/// Remove the saved plan. Returns whether a file was removed.
///
/// # Errors
///
/// Returns [`PlanFileError::Io`] when the file exists but cannot be removed.
pub fn clear(path: &Path) -> Result<bool, PlanFileError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(PlanFileError::Io(err)),
    }
}

/// Plan file errors.
#[derive(Debug, thiserror::Error)]
pub enum PlanFileError {
    /// File I/O failure.
    #[error("failed to access plan file")]
    Io(#[from] std::io::Error),
    /// Malformed JSON.
    #[error("failed to decode plan file")]
    Json(#[from] serde_json::Error),
    /// The record names an effect that does not exist.
    #[error("unknown effect {0:?}")]
    UnknownEffect(String),
}
