//! Schedules: when an effect starts, and how effects chain into routines.

use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::effect::{EffectKind, EffectSpec};
use crate::error::InvalidScheduleError;

/// Run time substituted for unbounded alarms inside a routine, so that a
/// routine always progresses to its next step.
pub const ROUTINE_ALARM_MINUTES: f64 = 1.0;

/// When an effect should start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleTrigger {
    /// Today at `hour:minute:00`; immediately if that time already passed.
    AtClockTime { hour: u8, minute: u8 },
    /// After a delay in minutes.
    AfterDelay { minutes: f64 },
}

impl ScheduleTrigger {
    /// A trigger that fires immediately.
    #[must_use]
    pub const fn now() -> Self {
        Self::AfterDelay { minutes: 0.0 }
    }

    /// Check the trigger's values.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidScheduleError`] for an hour above 23, a minute above
    /// 59, or a delay that is negative, non-finite or too long to wait for.
    pub fn validate(&self) -> Result<(), InvalidScheduleError> {
        match *self {
            Self::AtClockTime { hour, .. } if hour > 23 => {
                Err(InvalidScheduleError::HourOutOfRange(hour))
            }
            Self::AtClockTime { minute, .. } if minute > 59 => {
                Err(InvalidScheduleError::MinuteOutOfRange(minute))
            }
            Self::AfterDelay { minutes } if !minutes.is_finite() => {
                Err(InvalidScheduleError::NonFiniteDelay)
            }
            Self::AfterDelay { minutes } if minutes < 0.0 => {
                Err(InvalidScheduleError::NegativeDelay(minutes))
            }
            Self::AfterDelay { minutes } if delay(minutes).is_none() => {
                Err(InvalidScheduleError::DelayTooLong(minutes))
            }
            _ => Ok(()),
        }
    }

    /// How long to wait from `now` (local wall-clock time) until the
    /// trigger fires. [`Duration::ZERO`] means "run now".
    ///
    /// A clock time that is now or already passed today fires immediately;
    /// it never rolls over to tomorrow.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidScheduleError`] when [`validate`](Self::validate) fails.
    pub fn wait_duration(&self, now: NaiveDateTime) -> Result<Duration, InvalidScheduleError> {
        self.validate()?;
        match *self {
            Self::AtClockTime { hour, minute } => {
                let time = NaiveTime::from_hms_opt(u32::from(hour), u32::from(minute), 0)
                    .ok_or(InvalidScheduleError::HourOutOfRange(hour))?;
                let target = now.date().and_time(time);
                Ok((target - now).to_std().unwrap_or(Duration::ZERO))
            }
            Self::AfterDelay { minutes } => {
                delay(minutes).ok_or(InvalidScheduleError::DelayTooLong(minutes))
            }
        }
    }
}

fn delay(minutes: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(minutes * 60.0).ok()
}

impl std::fmt::Display for ScheduleTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AtClockTime { hour, minute } => write!(f, "at {hour:02}:{minute:02}"),
            Self::AfterDelay { minutes } => write!(f, "in {minutes} min"),
        }
    }
}

/// One scheduled effect inside a routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineStep {
    pub trigger: ScheduleTrigger,
    pub effect: EffectSpec,
}

impl RoutineStep {
    #[must_use]
    pub fn new(trigger: ScheduleTrigger, effect: EffectSpec) -> Self {
        Self { trigger, effect }
    }

    /// The effect as run inside a routine: an alarm without a positive
    /// duration runs for [`ROUTINE_ALARM_MINUTES`] instead of forever.
    #[must_use]
    pub fn routine_effect(&self) -> EffectSpec {
        match &self.effect {
            EffectSpec::Alarm {
                colour,
                style,
                duration_minutes,
            } if !duration_minutes.is_some_and(|minutes| minutes > 0.0) => EffectSpec::Alarm {
                colour: *colour,
                style: *style,
                duration_minutes: Some(ROUTINE_ALARM_MINUTES),
            },
            other => other.clone(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> EffectKind {
        self.effect.kind()
    }
}

impl std::fmt::Display for RoutineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.trigger, self.effect)
    }
}

/// An ordered list of scheduled effects; insertion order is execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Routine {
    steps: Vec<RoutineStep>,
}

impl Routine {
    #[must_use]
    pub fn new(steps: Vec<RoutineStep>) -> Self {
        Self { steps }
    }

    pub fn push(&mut self, step: RoutineStep) {
        self.steps.push(step);
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    #[must_use]
    pub fn steps(&self) -> &[RoutineStep] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl FromIterator<RoutineStep> for Routine {
    fn from_iter<I: IntoIterator<Item = RoutineStep>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The record a persistence collaborator stores: either one scheduled
/// effect or a whole routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduledPlan {
    Single {
        trigger: ScheduleTrigger,
        effect: EffectSpec,
    },
    Routine { routine: Routine },
}

impl ScheduledPlan {
    /// Check every trigger in the plan.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvalidScheduleError`] found, in step order.
    pub fn validate(&self) -> Result<(), InvalidScheduleError> {
        match self {
            Self::Single { trigger, .. } => trigger.validate(),
            Self::Routine { routine } => routine
                .steps()
                .iter()
                .try_for_each(|step| step.trigger.validate()),
        }
    }
}
