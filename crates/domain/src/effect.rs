//! Effects: what the engine can make the light do, and the pure frame math
//! behind the fades.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::colour::ColourXY;
use crate::light::{Brightness, Mireds};

/// Fade updates issued per minute of fade duration.
pub const FADE_STEPS_PER_MINUTE: f64 = 6.0;

/// Lowest brightness reached by a breathing alarm.
pub const BREATHING_FLOOR: u8 = 20;

/// Brightness change per breathing step.
pub const BREATHING_STEP: u8 = 15;

/// Pause between breathing steps.
pub const BREATHING_PAUSE: Duration = Duration::from_millis(50);

/// How an alarm pulses the light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmStyle {
    /// Power on/off every 0.5 s.
    #[default]
    Flash,
    /// Power on/off every 0.2 s.
    Fast,
    /// Brightness ramps down and up continuously.
    Breathing,
}

impl AlarmStyle {
    /// Power toggle interval, or `None` for breathing.
    #[must_use]
    pub const fn toggle_interval(self) -> Option<Duration> {
        match self {
            Self::Flash => Some(Duration::from_millis(500)),
            Self::Fast => Some(Duration::from_millis(200)),
            Self::Breathing => None,
        }
    }
}

impl std::fmt::Display for AlarmStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flash => f.write_str("flash"),
            Self::Fast => f.write_str("fast"),
            Self::Breathing => f.write_str("breathing"),
        }
    }
}

/// Returned when parsing an unknown alarm style.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown alarm style {0:?}")]
pub struct UnknownAlarmStyleError(pub String);

impl FromStr for AlarmStyle {
    type Err = UnknownAlarmStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flash" => Ok(Self::Flash),
            "fast" => Ok(Self::Fast),
            "breathing" => Ok(Self::Breathing),
            other => Err(UnknownAlarmStyleError(other.to_string())),
        }
    }
}

/// A lighting effect the engine can run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectSpec {
    /// Sunrise: dim and warm to bright and cool.
    FadeIn { duration_minutes: f64 },
    /// Sunset: bright and cool to dim and warm, then off.
    FadeOut { duration_minutes: f64 },
    /// Flash or pulse a colour. `None` or `0` runs until cancelled.
    Alarm {
        colour: ColourXY,
        #[serde(default)]
        style: AlarmStyle,
        #[serde(default)]
        duration_minutes: Option<f64>,
    },
}

impl EffectSpec {
    #[must_use]
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::FadeIn { .. } => EffectKind::FadeIn,
            Self::FadeOut { .. } => EffectKind::FadeOut,
            Self::Alarm { .. } => EffectKind::Alarm,
        }
    }
}

impl std::fmt::Display for EffectSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FadeIn { duration_minutes } | Self::FadeOut { duration_minutes } => {
                write!(f, "{} ({duration_minutes} min)", self.kind())
            }
            Self::Alarm {
                colour,
                style,
                duration_minutes,
            } => match alarm_run_time(*duration_minutes) {
                Some(run_time) => write!(
                    f,
                    "alarm {colour} ({style}) for {} min",
                    run_time.as_secs_f64() / 60.0
                ),
                None => write!(f, "alarm {colour} ({style}) until stopped"),
            },
        }
    }
}

/// Resolve an alarm's optional duration to a run time; `None` means
/// "until cancelled". Durations too long for [`Duration`] saturate.
#[must_use]
pub fn alarm_run_time(duration_minutes: Option<f64>) -> Option<Duration> {
    duration_minutes
        .filter(|minutes| minutes.is_finite() && *minutes > 0.0)
        .map(|minutes| Duration::try_from_secs_f64(minutes * 60.0).unwrap_or(Duration::MAX))
}

/// Discriminant of [`EffectSpec`], used in status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    FadeIn,
    FadeOut,
    Alarm,
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FadeIn => f.write_str("fade in"),
            Self::FadeOut => f.write_str("fade out"),
            Self::Alarm => f.write_str("alarm"),
        }
    }
}

/// How an effect run ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectOutcome {
    /// Ran to its natural end.
    Completed,
    /// Stopped at a check point because the token was set.
    Cancelled,
}

impl EffectOutcome {
    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Direction of a fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FadeDirection {
    /// Brightness 1 → 254, temperature 500 → 250.
    In,
    /// Brightness 254 → 1, temperature 250 → 500.
    Out,
}

/// One brightness/temperature pair applied by a fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeFrame {
    pub brightness: Brightness,
    pub temperature: Mireds,
}

impl FadeDirection {
    /// The frame applied before the first step.
    #[must_use]
    pub fn initial_frame(self) -> FadeFrame {
        match self {
            Self::In => FadeFrame {
                brightness: Brightness::MIN,
                temperature: Mireds::WARMEST,
            },
            Self::Out => FadeFrame {
                brightness: Brightness::MAX,
                temperature: Mireds::saturating(250),
            },
        }
    }

    /// The frame at progress `p` in `[0, 1]`.
    #[must_use]
    pub fn frame(self, progress: f64) -> FadeFrame {
        match self {
            Self::In => FadeFrame {
                brightness: Brightness::from_level(1.0 + 253.0 * progress),
                temperature: Mireds::from_level(500.0 - 250.0 * progress),
            },
            Self::Out => FadeFrame {
                brightness: Brightness::from_level(254.0 - 253.0 * progress),
                temperature: Mireds::from_level(250.0 + 250.0 * progress),
            },
        }
    }
}

/// Step count and pacing of a fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadePlan {
    /// Number of intervals; the fade applies `steps + 1` frames.
    pub steps: u32,
    /// Sleep between consecutive frames.
    pub step_delay: Duration,
}

impl FadePlan {
    /// Plan a fade lasting `duration_minutes`.
    ///
    /// Negative or non-finite durations are treated as zero, which yields a
    /// single interval with no delay. Huge durations saturate the step count
    /// and the step delay.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(duration_minutes: f64) -> Self {
        let minutes = if duration_minutes.is_finite() && duration_minutes > 0.0 {
            duration_minutes
        } else {
            0.0
        };
        let steps = ((minutes * FADE_STEPS_PER_MINUTE).floor() as u32).max(1);
        let step_delay = Duration::try_from_secs_f64(minutes * 60.0 / f64::from(steps))
            .unwrap_or(Duration::MAX);
        Self { steps, step_delay }
    }

    /// Progress at step `index` (`0..=steps`).
    #[must_use]
    pub fn progress(&self, index: u32) -> f64 {
        f64::from(index) / f64::from(self.steps)
    }
}

/// Brightness levels of one breathing cycle's downward ramp: 254, 239, … 29.
pub fn breathing_ramp_down() -> impl Iterator<Item = Brightness> {
    (u16::from(BREATHING_FLOOR) + 1..=u16::from(Brightness::MAX.value()))
        .rev()
        .step_by(usize::from(BREATHING_STEP))
        .map(|level| Brightness::from_level(f64::from(level)))
}

/// Brightness levels of one breathing cycle's upward ramp: 20, 35, … 245.
pub fn breathing_ramp_up() -> impl Iterator<Item = Brightness> {
    (BREATHING_FLOOR..Brightness::MAX.value())
        .step_by(usize::from(BREATHING_STEP))
        .map(Brightness::saturating)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_plan_single_step_for_zero_duration() {
        let plan = FadePlan::new(0.0);
        assert_eq!(plan.steps, 1);
        assert_eq!(plan.step_delay, Duration::ZERO);
    }

    #[test]
    fn should_treat_negative_and_nan_durations_as_zero() {
        assert_eq!(FadePlan::new(-5.0), FadePlan::new(0.0));
        assert_eq!(FadePlan::new(f64::NAN), FadePlan::new(0.0));
    }

    #[test]
    fn should_plan_six_steps_per_minute() {
        let plan = FadePlan::new(15.0);
        assert_eq!(plan.steps, 90);
        assert_eq!(plan.step_delay, Duration::from_secs(10));
    }

    #[test]
    fn should_floor_fractional_step_counts() {
        let plan = FadePlan::new(0.5);
        assert_eq!(plan.steps, 3);
        assert_eq!(plan.step_delay, Duration::from_secs(10));
    }

    #[test]
    fn should_saturate_huge_fade_durations() {
        let plan = FadePlan::new(1e30);
        assert_eq!(plan.steps, u32::MAX);
        assert_eq!(plan.step_delay, Duration::MAX);

        let plan = FadePlan::new(1e18);
        assert_eq!(plan.steps, u32::MAX);
        assert!(plan.step_delay > Duration::from_secs(1_000_000));
    }

    #[test]
    fn should_fade_in_from_warm_dim_to_cool_bright() {
        let start = FadeDirection::In.frame(0.0);
        let end = FadeDirection::In.frame(1.0);
        assert_eq!(start.brightness.value(), 1);
        assert_eq!(start.temperature.value(), 500);
        assert_eq!(end.brightness.value(), 254);
        assert_eq!(end.temperature.value(), 250);
    }

    #[test]
    fn should_fade_out_from_cool_bright_to_warm_dim() {
        let start = FadeDirection::Out.frame(0.0);
        let end = FadeDirection::Out.frame(1.0);
        assert_eq!(start.brightness.value(), 254);
        assert_eq!(start.temperature.value(), 250);
        assert_eq!(end.brightness.value(), 1);
        assert_eq!(end.temperature.value(), 500);
    }

    #[test]
    fn should_round_midpoint_frames() {
        let mid = FadeDirection::In.frame(0.5);
        assert_eq!(mid.brightness.value(), 128);
        assert_eq!(mid.temperature.value(), 375);
    }

    #[test]
    fn should_ramp_breathing_between_floor_and_max() {
        let down: Vec<u8> = breathing_ramp_down().map(Brightness::value).collect();
        let up: Vec<u8> = breathing_ramp_up().map(Brightness::value).collect();
        assert_eq!(down.first(), Some(&254));
        assert_eq!(down.last(), Some(&29));
        assert_eq!(down.len(), 16);
        assert_eq!(up.first(), Some(&20));
        assert_eq!(up.last(), Some(&245));
        assert_eq!(up.len(), 16);
    }

    #[test]
    fn should_treat_zero_alarm_duration_as_unbounded() {
        assert_eq!(alarm_run_time(None), None);
        assert_eq!(alarm_run_time(Some(0.0)), None);
        assert_eq!(alarm_run_time(Some(2.0)), Some(Duration::from_secs(120)));
    }

    #[test]
    fn should_saturate_huge_alarm_duration() {
        assert_eq!(alarm_run_time(Some(1e18)), Some(Duration::MAX));
        assert_eq!(alarm_run_time(Some(f64::MAX)), Some(Duration::MAX));
    }

    #[test]
    fn should_parse_alarm_styles() {
        assert_eq!("fast".parse::<AlarmStyle>().unwrap(), AlarmStyle::Fast);
        assert!("strobe".parse::<AlarmStyle>().is_err());
    }

    #[test]
    fn should_display_effects() {
        let fade = EffectSpec::FadeIn {
            duration_minutes: 15.0,
        };
        assert_eq!(fade.to_string(), "fade in (15 min)");

        let alarm = EffectSpec::Alarm {
            colour: ColourXY::new(0.68, 0.31),
            style: AlarmStyle::Flash,
            duration_minutes: None,
        };
        assert_eq!(alarm.to_string(), "alarm (0.6800, 0.3100) (flash) until stopped");
    }

    #[test]
    fn should_deserialize_alarm_with_defaults() {
        let json = r#"{"type":"alarm","colour":{"x":0.68,"y":0.31}}"#;
        let effect: EffectSpec = serde_json::from_str(json).unwrap();
        assert_eq!(
            effect,
            EffectSpec::Alarm {
                colour: ColourXY::new(0.68, 0.31),
                style: AlarmStyle::Flash,
                duration_minutes: None,
            }
        );
        assert_eq!(effect.kind(), EffectKind::Alarm);
    }
}
