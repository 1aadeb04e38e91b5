//! Routine runner: executes scheduled effects and routines.
//!
//! A routine runs its steps strictly in order: wait for the step's trigger,
//! then run the step's effect to completion. Cancellation or a rejected
//! trigger stops the routine; remaining steps are skipped.

use hueflow_domain::effect::{EffectOutcome, EffectSpec};
use hueflow_domain::error::HueError;
use hueflow_domain::schedule::{Routine, ScheduleTrigger, ScheduledPlan};
use hueflow_domain::status::StepStatus;

use crate::CancellationToken;
use crate::effect_engine::EffectEngine;
use crate::ports::{Light, StatusSink};
use crate::scheduler::{Scheduler, WaitOutcome};

/// How a routine ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineOutcome {
    /// Every step ran to completion.
    Completed,
    /// Cancelled after `completed_steps` steps finished.
    Cancelled { completed_steps: usize },
}

impl From<RoutineOutcome> for EffectOutcome {
    fn from(outcome: RoutineOutcome) -> Self {
        match outcome {
            RoutineOutcome::Completed => Self::Completed,
            RoutineOutcome::Cancelled { .. } => Self::Cancelled,
        }
    }
}

/// Waits for triggers and runs effects on one light.
#[derive(Debug, Clone)]
pub struct RoutineRunner<L> {
    engine: EffectEngine<L>,
    scheduler: Scheduler,
}

impl<L: Light> RoutineRunner<L> {
    #[must_use]
    pub fn new(engine: EffectEngine<L>, scheduler: Scheduler) -> Self {
        Self { engine, scheduler }
    }

    /// Run whatever the plan describes.
    ///
    /// # Errors
    ///
    /// Returns [`HueError::InvalidSchedule`] when a trigger is rejected and
    /// [`HueError::Device`] when the light rejects a command.
    pub async fn run_plan<S: StatusSink + ?Sized>(
        &self,
        plan: &ScheduledPlan,
        token: &CancellationToken,
        sink: &S,
    ) -> Result<EffectOutcome, HueError> {
        match plan {
            ScheduledPlan::Single { trigger, effect } => {
                self.run_scheduled(trigger, effect, token, sink).await
            }
            ScheduledPlan::Routine { routine } => self
                .run_routine(routine, token, sink)
                .await
                .map(EffectOutcome::from),
        }
    }

    /// Wait for `trigger`, then run `effect`.
    ///
    /// # Errors
    ///
    /// Returns [`HueError::InvalidSchedule`] when the trigger is rejected;
    /// the effect never starts in that case. Returns [`HueError::Device`]
    /// when the light rejects a command.
    pub async fn run_scheduled<S: StatusSink + ?Sized>(
        &self,
        trigger: &ScheduleTrigger,
        effect: &EffectSpec,
        token: &CancellationToken,
        sink: &S,
    ) -> Result<EffectOutcome, HueError> {
        match self.scheduler.wait_until(trigger, token, sink).await {
            WaitOutcome::Elapsed if token.is_cancelled() => Ok(EffectOutcome::Cancelled),
            WaitOutcome::Elapsed => self.engine.run(effect, token, sink).await,
            WaitOutcome::Cancelled => Ok(EffectOutcome::Cancelled),
            WaitOutcome::Invalid(err) => Err(err.into()),
        }
    }

    /// Run every step of `routine` in order.
    ///
    /// Alarm steps without a positive duration run for one minute so the
    /// routine can move on.
    ///
    /// # Errors
    ///
    /// Returns [`HueError::InvalidSchedule`] when a step's trigger is
    /// rejected and [`HueError::Device`] when the light rejects a command.
    /// Steps before the failing one have already run.
    pub async fn run_routine<S: StatusSink + ?Sized>(
        &self,
        routine: &Routine,
        token: &CancellationToken,
        sink: &S,
    ) -> Result<RoutineOutcome, HueError> {
        let total = routine.len();
        tracing::info!(total, "routine started");

        for (offset, step) in routine.steps().iter().enumerate() {
            if token.is_cancelled() {
                tracing::info!(completed = offset, total, "routine cancelled");
                return Ok(RoutineOutcome::Cancelled {
                    completed_steps: offset,
                });
            }
            let status = StepStatus {
                index: offset + 1,
                total,
                kind: step.kind(),
            };
            tracing::info!(step = status.index, total, kind = %status.kind, trigger = %step.trigger, "routine step");
            sink.on_step(status);

            match self.scheduler.wait_until(&step.trigger, token, sink).await {
                WaitOutcome::Elapsed => {}
                WaitOutcome::Cancelled => {
                    return Ok(RoutineOutcome::Cancelled {
                        completed_steps: offset,
                    });
                }
                WaitOutcome::Invalid(err) => return Err(err.into()),
            }

            let outcome = self
                .engine
                .run(&step.routine_effect(), token, sink)
                .await?;
            if !outcome.is_completed() {
                tracing::info!(step = status.index, total, "routine cancelled");
                return Ok(RoutineOutcome::Cancelled {
                    completed_steps: offset,
                });
            }
        }

        tracing::info!(total, "routine completed");
        Ok(RoutineOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::ports::NoopSink;
    use crate::test_support::{Command, RecordingLight, RecordingSink};
    use hueflow_domain::colour::ColourPreset;
    use hueflow_domain::effect::{AlarmStyle, EffectKind};
    use hueflow_domain::error::InvalidScheduleError;
    use hueflow_domain::schedule::RoutineStep;

    fn runner() -> RoutineRunner<RecordingLight> {
        RoutineRunner::new(
            EffectEngine::new(RecordingLight::default()),
            Scheduler::default(),
        )
    }

    fn open_ended_alarm() -> EffectSpec {
        EffectSpec::Alarm {
            colour: ColourPreset::Red.xy(),
            style: AlarmStyle::Flash,
            duration_minutes: Some(0.0),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn should_bound_open_ended_alarm_and_continue_to_next_step() {
        let runner = runner();
        let sink = RecordingSink::default();
        let routine = Routine::new(vec![
            RoutineStep::new(ScheduleTrigger::now(), open_ended_alarm()),
            RoutineStep::new(
                ScheduleTrigger::now(),
                EffectSpec::FadeIn {
                    duration_minutes: 1.0,
                },
            ),
        ]);
        let started = Instant::now();

        let outcome = runner
            .run_routine(&routine, &CancellationToken::new(), &sink)
            .await
            .unwrap();

        assert_eq!(outcome, RoutineOutcome::Completed);
        assert!(started.elapsed() >= Duration::from_secs(120));
        let steps = sink.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].to_string(), "[Step 1/2] alarm");
        assert_eq!(steps[1].index, 2);
        assert_eq!(steps[1].kind, EffectKind::FadeIn);
        assert_eq!(runner.engine.light().brightness_levels().last(), Some(&254));
    }

    #[tokio::test(start_paused = true)]
    async fn should_skip_remaining_steps_when_cancelled() {
        let runner = runner();
        let token = CancellationToken::new();
        let sink = RecordingSink::cancelling_at(0.5, token.clone());
        let routine = Routine::new(vec![
            RoutineStep::new(
                ScheduleTrigger::now(),
                EffectSpec::FadeOut {
                    duration_minutes: 1.0,
                },
            ),
            RoutineStep::new(
                ScheduleTrigger::now(),
                EffectSpec::FadeIn {
                    duration_minutes: 1.0,
                },
            ),
        ]);

        let outcome = runner.run_routine(&routine, &token, &sink).await.unwrap();

        assert_eq!(outcome, RoutineOutcome::Cancelled { completed_steps: 0 });
        assert_eq!(sink.steps().len(), 1);
        assert!(!runner.engine.light().commands().contains(&Command::Power(false)));
    }

    #[tokio::test(start_paused = true)]
    async fn should_send_nothing_when_routine_already_cancelled() {
        let runner = runner();
        let sink = RecordingSink::default();
        let token = CancellationToken::new();
        token.cancel();
        let routine = Routine::new(vec![RoutineStep::new(
            ScheduleTrigger::now(),
            EffectSpec::FadeIn {
                duration_minutes: 10.0,
            },
        )]);

        let outcome = runner.run_routine(&routine, &token, &sink).await.unwrap();

        assert_eq!(outcome, RoutineOutcome::Cancelled { completed_steps: 0 });
        assert!(sink.steps().is_empty());
        assert!(runner.engine.light().commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_start_immediate_effect_when_already_cancelled() {
        let runner = runner();
        let token = CancellationToken::new();
        token.cancel();
        let plan = ScheduledPlan::Single {
            trigger: ScheduleTrigger::now(),
            effect: EffectSpec::FadeIn {
                duration_minutes: 10.0,
            },
        };

        let outcome = runner.run_plan(&plan, &token, &NoopSink).await.unwrap();

        assert_eq!(outcome, EffectOutcome::Cancelled);
        assert!(runner.engine.light().commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_routine_on_invalid_trigger() {
        let runner = runner();
        let routine = Routine::new(vec![
            RoutineStep::new(
                ScheduleTrigger::now(),
                EffectSpec::FadeIn {
                    duration_minutes: 0.0,
                },
            ),
            RoutineStep::new(
                ScheduleTrigger::AtClockTime {
                    hour: 7,
                    minute: 75,
                },
                EffectSpec::FadeOut {
                    duration_minutes: 0.0,
                },
            ),
        ]);

        let result = runner
            .run_routine(&routine, &CancellationToken::new(), &NoopSink)
            .await;

        assert!(matches!(
            result,
            Err(HueError::InvalidSchedule(
                InvalidScheduleError::MinuteOutOfRange(75)
            ))
        ));
        // first step ran, second never started
        assert_eq!(runner.engine.light().brightness_levels(), vec![1, 1, 254]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_complete_empty_routine_without_commands() {
        let runner = runner();

        let outcome = runner
            .run_routine(&Routine::default(), &CancellationToken::new(), &NoopSink)
            .await
            .unwrap();

        assert_eq!(outcome, RoutineOutcome::Completed);
        assert!(runner.engine.light().commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_wait_for_delay_before_single_effect() {
        let runner = runner();
        let sink = RecordingSink::default();
        let plan = ScheduledPlan::Single {
            trigger: ScheduleTrigger::AfterDelay { minutes: 0.5 },
            effect: EffectSpec::FadeIn {
                duration_minutes: 0.0,
            },
        };
        let started = Instant::now();

        let outcome = runner
            .run_plan(&plan, &CancellationToken::new(), &sink)
            .await
            .unwrap();

        assert_eq!(outcome, EffectOutcome::Completed);
        assert!(started.elapsed() >= Duration::from_secs(30));
        assert_eq!(sink.ticks().len(), 30);
        assert_eq!(runner.engine.light().brightness_levels(), vec![1, 1, 254]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_start_effect_when_cancelled_during_wait() {
        let runner = runner();
        let token = CancellationToken::new();
        token.cancel();

        let outcome = runner
            .run_scheduled(
                &ScheduleTrigger::AfterDelay { minutes: 5.0 },
                &open_ended_alarm(),
                &token,
                &NoopSink,
            )
            .await
            .unwrap();

        assert_eq!(outcome, EffectOutcome::Cancelled);
        assert!(runner.engine.light().commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_start_effect_for_invalid_trigger() {
        let runner = runner();

        let result = runner
            .run_scheduled(
                &ScheduleTrigger::AtClockTime {
                    hour: 25,
                    minute: 0,
                },
                &open_ended_alarm(),
                &CancellationToken::new(),
                &NoopSink,
            )
            .await;

        assert!(matches!(result, Err(HueError::InvalidSchedule(_))));
        assert!(runner.engine.light().commands().is_empty());
    }
}
