//! # hueflowd: hueflow daemon
//!
//! Composition root that wires the light adapters to the application layer.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and initialise logging
//! - Read, import, show or clear the saved plan
//! - Start the execution bridge and connect to the configured light
//! - Run the saved plan, logging its status, until it finishes or Ctrl-C
//!   cancels it
//!
//! ## Usage
//!
//! ```text
//! hueflowd [run]          run the saved plan
//! hueflowd show           print the saved plan
//! hueflowd import <file>  validate a plan file and save it
//! hueflowd clear          remove the saved plan
//! hueflowd on | off       switch the light
//! ```
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod plan_file;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use hueflow_adapter_ble::HueBleConnector;
use hueflow_adapter_virtual::{VirtualConnector, VirtualLight};
use hueflow_app::CancellationToken;
use hueflow_app::bridge::{ExecutionBridge, ExecutionHandle};
use hueflow_app::ports::{Light, LightConnector};
use hueflow_app::session::Session;
use hueflow_app::status_channel::ChannelSink;
use hueflow_domain::error::HueError;
use hueflow_domain::light::Brightness;
use hueflow_domain::schedule::ScheduledPlan;
use hueflow_domain::status::StatusEvent;

use crate::config::{Backend, Config};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Run,
    Show,
    Import(PathBuf),
    Clear,
    Power(bool),
}

#[derive(Debug, thiserror::Error)]
#[error("usage: hueflowd [run | show | import <file> | clear | on | off]")]
struct UsageError;

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, UsageError> {
        let command = match args.next().as_deref() {
            None | Some("run") => Self::Run,
            Some("show") => Self::Show,
            Some("import") => Self::Import(args.next().map(PathBuf::from).ok_or(UsageError)?),
            Some("clear") => Self::Clear,
            Some("on") => Self::Power(true),
            Some("off") => Self::Power(false),
            Some(_) => return Err(UsageError),
        };
        if args.next().is_some() {
            return Err(UsageError);
        }
        Ok(command)
    }
}

/// What to do once the light is connected.
enum Job {
    Plan(ScheduledPlan),
    Power(bool),
}

fn main() -> Result<(), Box<dyn Error>> {
    let command = Command::parse(std::env::args().skip(1))?;
    let config = Config::load()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .init();

    match command {
        Command::Run => {
            let Some(plan) = plan_file::load(&config.schedule.path)? else {
                tracing::warn!(
                    path = %config.schedule.path.display(),
                    "no saved plan, nothing to run"
                );
                return Ok(());
            };
            with_light(&config, Job::Plan(plan))?;
        }
        Command::Show => show(&config.schedule.path)?,
        Command::Import(source) => import(&source, &config.schedule.path)?,
        Command::Clear => {
            if plan_file::clear(&config.schedule.path)? {
                tracing::info!(path = %config.schedule.path.display(), "saved plan removed");
            }
        }
        Command::Power(on) => with_light(&config, Job::Power(on))?,
    }
    Ok(())
}

fn show(path: &Path) -> Result<(), Box<dyn Error>> {
    match plan_file::load(path)? {
        None => println!("no saved plan"),
        Some(ScheduledPlan::Single { trigger, effect }) => println!("{trigger}: {effect}"),
        Some(ScheduledPlan::Routine { routine }) => {
            for (index, step) in routine.steps().iter().enumerate() {
                println!("{}. {step}", index + 1);
            }
        }
    }
    Ok(())
}

fn import(source: &Path, target: &Path) -> Result<(), Box<dyn Error>> {
    let plan = plan_file::parse(&std::fs::read_to_string(source)?)?;
    plan.validate()?;
    plan_file::save(target, &plan)?;
    tracing::info!(path = %target.display(), "plan saved");
    Ok(())
}

fn with_light(config: &Config, job: Job) -> Result<(), HueError> {
    let timeout = config.light.connect_timeout();
    match config.light.backend {
        Backend::Ble => drive(HueBleConnector::new(config.light.ble()), job, timeout),
        Backend::Virtual => {
            let light = Arc::new(VirtualLight::default());
            let result = drive(VirtualConnector::new(Arc::clone(&light)), job, timeout);
            tracing::info!(snapshot = ?light.snapshot(), "virtual light final state");
            result
        }
    }
}

fn drive<C>(connector: C, job: Job, timeout: Duration) -> Result<(), HueError>
where
    C: LightConnector + 'static,
{
    let mut session = Session::new(ExecutionBridge::start()?).with_control_timeout(timeout);
    session.connect(connector, timeout)?;

    let result = match job {
        Job::Plan(plan) => run_plan(&mut session, plan),
        Job::Power(true) => session.turn_on(Brightness::MAX),
        Job::Power(false) => session.turn_off(),
    };
    session.shutdown();
    result
}

fn run_plan<L: Light + 'static>(
    session: &mut Session<L>,
    plan: ScheduledPlan,
) -> Result<(), HueError> {
    let (sink, mut events) = ChannelSink::new();
    session.start_plan(plan, Arc::new(sink))?;
    let interrupt = watch_interrupt(session.bridge(), session.current_token().unwrap_or_default())?;

    // closes once the plan has finished and dropped its sink
    while let Some(event) = events.blocking_recv() {
        report(event);
    }

    let finished = session.wait_current();
    interrupt.cancel();
    if let Some(outcome) = finished.transpose()? {
        tracing::info!(?outcome, "plan finished");
    }
    Ok(())
}

/// Cancel `plan` on Ctrl-C. The watcher ends when its own handle is
/// cancelled.
fn watch_interrupt(
    bridge: &ExecutionBridge,
    plan: CancellationToken,
) -> Result<ExecutionHandle<()>, HueError> {
    bridge.submit(move |stop| async move {
        tokio::select! {
            () = stop.cancelled() => {}
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => {
                    tracing::info!("interrupted, stopping plan");
                    plan.cancel();
                }
                Err(err) => tracing::warn!(%err, "cannot listen for Ctrl-C"),
            },
        }
        Ok(())
    })
}

fn report(event: StatusEvent) {
    match event {
        StatusEvent::WaitTick { remaining } if remaining.as_secs() % 60 != 0 => {
            tracing::debug!(%event, "waiting");
        }
        StatusEvent::WaitTick { .. } => tracing::info!(%event, "waiting"),
        StatusEvent::Progress { .. } => tracing::info!(%event, "fading"),
        StatusEvent::Step(step) => tracing::info!(
            step = step.index,
            total = step.total,
            kind = %step.kind,
            "routine step started"
        ),
    }
}
