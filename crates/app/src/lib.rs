//! # hueflow-app
//!
//! Application layer: the effect engine and its scheduling/cancellation
//! runtime, plus the **port definitions** (traits) adapters implement.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `Light`: power, brightness, colour and temperature setters
//!   - `LightConnector`: discovery and connection
//!   - `StatusSink`: progress, countdown and routine-step observer
//! - Run effects (`EffectEngine`), wait for their start (`Scheduler`) and
//!   chain them (`RoutineRunner`)
//! - Host the single background execution context a synchronous caller
//!   submits work to (`ExecutionBridge`), and the `Session` that owns it
//!
//! ## Dependency rule
//! Depends on `hueflow-domain` only (plus `tokio` and `tokio-util` for the
//! runtime, timers and cancellation tokens).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod bridge;
pub mod effect_engine;
pub mod ports;
pub mod routine_runner;
pub mod scheduler;
pub mod session;
pub mod status_channel;

/// Cooperative, one-shot cancellation flag shared between a caller and the
/// work it submitted.
pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
pub(crate) mod test_support;
