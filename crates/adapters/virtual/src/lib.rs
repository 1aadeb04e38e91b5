//! # hueflow-adapter-virtual
//!
//! An in-memory light for demos and tests. It keeps a snapshot of what a
//! real bulb would show and records every command it receives.
//!
//! | Type | Role |
//! |------|------|
//! | [`VirtualLight`] | Implements the `Light` port |
//! | [`VirtualConnector`] | Implements the `LightConnector` port, handing out a shared [`VirtualLight`] |
//!
//! ## Dependency rule
//!
//! Depends on `hueflow-app` (port traits) and `hueflow-domain` only.

mod connector;
mod light;

pub use connector::VirtualConnector;
pub use light::{LightCommand, LightSnapshot, VirtualLight};
