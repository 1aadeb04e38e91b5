//! # hueflow-domain
//!
//! Pure domain model for driving a single colour-capable smart light.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, local time
//! - Colour math: sRGB ↔ CIE 1931 xy conversion and the preset table
//! - Light value types: [`Brightness`](light::Brightness) and [`Mireds`](light::Mireds)
//! - Effects: the [`EffectSpec`](effect::EffectSpec) union and fade frame math
//! - Schedules: triggers, routine steps and the plans built from them
//! - Status events emitted while effects and routines run
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod colour;
pub mod effect;
pub mod light;
pub mod schedule;
pub mod status;
