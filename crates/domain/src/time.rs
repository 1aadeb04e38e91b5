//! Time helpers.
//!
//! Schedules are expressed in wall-clock local time, so unlike event
//! timestamps these are [`Local`] rather than UTC.

use chrono::{DateTime, Local};

/// Local wall-clock instant used to resolve clock-time triggers.
pub type LocalTime = DateTime<Local>;

/// Return the current local time.
#[must_use]
pub fn now() -> LocalTime {
    Local::now()
}
