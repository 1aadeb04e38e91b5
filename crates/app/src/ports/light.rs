//! Light port: the capability the effect engine drives.
//!
//! Every setter may suspend (it crosses the transport to the device) and
//! may fail with a [`DeviceError`]. The core never retries; a failed call
//! aborts whatever effect issued it.

use std::future::Future;
use std::sync::Arc;

use hueflow_domain::colour::ColourXY;
use hueflow_domain::error::DeviceError;
use hueflow_domain::light::{Brightness, Mireds};

/// A single colour-capable light.
///
/// Implementations live in adapter crates (e.g. `adapter_ble`). The handle
/// is shared, unsynchronized: callers must not run two effects against the
/// same light at once.
pub trait Light: Send + Sync {
    /// Switch the light on or off.
    fn set_power(&self, on: bool) -> impl Future<Output = Result<(), DeviceError>> + Send;

    /// Set the brightness level.
    fn set_brightness(
        &self,
        brightness: Brightness,
    ) -> impl Future<Output = Result<(), DeviceError>> + Send;

    /// Set a chromaticity target.
    fn set_colour_xy(&self, colour: ColourXY)
    -> impl Future<Output = Result<(), DeviceError>> + Send;

    /// Set a white colour temperature.
    fn set_colour_temperature(
        &self,
        temperature: Mireds,
    ) -> impl Future<Output = Result<(), DeviceError>> + Send;

    /// Close the connection to the device. Lights without one have nothing
    /// to close.
    fn disconnect(&self) -> impl Future<Output = Result<(), DeviceError>> + Send {
        async { Ok(()) }
    }
}

impl<T: Light> Light for Arc<T> {
    fn set_power(&self, on: bool) -> impl Future<Output = Result<(), DeviceError>> + Send {
        (**self).set_power(on)
    }

    fn set_brightness(
        &self,
        brightness: Brightness,
    ) -> impl Future<Output = Result<(), DeviceError>> + Send {
        (**self).set_brightness(brightness)
    }

    fn set_colour_xy(
        &self,
        colour: ColourXY,
    ) -> impl Future<Output = Result<(), DeviceError>> + Send {
        (**self).set_colour_xy(colour)
    }

    fn set_colour_temperature(
        &self,
        temperature: Mireds,
    ) -> impl Future<Output = Result<(), DeviceError>> + Send {
        (**self).set_colour_temperature(temperature)
    }

    fn disconnect(&self) -> impl Future<Output = Result<(), DeviceError>> + Send {
        (**self).disconnect()
    }
}

/// Finds and connects to a light.
pub trait LightConnector: Send + Sync {
    /// The connected light handle.
    type Light: Light + 'static;

    /// Discover the device and open a connection to it.
    fn connect(&self) -> impl Future<Output = Result<Self::Light, DeviceError>> + Send;
}
