//! Hue light-control GATT service: characteristic UUIDs and payloads.
//!
//! Every command is a single write to one characteristic of the
//! light-control service. Multi-byte values are little-endian.

use btleplug::api::{Characteristic, Peripheral as _};
use btleplug::platform::Peripheral;
use uuid::Uuid;

use hueflow_domain::colour::ColourXY;
use hueflow_domain::light::{Brightness, Mireds};

use crate::error::BleError;

/// Light-control service.
pub const LIGHT_SERVICE: Uuid = Uuid::from_u128(0x932c_32bd_0000_47a2_835a_a8d4_55b8_59dd);
/// Power state, one byte: `0x01` on, `0x00` off.
pub const POWER_CHAR: Uuid = Uuid::from_u128(0x932c_32bd_0002_47a2_835a_a8d4_55b8_59dd);
/// Brightness, one byte in `[1, 254]`.
pub const BRIGHTNESS_CHAR: Uuid = Uuid::from_u128(0x932c_32bd_0003_47a2_835a_a8d4_55b8_59dd);
/// Colour temperature, `u16` mireds.
pub const TEMPERATURE_CHAR: Uuid = Uuid::from_u128(0x932c_32bd_0004_47a2_835a_a8d4_55b8_59dd);
/// Chromaticity, two `u16` values (x then y) scaled by `0xFFFF`.
pub const COLOUR_CHAR: Uuid = Uuid::from_u128(0x932c_32bd_0005_47a2_835a_a8d4_55b8_59dd);

#[must_use]
pub fn power_payload(on: bool) -> [u8; 1] {
    [u8::from(on)]
}

#[must_use]
pub fn brightness_payload(brightness: Brightness) -> [u8; 1] {
    [brightness.value()]
}

#[must_use]
pub fn temperature_payload(temperature: Mireds) -> [u8; 2] {
    temperature.value().to_le_bytes()
}

/// Encode an xy pair. Components are clamped to `[0, 1]` first.
#[must_use]
pub fn colour_payload(colour: ColourXY) -> [u8; 4] {
    let [x0, x1] = scale(colour.x).to_le_bytes();
    let [y0, y1] = scale(colour.y).to_le_bytes();
    [x0, x1, y0, y1]
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(component: f64) -> u16 {
    let clamped = if component.is_finite() {
        component.clamp(0.0, 1.0)
    } else {
        0.0
    };
    (clamped * f64::from(u16::MAX)).round() as u16
}

/// Find a GATT characteristic by UUID on a peripheral that has already
/// discovered its services.
///
/// # Errors
///
/// Returns [`BleError::CharacteristicNotFound`] if no characteristic with
/// the given UUID is present.
pub(crate) fn find_characteristic(
    peripheral: &Peripheral,
    uuid: Uuid,
) -> Result<Characteristic, BleError> {
    peripheral
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == uuid)
        .ok_or(BleError::CharacteristicNotFound { uuid })
}
