//! Value types accepted by the light: brightness and colour temperature.

use serde::{Deserialize, Serialize};

/// Brightness level in `[1, 254]`.
///
/// Zero is never sent to the device; turning the light off goes through
/// the power setter instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Brightness(u8);

impl Brightness {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(254);

    /// Create a brightness, clamping into `[1, 254]`.
    #[must_use]
    pub const fn saturating(value: u8) -> Self {
        if value < Self::MIN.0 {
            Self::MIN
        } else if value > Self::MAX.0 {
            Self::MAX
        } else {
            Self(value)
        }
    }

    /// Round a fractional level to the nearest valid brightness.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_level(level: f64) -> Self {
        if level.is_nan() {
            return Self::MIN;
        }
        Self::saturating(level.round().clamp(0.0, 255.0) as u8)
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// Returned when a raw value falls outside the accepted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{value} is outside {min}..={max}")]
pub struct OutOfRangeError {
    pub value: u16,
    pub min: u16,
    pub max: u16,
}

impl TryFrom<u8> for Brightness {
    type Error = OutOfRangeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN.0..=Self::MAX.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(OutOfRangeError {
                value: u16::from(value),
                min: u16::from(Self::MIN.0),
                max: u16::from(Self::MAX.0),
            })
        }
    }
}

impl From<Brightness> for u8 {
    fn from(value: Brightness) -> Self {
        value.0
    }
}

impl std::fmt::Display for Brightness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Colour temperature in mireds, `[153, 500]`. Lower is cooler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Mireds(u16);

impl Mireds {
    pub const COOLEST: Self = Self(153);
    pub const WARMEST: Self = Self(500);

    /// Create a temperature, clamping into `[153, 500]`.
    #[must_use]
    pub const fn saturating(value: u16) -> Self {
        if value < Self::COOLEST.0 {
            Self::COOLEST
        } else if value > Self::WARMEST.0 {
            Self::WARMEST
        } else {
            Self(value)
        }
    }

    /// Round a fractional temperature to the nearest valid value.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_level(level: f64) -> Self {
        if level.is_nan() {
            return Self::WARMEST;
        }
        Self::saturating(level.round().clamp(0.0, f64::from(u16::MAX)) as u16)
    }

    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Rough human label, as shown next to a temperature slider.
    #[must_use]
    pub fn warmth(self) -> &'static str {
        match self.0 {
            0..300 => "cool",
            300..=350 => "neutral",
            _ => "warm",
        }
    }
}

impl TryFrom<u16> for Mireds {
    type Error = OutOfRangeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if (Self::COOLEST.0..=Self::WARMEST.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(OutOfRangeError {
                value,
                min: Self::COOLEST.0,
                max: Self::WARMEST.0,
            })
        }
    }
}

impl From<Mireds> for u16 {
    fn from(value: Mireds) -> Self {
        value.0
    }
}

impl std::fmt::Display for Mireds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_never_produce_zero_brightness() {
        assert_eq!(Brightness::saturating(0), Brightness::MIN);
        assert_eq!(Brightness::from_level(-3.0), Brightness::MIN);
        assert_eq!(Brightness::from_level(f64::NAN), Brightness::MIN);
    }

    #[test]
    fn should_clamp_brightness_above_max() {
        assert_eq!(Brightness::saturating(255), Brightness::MAX);
        assert_eq!(Brightness::from_level(1000.0), Brightness::MAX);
    }

    #[test]
    fn should_round_brightness_level() {
        assert_eq!(Brightness::from_level(127.5).value(), 128);
        assert_eq!(Brightness::from_level(127.4).value(), 127);
    }

    #[test]
    fn should_reject_out_of_range_brightness_on_try_from() {
        let err = Brightness::try_from(0).unwrap_err();
        assert_eq!(err.to_string(), "0 is outside 1..=254");
        assert!(Brightness::try_from(254).is_ok());
    }

    #[test]
    fn should_clamp_mireds_into_device_range() {
        assert_eq!(Mireds::saturating(100), Mireds::COOLEST);
        assert_eq!(Mireds::saturating(900), Mireds::WARMEST);
        assert_eq!(Mireds::from_level(374.6).value(), 375);
    }

    #[test]
    fn should_label_warmth() {
        assert_eq!(Mireds::saturating(250).warmth(), "cool");
        assert_eq!(Mireds::saturating(320).warmth(), "neutral");
        assert_eq!(Mireds::saturating(450).warmth(), "warm");
    }

    #[test]
    fn should_deserialize_valid_brightness_and_reject_zero() {
        let b: Brightness = serde_json::from_str("200").unwrap();
        assert_eq!(b.value(), 200);
        assert!(serde_json::from_str::<Brightness>("0").is_err());
    }
}
