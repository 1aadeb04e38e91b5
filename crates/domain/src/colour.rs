//! Colour math: sRGB ↔ CIE 1931 xy conversion and the preset table.
//!
//! Lights take device-independent chromaticity targets; user interfaces
//! think in RGB. The conversions here use the sRGB primaries with a D65
//! white point. They are intentionally approximate: the device clamps
//! out-of-gamut targets itself.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// D65 white point, returned for pure black where chromaticity is undefined.
pub const D65_WHITE: ColourXY = ColourXY {
    x: 0.31271,
    y: 0.32902,
};

/// A chromaticity coordinate in CIE 1931 xy space.
///
/// Both components are nominally in `[0, 1]`. Pairs with `x + y > 1` are
/// allowed; the device clamps them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColourXY {
    pub x: f64,
    pub y: f64,
}

impl ColourXY {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Chromaticity of an 8-bit sRGB colour.
    #[must_use]
    pub fn from_rgb(rgb: Rgb) -> Self {
        rgb_to_xy(rgb.r, rgb.g, rgb.b)
    }
}

impl std::fmt::Display for ColourXY {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.x, self.y)
    }
}

/// An 8-bit sRGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Convert an 8-bit sRGB colour to CIE xy.
#[must_use]
pub fn rgb_to_xy(r: u8, g: u8, b: u8) -> ColourXY {
    let r = srgb_to_linear(f64::from(r) / 255.0);
    let g = srgb_to_linear(f64::from(g) / 255.0);
    let b = srgb_to_linear(f64::from(b) / 255.0);

    let x = r * 0.412_456_4 + g * 0.357_576_1 + b * 0.180_437_5;
    let y = r * 0.212_672_9 + g * 0.715_152_2 + b * 0.072_175_0;
    let z = r * 0.019_333_9 + g * 0.119_192_0 + b * 0.950_304_1;

    let total = x + y + z;
    if total == 0.0 {
        return D65_WHITE;
    }
    ColourXY::new(x / total, y / total)
}

/// Convert CIE xy plus a relative luminance in `[0, 1]` to approximate
/// 8-bit sRGB, for display purposes.
#[must_use]
pub fn xy_to_rgb(xy: ColourXY, brightness: f64) -> Rgb {
    let z = 1.0 - xy.x - xy.y;
    let big_y = brightness;
    let (big_x, big_z) = if xy.y > 0.0 {
        ((big_y / xy.y) * xy.x, (big_y / xy.y) * z)
    } else {
        (0.0, 0.0)
    };

    let r = big_x * 3.240_454_2 - big_y * 1.537_138_5 - big_z * 0.498_531_4;
    let g = -big_x * 0.969_266_0 + big_y * 1.876_010_8 + big_z * 0.041_556_0;
    let b = big_x * 0.055_643_4 - big_y * 0.204_025_9 + big_z * 1.057_225_2;

    Rgb::new(to_channel(r), to_channel(g), to_channel(b))
}

fn srgb_to_linear(c: f64) -> f64 {
    if c > 0.040_45 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

fn linear_to_srgb(c: f64) -> f64 {
    if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Gamma-encode, scale to 8 bits, clamp and truncate.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_channel(linear: f64) -> u8 {
    let scaled = linear_to_srgb(linear) * 255.0;
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, 255.0) as u8
}

/// Named colours tuned for Hue bulbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColourPreset {
    Red,
    Green,
    Blue,
    Yellow,
    Orange,
    Purple,
    Pink,
    Cyan,
    WarmWhite,
    CoolWhite,
}

impl ColourPreset {
    /// Every preset, in display order.
    #[must_use]
    pub const fn all() -> [Self; 10] {
        [
            Self::Red,
            Self::Green,
            Self::Blue,
            Self::Yellow,
            Self::Orange,
            Self::Purple,
            Self::Pink,
            Self::Cyan,
            Self::WarmWhite,
            Self::CoolWhite,
        ]
    }

    /// The xy target for this preset.
    #[must_use]
    pub const fn xy(self) -> ColourXY {
        match self {
            Self::Red => ColourXY::new(0.68, 0.31),
            Self::Green => ColourXY::new(0.17, 0.70),
            Self::Blue => ColourXY::new(0.15, 0.06),
            Self::Yellow => ColourXY::new(0.44, 0.52),
            Self::Orange => ColourXY::new(0.58, 0.40),
            Self::Purple => ColourXY::new(0.27, 0.12),
            Self::Pink => ColourXY::new(0.50, 0.25),
            Self::Cyan => ColourXY::new(0.15, 0.35),
            Self::WarmWhite => ColourXY::new(0.46, 0.41),
            Self::CoolWhite => ColourXY::new(0.31, 0.32),
        }
    }

    /// The snake_case name used in persisted records.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Purple => "purple",
            Self::Pink => "pink",
            Self::Cyan => "cyan",
            Self::WarmWhite => "warm_white",
            Self::CoolWhite => "cool_white",
        }
    }
}

impl std::fmt::Display for ColourPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing an unknown preset name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown colour preset {0:?}")]
pub struct UnknownPresetError(pub String);

impl FromStr for ColourPreset {
    type Err = UnknownPresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| UnknownPresetError(s.to_string()))
    }
}
