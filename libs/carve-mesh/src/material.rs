//! # Colors and Materials
//!
//! RGBA colors (hex literals and named constants) and the per-polygon
//! material record.

use serde::{Deserialize, Serialize};

use crate::math::approx_eq;

// =============================================================================
// COLOR
// =============================================================================

/// An RGBA color with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const GRAY: Color = Color::rgb(0.5, 0.5, 0.5);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);
    pub const CYAN: Color = Color::rgb(0.0, 1.0, 1.0);
    pub const MAGENTA: Color = Color::rgb(1.0, 0.0, 1.0);
    pub const ORANGE: Color = Color::rgb(1.0, 0.5, 0.0);
    pub const CLEAR: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a color from RGBA components.
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Looks up a named color constant.
    pub fn named(name: &str) -> Option<Color> {
        match name {
            "white" => Some(Self::WHITE),
            "black" => Some(Self::BLACK),
            "gray" | "grey" => Some(Self::GRAY),
            "red" => Some(Self::RED),
            "green" => Some(Self::GREEN),
            "blue" => Some(Self::BLUE),
            "yellow" => Some(Self::YELLOW),
            "cyan" => Some(Self::CYAN),
            "magenta" => Some(Self::MAGENTA),
            "orange" => Some(Self::ORANGE),
            _ => None,
        }
    }

    /// Parses a `#RGB`, `#RGBA`, `#RRGGBB`, or `#RRGGBBAA` hex literal.
    ///
    /// The leading `#` is optional. Returns `None` for any other shape.
    ///
    /// # Example
    ///
    /// ```rust
    /// use carve_mesh::Color;
    ///
    /// assert_eq!(Color::from_hex("#f00"), Some(Color::RED));
    /// assert_eq!(Color::from_hex("#ff0000ff"), Some(Color::RED));
    /// assert_eq!(Color::from_hex("#12345"), None);
    /// ```
    pub fn from_hex(text: &str) -> Option<Color> {
        let hex = text.strip_prefix('#').unwrap_or(text);
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()?;
        let (r, g, b, a) = match digits.len() {
            3 => (digits[0] * 17, digits[1] * 17, digits[2] * 17, 255),
            4 => (digits[0] * 17, digits[1] * 17, digits[2] * 17, digits[3] * 17),
            6 => (
                digits[0] * 16 + digits[1],
                digits[2] * 16 + digits[3],
                digits[4] * 16 + digits[5],
                255,
            ),
            8 => (
                digits[0] * 16 + digits[1],
                digits[2] * 16 + digits[3],
                digits[4] * 16 + digits[5],
                digits[6] * 16 + digits[7],
            ),
            _ => return None,
        };
        Some(Color::new(
            r as f64 / 255.0,
            g as f64 / 255.0,
            b as f64 / 255.0,
            a as f64 / 255.0,
        ))
    }

    /// Returns a copy with the alpha multiplied by `opacity`.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.a *= opacity.clamp(0.0, 1.0);
        self
    }

    /// Component-wise linear interpolation.
    pub fn lerp(&self, other: &Color, t: f64) -> Color {
        Color::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }

    /// Tolerant equality.
    pub fn approx_eq(&self, other: &Color) -> bool {
        approx_eq(self.r, other.r)
            && approx_eq(self.g, other.g)
            && approx_eq(self.b, other.b)
            && approx_eq(self.a, other.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

// =============================================================================
// MATERIAL
// =============================================================================

/// Texture reference resolved by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Texture {
    /// Host-resolved location of the image.
    pub path: String,
}

/// Surface material attached to polygons.
///
/// `None` fields inherit from the scene default at render time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Material {
    /// Base color, if set.
    pub color: Option<Color>,
    /// Texture, if set. Takes precedence over `color` for hosts that
    /// support it.
    pub texture: Option<Texture>,
    /// Opacity multiplier in [0, 1]; `None` means opaque.
    pub opacity: Option<f64>,
}

impl Material {
    /// Material with just a color.
    pub fn color(color: Color) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }

    /// Returns true when no field is set.
    pub fn is_default(&self) -> bool {
        self.color.is_none() && self.texture.is_none() && self.opacity.is_none()
    }
}

// =============================================================================
// TESTS
// =============================================================================
