use std::ops::{ Add, Mul };

use serde::{ Serialize, Deserialize };

use crate::feq;
use crate::error::{ RenderError, Result };

/// A color in linear radiance units.
///
/// Shading works on unbounded channel values; `clamp` pulls them back into
/// the displayable `[0, 1]` range. Equality is approximate.
///
/// # Examples
///
/// ```
/// # use ellipsoid_raycaster::color::Color;
/// let hot = Color::rgb(1.7, 0.4, -0.2);
/// assert_eq!(hot.clamp(), Color::rgb(1.0, 0.4, 0.0));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialOrd, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl PartialEq for Color {
    fn eq(&self, other: &Color) -> bool {
        feq(self.r, other.r) &&
            feq(self.g, other.g) &&
            feq(self.b, other.b)
    }
}

impl From<[f64; 3]> for Color {
    fn from(v: [f64; 3]) -> Color {
        Color { r: v[0], g: v[1], b: v[2] }
    }
}

impl From<Color> for [f64; 3] {
    fn from(c: Color) -> [f64; 3] {
        [c.r, c.g, c.b]
    }
}

impl Color {
    /// Creates a color with red, green and blue values.
    pub fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    pub fn black() -> Color {
        Color::rgb(0.0, 0.0, 0.0)
    }

    pub fn white() -> Color {
        Color::rgb(1.0, 1.0, 1.0)
    }

    /// Hard-clips every channel to `[0, 1]`.
    ///
    /// Channels are clipped independently, never rescaled. A NaN channel
    /// carries no light and becomes 0.
    pub fn clamp(&self) -> Color {
        fn clip(c: f64) -> f64 {
            if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) }
        }

        Color { r: clip(self.r), g: clip(self.g), b: clip(self.b) }
    }

    /// Whether every channel lies in `[0, 1]`.
    pub fn is_unit(&self) -> bool {
        [self.r, self.g, self.b].iter().all(|c| (0.0..=1.0).contains(c))
    }

    /// Computes the Hadamard (channel-wise) product of two colors.
    pub fn hadamard(c1: &Color, c2: &Color) -> Color {
        Color { r: c1.r * c2.r, g: c1.g * c2.g, b: c1.b * c2.b }
    }
}

impl Add<Color> for Color {
    type Output = Color;

    fn add(self, other: Color) -> Self::Output {
        Color {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
        }
    }
}

impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, other: f64) -> Self::Output {
        Color {
            r: self.r * other,
            g: self.g * other,
            b: self.b * other,
        }
    }
}

impl Mul<Color> for Color {
    type Output = Color;

    fn mul(self, other: Color) -> Self::Output {
        Color::hadamard(&self, &other)
    }
}

/// A display pixel: four channels in the sink's native `0..=255` range.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Fully opaque black, the color of rays that hit nothing.
    pub const BACKGROUND: Rgba = Rgba { r: 0, g: 0, b: 0, a: 255 };

    /// Builds a pixel from raw channel values, rejecting anything that is
    /// not a number in `[0, 255]`.
    ///
    /// Fractional values are rounded to the nearest integer.
    ///
    /// ```
    /// # use ellipsoid_raycaster::color::Rgba;
    /// assert!(Rgba::try_new(12.0, 255.0, 0.0, 255.0).is_ok());
    /// assert!(Rgba::try_new(256.0, 0.0, 0.0, 255.0).is_err());
    /// assert!(Rgba::try_new(0.0, f64::NAN, 0.0, 255.0).is_err());
    /// ```
    pub fn try_new(r: f64, g: f64, b: f64, a: f64) -> Result<Rgba> {
        fn channel(name: char, value: f64) -> Result<u8> {
            if value.is_nan() || value < 0.0 || value > 255.0 {
                return Err(RenderError::InvalidColorComponent {
                    channel: name,
                    value,
                });
            }

            Ok(value.round() as u8)
        }

        Ok(Rgba {
            r: channel('r', r)?,
            g: channel('g', g)?,
            b: channel('b', b)?,
            a: channel('a', a)?,
        })
    }

    /// Scales a `[0, 1]` color to display range, fully opaque.
    ///
    /// Fails when the color has escaped `[0, 1]`, which means shading skipped
    /// its clamp.
    pub fn from_color(color: &Color) -> Result<Rgba> {
        Rgba::try_new(color.r * 255.0, color.g * 255.0, color.b * 255.0, 255.0)
    }
}

#[test]
fn add_colors() {
    let c1 = Color::rgb(0.9, 0.6, 0.75);
    let c2 = Color::rgb(0.7, 0.1, 0.25);

    assert_eq!(c1 + c2, Color::rgb(1.6, 0.7, 1.0));
}

#[test]
fn multiply_colors() {
    let c1 = Color::rgb(1.0, 0.2, 0.4);
    let c2 = Color::rgb(0.9, 1.0, 0.1);

    assert_eq!(c1 * c2, Color::rgb(0.9, 0.2, 0.04));
    assert_eq!(c1 * 2.0, Color::rgb(2.0, 0.4, 0.8));
}

#[test]
fn clamp_clips_instead_of_scaling() {
    let c = Color::rgb(2.0, 0.5, -3.0).clamp();

    assert_eq!(c, Color::rgb(1.0, 0.5, 0.0));
    assert!(c.is_unit());
}

#[test]
fn clamp_nan_is_dark() {
    let c = Color::rgb(f64::NAN, 0.25, f64::INFINITY).clamp();

    assert_eq!(c, Color::rgb(0.0, 0.25, 1.0));
}

#[test]
fn rgba_from_unit_color() {
    let px = Rgba::from_color(&Color::rgb(1.0, 0.5, 0.0)).unwrap();

    assert_eq!(px, Rgba { r: 255, g: 128, b: 0, a: 255 });
}

#[test]
fn rgba_rejects_out_of_range() {
    match Rgba::try_new(0.0, -1.0, 0.0, 255.0) {
        Err(RenderError::InvalidColorComponent { channel, value }) => {
            assert_eq!(channel, 'g');
            assert_eq!(value, -1.0);
        },
        other => panic!("expected InvalidColorComponent, got {:?}", other),
    }

    assert!(Rgba::from_color(&Color::rgb(1.5, 0.0, 0.0)).is_err());
}

#[test]
fn color_from_json_array() {
    let c: Color = serde_json::from_str("[0.1, 0.2, 0.3]").unwrap();

    assert_eq!(c, Color::rgb(0.1, 0.2, 0.3));
}
