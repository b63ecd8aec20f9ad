//! Mapping of scalar values to palette colors.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Mesh, PaletteError};

/// An RGBA color with components in the range `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Color {
    /// The red component
    pub r: f32,
    /// The green component
    pub g: f32,
    /// The blue component
    pub b: f32,
    /// The alpha component
    pub a: f32,
}

impl Color {
    /// Opaque black
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque white
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque red
    pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);
    /// Opaque green
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0, 1.0);
    /// Opaque blue
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);

    /// Creates a new color.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    /// Creates a color from 8 bit components.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        let scale = |c: u8| f32::from(c) / 255.0;
        Color::new(scale(r), scale(g), scale(b), scale(a))
    }

    /// Returns the color as 8 bit components, rounding to the nearest value.
    pub fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a].map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    /// Blends component wise between `self` (`t == 0`) and `other` (`t == 1`).
    pub fn lerp(self, other: Color, t: f32) -> Self {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Color::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

/// Determines how a [PaletteColorMapper] picks colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub enum InterpolationMode {
    /// Every value receives the color of its bin.
    #[default]
    Nearest,
    /// Colors are placed at the center of their bin, values in between are blended.
    ///
    /// Values in the lower half of the first bin receive the first color and values in
    /// the upper half of the last bin receive the last color.
    Linear,
}

/// Maps scalar values to the colors of a palette.
///
/// The value range `min..=max` is split into one equally sized bin per palette color. Bin
/// `i` of a value is `floor((value - min) / ((max - min) / k))` for a palette of `k` colors,
/// clamped to `0..k`. Values outside of the range receive the first or last color.
///
/// # Example
/// ```
/// use isomesh::{Color, InterpolationMode, PaletteColorMapper, PaletteError};
///
/// fn main() -> Result<(), PaletteError> {
///     let mapper = PaletteColorMapper::new(
///         vec![Color::RED, Color::BLUE],
///         0.0,
///         10.0,
///         InterpolationMode::Linear,
///     )?;
///     assert_eq!(mapper.map(5.0), Color::new(0.5, 0.0, 0.5, 1.0));
///     assert_eq!(mapper.map(-3.0), Color::RED);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct PaletteColorMapper {
    palette: Vec<Color>,
    min: f64,
    max: f64,
    mode: InterpolationMode,
}

impl PaletteColorMapper {
    /// Creates a mapper for the value range `min..=max`.
    ///
    /// Fails if the palette is empty or if the range is reversed or not finite. A range
    /// with `min == max` maps every value to the first color.
    pub fn new(
        palette: Vec<Color>,
        min: f64,
        max: f64,
        mode: InterpolationMode,
    ) -> Result<Self, PaletteError> {
        if palette.is_empty() {
            return Err(PaletteError::EmptyPalette);
        }
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(PaletteError::InvalidRange);
        }
        Ok(PaletteColorMapper {
            palette,
            min,
            max,
            mode,
        })
    }

    /// Creates a mapper spanning the range of `values`.
    ///
    /// Fails with [PaletteError::InvalidRange] if `values` is empty or contains non finite
    /// values.
    pub fn fitted(
        palette: Vec<Color>,
        values: &[f64],
        mode: InterpolationMode,
    ) -> Result<Self, PaletteError> {
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
                (min.min(*value), max.max(*value))
            });
        if values.iter().any(|value| !value.is_finite()) {
            return Err(PaletteError::InvalidRange);
        }
        Self::new(palette, min, max, mode)
    }

    /// Returns the palette.
    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    /// Returns the value range as `(min, max)`.
    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Returns the interpolation mode.
    pub fn mode(&self) -> InterpolationMode {
        self.mode
    }

    /// Returns the index of the palette bin `value` falls into.
    pub fn bin(&self, value: f64) -> usize {
        let bin = self.scaled(value).floor();
        if bin.is_nan() || bin < 0.0 {
            0
        } else {
            (bin as usize).min(self.palette.len() - 1)
        }
    }

    /// Returns the color of a single value.
    pub fn map(&self, value: f64) -> Color {
        match self.mode {
            InterpolationMode::Nearest => self.palette[self.bin(value)],
            InterpolationMode::Linear => {
                let last = self.palette.len() - 1;
                // Distance from the center of the first bin, in bins
                let position = self.scaled(value) - 0.5;
                if position.is_nan() || position <= 0.0 {
                    self.palette[0]
                } else if position >= last as f64 {
                    self.palette[last]
                } else {
                    let index = position.floor() as usize;
                    let fraction = (position - index as f64) as f32;
                    self.palette[index].lerp(self.palette[index + 1], fraction)
                }
            }
        }
    }

    /// Returns the colors of all values, in order.
    pub fn map_all(&self, values: &[f64]) -> Vec<Color> {
        values.iter().map(|value| self.map(*value)).collect()
    }

    /// Returns one color per mesh point, indexed by point id.
    ///
    /// `values` must hold one sample per point of `mesh`.
    pub fn vertex_colors(&self, mesh: &Mesh, values: &[f64]) -> Result<Vec<Color>, PaletteError> {
        if values.len() != mesh.point_count() {
            return Err(PaletteError::InconsistentField {
                expected: mesh.point_count(),
                actual: values.len(),
            });
        }
        Ok(self.map_all(values))
    }

    /// Returns the value's offset from `min`, measured in bins.
    fn scaled(&self, value: f64) -> f64 {
        let width = (self.max - self.min) / self.palette.len() as f64;
        if width > 0.0 {
            (value - self.min) / width
        } else {
            0.0
        }
    }
}
