//! Pixel types and the [`Pixel`] trait.

use crate::{Error, Result};
use num_traits::PrimInt;
use std::fmt;

/// Represents any type of pixel in an image.
///
/// Every pixel type can be losslessly built from, and viewed as, an [`Rgba`] value. This is what
/// allows decoders to produce images of any pixel type.
pub trait Pixel: Copy + Clone + Default + PartialEq + Eq + fmt::Debug {
    /// Returns the alpha, or opacity level of the pixel.
    ///
    /// This is a value between 0 and 255.
    /// 0 is completely transparent, and 255 is completely opaque.
    fn alpha(&self) -> u8;

    /// Creates this pixel type from an RGBA pixel. Channels the pixel type cannot represent are
    /// discarded.
    fn from_rgba(rgba: Rgba) -> Self;

    /// Returns this pixel as an RGBA pixel.
    fn as_rgba(&self) -> Rgba;
}

/// Converts a single channel, rejecting anything outside of `0..=255`.
fn checked_channel<T: PrimInt>(channel: &'static str, value: T) -> Result<u8> {
    value.to_u8().ok_or_else(|| Error::InvalidChannelValue {
        channel,
        value: value.to_i128().unwrap_or(i128::MAX),
    })
}

/// Represents an RGB pixel.
///
/// This is also the type of every entry in a GIF color table.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// The red component of the pixel.
    pub r: u8,
    /// The green component of the pixel.
    pub g: u8,
    /// The blue component of the pixel.
    pub b: u8,
}

impl Pixel for Rgb {
    fn alpha(&self) -> u8 {
        255
    }

    fn from_rgba(rgba: Rgba) -> Self {
        rgba.into()
    }

    fn as_rgba(&self) -> Rgba {
        (*self).into()
    }
}

impl Rgb {
    /// Creates a new RGB pixel.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Creates a new RGB pixel from any integer type.
    ///
    /// # Errors
    /// * `InvalidChannelValue`: One of the channels is not between 0 and 255.
    pub fn try_new<T: PrimInt>(r: T, g: T, b: T) -> Result<Self> {
        Ok(Self::new(
            checked_channel("r", r)?,
            checked_channel("g", g)?,
            checked_channel("b", b)?,
        ))
    }

    /// Creates a completely black pixel.
    #[must_use]
    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Creates a completely white pixel.
    #[must_use]
    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }
}

/// Represents an RGBA pixel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// The red component of the pixel.
    pub r: u8,
    /// The green component of the pixel.
    pub g: u8,
    /// The blue component of the pixel.
    pub b: u8,
    /// The alpha component of the pixel.
    pub a: u8,
}

impl Pixel for Rgba {
    fn alpha(&self) -> u8 {
        self.a
    }

    fn from_rgba(rgba: Rgba) -> Self {
        rgba
    }

    fn as_rgba(&self) -> Rgba {
        *self
    }
}

impl Rgba {
    /// Creates a new RGBA pixel.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a fully opaque pixel from the given red, green and blue channels.
    #[must_use]
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Creates a new RGBA pixel from any integer type.
    ///
    /// # Errors
    /// * `InvalidChannelValue`: One of the channels is not between 0 and 255. Values are never
    ///   clamped or wrapped.
    pub fn try_new<T: PrimInt>(r: T, g: T, b: T, a: T) -> Result<Self> {
        Ok(Self::new(
            checked_channel("r", r)?,
            checked_channel("g", g)?,
            checked_channel("b", b)?,
            checked_channel("a", a)?,
        ))
    }

    /// Creates a fully opaque pixel from any integer type.
    ///
    /// # Errors
    /// * `InvalidChannelValue`: One of the channels is not between 0 and 255.
    pub fn try_from_rgb<T: PrimInt>(r: T, g: T, b: T) -> Result<Self> {
        Rgb::try_new(r, g, b).map(Self::from)
    }

    /// Creates a completely transparent pixel.
    #[must_use]
    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Creates an opaque black pixel.
    #[must_use]
    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    /// Creates an opaque white pixel.
    #[must_use]
    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }
}

impl From<Rgb> for Rgba {
    fn from(Rgb { r, g, b }: Rgb) -> Self {
        Self::from_rgb(r, g, b)
    }
}

impl From<Rgba> for Rgb {
    fn from(Rgba { r, g, b, .. }: Rgba) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Rgb({}, {}, {})", self.r, self.g, self.b)
    }
}
