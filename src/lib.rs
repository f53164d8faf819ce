//! An in-memory RGBA image core with a streaming, compositing GIF decoder.
//!
//! ```no_run
//! use ril_gif::prelude::*;
//!
//! # fn main() -> ril_gif::Result<()> {
//! for frame in ImageSequence::<Rgba>::open("sample.gif")? {
//!     let frame = frame?;
//!     println!("{:?} for {:?}", frame.dimensions(), frame.delay());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::cast_possible_truncation)]

pub mod decode;
pub mod encodings;
pub mod error;
pub mod format;
pub mod image;
pub mod pixel;
pub mod sequence;

pub use decode::{Decoder, FrameIterator};
pub use error::{Error, Result};
pub use format::ImageFormat;
pub use image::Image;
pub use pixel::{Pixel, Rgb, Rgba};
pub use sequence::{DisposalMethod, Frame, ImageSequence, LoopCount};

pub mod prelude {
    pub use super::{
        DisposalMethod, Frame, FrameIterator, Image, ImageFormat, ImageSequence, LoopCount, Pixel,
        Rgb, Rgba,
    };
}
