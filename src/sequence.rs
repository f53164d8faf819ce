//! Implements the animated image and image sequence interface.

use crate::{Error, FrameIterator, Image, ImageFormat, Pixel, Result};
use std::{fs::File, io::Read, path::Path, time::Duration};

/// The method used to dispose a frame before transitioning to the next frame in an image sequence.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DisposalMethod {
    /// No disposal was specified. The frame is left in place, just like [`Self::Keep`].
    #[default]
    None,
    /// Do not dispose the current frame. Usually not desired for transparent images.
    Keep,
    /// Dispose the current frame's region completely and replace it with the image's background
    /// color.
    Background,
    /// Dispose and replace the current frame's region with what was there before the frame was
    /// drawn.
    Previous,
}

impl DisposalMethod {
    /// Resolves the disposal method from its 3-bit GIF code. Reserved codes are treated as
    /// [`Self::None`].
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Keep,
            2 => Self::Background,
            3 => Self::Previous,
            _ => Self::None,
        }
    }
}

/// Represents a frame in an image sequence. It encloses an [`Image`] and extra metadata
/// about the frame.
///
/// The image of a decoded frame always spans the full logical screen of the sequence, with all
/// previous frames already composited into it.
///
/// # See Also
/// * [`ImageSequence`] for more information about image sequences.
#[derive(Clone, Debug)]
pub struct Frame<P: Pixel> {
    inner: Image<P>,
    delay: Duration,
    disposal: DisposalMethod,
}

impl<P: Pixel> Frame<P> {
    /// Creates a new frame with the given image and default metadata.
    #[must_use]
    pub fn from_image(image: Image<P>) -> Self {
        Self {
            inner: image,
            delay: Duration::default(),
            disposal: DisposalMethod::default(),
        }
    }

    /// Takes this frame and sets the frame delay to the given duration.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Takes this frame and sets the disposal method for this frame when transitioning to the next.
    #[must_use]
    pub const fn with_disposal(mut self, disposal: DisposalMethod) -> Self {
        self.disposal = disposal;
        self
    }

    /// Returns a reference to the image this frame contains.
    #[must_use]
    pub const fn image(&self) -> &Image<P> {
        &self.inner
    }

    /// Returns a mutable reference to the image this frame contains.
    pub fn image_mut(&mut self) -> &mut Image<P> {
        &mut self.inner
    }

    /// Consumes this frame returning the inner image it represents.
    #[allow(clippy::missing_const_for_fn)] // can't use destructors with const fn
    #[must_use]
    pub fn into_image(self) -> Image<P> {
        self.inner
    }

    /// Returns the delay duration for this frame.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the disposal method for this frame.
    #[must_use]
    pub const fn disposal(&self) -> DisposalMethod {
        self.disposal
    }
}

impl<P: Pixel> From<Image<P>> for Frame<P> {
    fn from(image: Image<P>) -> Self {
        Self::from_image(image)
    }
}

impl<P: Pixel> From<Frame<P>> for Image<P> {
    fn from(frame: Frame<P>) -> Self {
        frame.into_image()
    }
}

impl<P: Pixel> std::ops::Deref for Frame<P> {
    type Target = Image<P>;

    fn deref(&self) -> &Self::Target {
        self.image()
    }
}

/// Determines how many times an image sequence should repeat itself, or if it
/// should repeat infinitely.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoopCount {
    /// Loops infinitely.
    #[default]
    Infinite,
    /// Loops the specified amount of times.
    Exactly(u32),
}

impl LoopCount {
    /// Returns the exact number of times this loop should be repeated or 0.
    #[must_use]
    pub const fn count_or_zero(self) -> u32 {
        match self {
            Self::Infinite => 0,
            Self::Exactly(count) => count,
        }
    }
}

/// Represents a sequence of image frames such as an animated image.
///
/// This is the eager counterpart of a [`FrameIterator`]: every frame has already been decoded.
///
/// # See Also
/// * [`Image`] for the static image counterpart
/// * [`Frame`] to see how each frame is represented in an image sequence.
#[derive(Clone, Debug, Default)]
pub struct ImageSequence<P: Pixel> {
    frames: Vec<Frame<P>>,
    loops: LoopCount,
}

impl<P: Pixel> IntoIterator for ImageSequence<P> {
    type Item = Frame<P>;
    type IntoIter = std::vec::IntoIter<Frame<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl<P: Pixel> FromIterator<Frame<P>> for ImageSequence<P> {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = Frame<P>>,
    {
        Self::from_frames(iter.into_iter().collect())
    }
}

impl<P: Pixel> ImageSequence<P> {
    /// Creates a new image sequence with no frames.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the image sequence with the explicitly given image encoding from the raw byte
    /// reader.
    ///
    /// This decodes frames lazily as an iterator. Call [`FrameIterator::into_sequence`] to
    /// collect all frames greedily into an [`ImageSequence`].
    ///
    /// # Errors
    /// * The header of the stream could not be decoded, maybe it is corrupt.
    /// * `UnknownEncodingFormat`: There is no decoder for the given format.
    pub fn from_read<'a, R: Read + 'a>(
        format: ImageFormat,
        bytes: R,
    ) -> Result<Box<dyn FrameIterator<P> + 'a>>
    where
        P: 'a,
    {
        format.run_sequence_decoder(bytes)
    }

    /// Decodes an image sequence with the explicitly given image encoding from the byte slice.
    /// Could be useful in conjunction with the `include_bytes!` macro.
    ///
    /// This decodes frames lazily as an iterator. Call [`FrameIterator::into_sequence`] to
    /// collect all frames greedily into an [`ImageSequence`].
    ///
    /// # Errors
    /// * The header of the stream could not be decoded, maybe it is corrupt.
    /// * `UnknownEncodingFormat`: There is no decoder for the given format.
    pub fn from_bytes<'a>(
        format: ImageFormat,
        bytes: &'a [u8],
    ) -> Result<Box<dyn FrameIterator<P> + 'a>>
    where
        P: 'a,
    {
        format.run_sequence_decoder(bytes)
    }

    /// Decodes an image sequence from the given byte slice, inferring its encoding.
    ///
    /// This decodes frames lazily as an iterator. Call [`FrameIterator::into_sequence`] to
    /// collect all frames greedily into an [`ImageSequence`].
    ///
    /// # Errors
    /// * The header of the stream could not be decoded, maybe it is corrupt.
    /// * `UnknownEncodingFormat`: Could not infer the encoding from the image. Try explicitly
    ///   specifying it.
    pub fn from_bytes_inferred<'a>(bytes: &'a [u8]) -> Result<Box<dyn FrameIterator<P> + 'a>>
    where
        P: 'a,
    {
        match ImageFormat::infer_encoding(bytes) {
            ImageFormat::Unknown => Err(Error::UnknownEncodingFormat),
            format => format.run_sequence_decoder(bytes),
        }
    }

    /// Opens a file from the given path and decodes it, returning an iterator over its frames.
    ///
    /// The encoding of the image is inferred from the file extension, falling back to the
    /// contents of the file.
    ///
    /// # Errors
    /// * An error occured while reading the file.
    /// * The header of the stream could not be decoded.
    pub fn open<'a>(path: impl AsRef<Path>) -> Result<Box<dyn FrameIterator<P> + 'a>>
    where
        P: 'a,
    {
        let mut file = File::open(path.as_ref())?;

        match ImageFormat::from_path(path) {
            ImageFormat::Unknown => {
                let mut buffer = Vec::new();
                file.read_to_end(&mut buffer)?;

                match ImageFormat::infer_encoding(&buffer) {
                    ImageFormat::Unknown => Err(Error::UnknownEncodingFormat),
                    format => format.run_sequence_decoder(std::io::Cursor::new(buffer)),
                }
            }
            format => format.run_sequence_decoder(std::io::BufReader::new(file)),
        }
    }

    /// Creates a new image sequence from the given frames.
    #[must_use]
    pub fn from_frames(frames: Vec<Frame<P>>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    /// Adds a new frame to this image sequence and returns this sequence. Useful for
    /// method-chaining.
    #[must_use]
    pub fn with_frame(mut self, frame: Frame<P>) -> Self {
        self.frames.push(frame);
        self
    }

    /// Adds a new frame to this image sequence.
    pub fn push_frame(&mut self, frame: Frame<P>) {
        self.frames.push(frame);
    }

    /// Returns how many times this image sequence loops for.
    #[must_use]
    pub const fn loop_count(&self) -> LoopCount {
        self.loops
    }

    /// Takes this image and sets how many times this image sequence loops for.
    #[must_use]
    pub const fn with_loop_count(mut self, loops: LoopCount) -> Self {
        self.loops = loops;
        self
    }

    /// Consumes this image sequence and returns the frames it contains.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn into_frames(self) -> Vec<Frame<P>> {
        self.frames
    }

    /// Iterates through the frames in this image sequence by reference.
    pub fn iter(&self) -> impl Iterator<Item = &Frame<P>> {
        self.frames.iter()
    }

    /// Returns whether there are no frames in the image sequence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns the number of frames in this image sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Consumes this image sequence and returns the first image.
    ///
    /// # Errors
    /// * `EmptyImageError`: The image sequence is empty.
    pub fn into_first_image(self) -> Result<Image<P>> {
        self.frames
            .into_iter()
            .next()
            .map(Frame::into_image)
            .ok_or(Error::EmptyImageError)
    }

    /// Returns a reference to the first frame in the image sequence, if any.
    #[must_use]
    pub fn first_frame(&self) -> Option<&Frame<P>> {
        self.frames.first()
    }
}
