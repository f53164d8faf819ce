//! Houses the Decoder and frame iterator traits.

use crate::{Frame, Image, ImageSequence, LoopCount, Pixel};
use std::io::Read;

/// Low-level decoder interface around an image format.
pub trait Decoder<P: Pixel, R: Read> {
    /// The type of the iterator returned by `decode_sequence`.
    type Sequence: FrameIterator<P>;

    /// Decodes the given stream into an image. For animated images, this is the first frame.
    ///
    /// # Errors
    /// * An error occured during decoding.
    fn decode(&mut self, stream: R) -> crate::Result<Image<P>>;

    /// Decodes the given stream into a frame iterator. Only the header of the stream is read
    /// here, frames are decoded as the iterator is advanced.
    ///
    /// # Errors
    /// * An error occured while decoding the header.
    fn decode_sequence(&mut self, stream: R) -> crate::Result<Self::Sequence>;
}

/// Represents the lazy decoding of frames from an encoded image sequence, such as an animated
/// image.
///
/// This is a single forward pass over the source: frames cannot be decoded again once consumed,
/// and after the first error the iterator yields nothing else. Decode the source again to
/// restart.
///
/// # See Also
/// * [`ImageSequence`]
/// * [`Frame`]
pub trait FrameIterator<P: Pixel>: Iterator<Item = crate::Result<Frame<P>>> {
    /// Returns the dimensions of every frame in the sequence, as `(width, height)`.
    fn dimensions(&self) -> (u32, u32);

    /// Returns the amount of times this sequence will loop over itself, as far as is known from
    /// the data decoded so far.
    fn loop_count(&self) -> LoopCount;

    /// Collects all frames in this iterator and turns it into a high level [`ImageSequence`].
    /// If any frame fails, that error is returned and the frames decoded before it are
    /// discarded.
    ///
    /// # Errors
    /// * An error occured during decoding one of the frames.
    fn into_sequence(self: Box<Self>) -> crate::Result<ImageSequence<P>> {
        let mut frames = self;
        let collected = frames.by_ref().collect::<crate::Result<Vec<_>>>()?;

        Ok(ImageSequence::from_frames(collected).with_loop_count(frames.loop_count()))
    }
}
