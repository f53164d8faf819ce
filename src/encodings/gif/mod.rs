//! A from-scratch GIF87a/GIF89a decoder that composites every image block onto a persistent
//! canvas.

mod block;
mod lzw;

pub use block::{
    ColorTable, GifReader, GraphicControlExtension, ImageDescriptor, LogicalScreenDescriptor,
    RawFrame, ResolvedPalette, Version,
};

use crate::{
    Decoder, DisposalMethod, Error, Frame, FrameIterator, Image, ImageFormat, LoopCount, Pixel,
    Rgba,
};
use log::debug;
use std::{io::Read, iter::FusedIterator, marker::PhantomData, mem::size_of};

const DEFAULT_MEMORY_LIMIT: usize = 256 * 1024 * 1024;

/// A decoder for GIF images.
pub struct GifDecoder<P: Pixel, R: Read> {
    memory_limit: Option<usize>,
    _marker: PhantomData<(P, R)>,
}

impl<P: Pixel, R: Read> GifDecoder<P, R> {
    /// Creates a new decoder with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            memory_limit: Some(DEFAULT_MEMORY_LIMIT),
            _marker: PhantomData,
        }
    }

    /// Sets the maximum amount of bytes the decoder may allocate for the canvas, the disposal
    /// snapshot and a single frame. `None` removes the limit. Defaults to 256 MiB.
    #[must_use]
    pub const fn with_memory_limit(mut self, limit: Option<usize>) -> Self {
        self.memory_limit = limit;
        self
    }

    fn check_limits(&self, screen: &LogicalScreenDescriptor) -> crate::Result<()> {
        let Some(limit) = self.memory_limit else {
            return Ok(());
        };

        // canvas + snapshot + palette indices of a frame covering the whole screen
        let area = screen.width as usize * screen.height as usize;
        let required = area.saturating_mul(2 * size_of::<Rgba>() + 1);

        if required > limit {
            return Err(Error::DecodingError(format!(
                "a {}x{} logical screen needs {required} bytes, over the limit of {limit}",
                screen.width, screen.height,
            )));
        }
        Ok(())
    }
}

impl<P: Pixel, R: Read> Default for GifDecoder<P, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Pixel, R: Read> Decoder<P, R> for GifDecoder<P, R> {
    type Sequence = GifFrameIterator<P, R>;

    fn decode(&mut self, stream: R) -> crate::Result<Image<P>> {
        let mut frames = self.decode_sequence(stream)?;

        frames
            .next()
            .ok_or(Error::EmptyImageError)?
            .map(Frame::into_image)
    }

    fn decode_sequence(&mut self, stream: R) -> crate::Result<Self::Sequence> {
        let reader = GifReader::new(stream)?;
        self.check_limits(reader.screen_descriptor())?;

        let screen = reader.screen_descriptor();
        let background = reader.background_color();
        let canvas = Image::new(u32::from(screen.width), u32::from(screen.height), background)?;

        Ok(GifFrameIterator {
            reader,
            canvas,
            background,
            snapshot: None,
            previous: None,
            finished: false,
            _marker: PhantomData,
        })
    }
}

/// Lazily decodes and composites the frames of a GIF stream.
///
/// Every yielded frame is a full copy of the canvas after the frame was drawn. The iterator is
/// fused: after the trailer or the first error, it only yields `None`.
pub struct GifFrameIterator<P: Pixel, R: Read> {
    reader: GifReader<R>,
    canvas: Image<Rgba>,
    background: Rgba,
    snapshot: Option<Image<Rgba>>,
    previous: Option<(ImageDescriptor, DisposalMethod)>,
    finished: bool,
    _marker: PhantomData<P>,
}

impl<P: Pixel, R: Read> GifFrameIterator<P, R> {
    /// The logical screen descriptor of the stream.
    #[must_use]
    pub const fn screen_descriptor(&self) -> &LogicalScreenDescriptor {
        self.reader.screen_descriptor()
    }

    /// The global color table of the stream, if any.
    #[must_use]
    pub const fn global_color_table(&self) -> Option<&ColorTable> {
        self.reader.global_color_table()
    }

    /// The color the canvas is initialized with and restored to.
    #[must_use]
    pub const fn background_color(&self) -> Rgba {
        self.background
    }

    /// Undoes the previous frame according to its disposal method.
    fn dispose_previous(&mut self) -> crate::Result<()> {
        let Some((descriptor, disposal)) = self.previous.take() else {
            return Ok(());
        };
        let (left, top, width, height) = descriptor.bounds();

        match disposal {
            DisposalMethod::None | DisposalMethod::Keep => Ok(()),
            DisposalMethod::Background => {
                self.canvas.fill_region(left, top, width, height, self.background)
            }
            DisposalMethod::Previous => match self.snapshot.take() {
                Some(snapshot) => self.canvas.copy_region_from(&snapshot, left, top, width, height),
                None => Ok(()),
            },
        }
    }

    /// Draws the frame onto the canvas, leaving pixels with the transparent index untouched.
    fn draw(&mut self, frame: &RawFrame) -> crate::Result<()> {
        let palette = frame.resolve_palette(self.reader.global_color_table())?;
        let (left, top, width, _) = frame.descriptor.bounds();

        for (y, row) in frame.indices.chunks_exact(width as usize).enumerate() {
            let start = self.canvas.resolve_coordinate(left, top + y as u32);
            let target = &mut self.canvas.data[start..start + width as usize];

            for (pixel, &index) in target.iter_mut().zip(row) {
                if let Some(color) = palette.lookup(index)? {
                    *pixel = color;
                }
            }
        }
        Ok(())
    }

    fn composite(&mut self, frame: RawFrame) -> crate::Result<Frame<P>> {
        self.dispose_previous()?;

        let disposal = frame.disposal();
        if disposal == DisposalMethod::Previous {
            self.snapshot = Some(self.canvas.clone());
        }

        self.draw(&frame)?;
        self.previous = Some((frame.descriptor, disposal));

        let (left, top, width, height) = frame.descriptor.bounds();
        debug!(
            "composited {width}x{height} frame at ({left}, {top}), {disposal:?}, {:?}",
            frame.delay(),
        );

        let mut image = self.canvas.clone().convert::<P>();
        image.set_format(ImageFormat::Gif);

        Ok(Frame::from_image(image)
            .with_delay(frame.delay())
            .with_disposal(disposal))
    }

    fn next_frame(&mut self) -> crate::Result<Option<Frame<P>>> {
        match self.reader.next_frame()? {
            Some(frame) => self.composite(frame).map(Some),
            None => Ok(None),
        }
    }
}

impl<P: Pixel, R: Read> FrameIterator<P> for GifFrameIterator<P, R> {
    fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    fn loop_count(&self) -> LoopCount {
        self.reader.loop_count()
    }
}

impl<P: Pixel, R: Read> Iterator for GifFrameIterator<P, R> {
    type Item = crate::Result<Frame<P>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = self.next_frame().transpose();
        if !matches!(result, Some(Ok(_))) {
            self.finished = true;
        }
        result
    }
}

impl<P: Pixel, R: Read> FusedIterator for GifFrameIterator<P, R> {}
