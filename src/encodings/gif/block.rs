//! Block-level parsing of a GIF stream: header, logical screen, color tables, extensions and
//! image blocks.

use super::lzw::LzwDecoder;
use crate::{DisposalMethod, Error, Image, ImageFormat, LoopCount, Result, Rgb, Rgba};
use log::{debug, trace};
use std::{
    io::{self, Read},
    time::Duration,
};

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_SEPARATOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;

const PLAIN_TEXT_LABEL: u8 = 0x01;
const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
const COMMENT_LABEL: u8 = 0xFE;
const APPLICATION_LABEL: u8 = 0xFF;

/// The version of the GIF format a stream declares in its header.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Version {
    /// `GIF87a`
    Gif87a,
    /// `GIF89a`
    Gif89a,
}

/// Container-level metadata, read once right after the header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LogicalScreenDescriptor {
    /// The width of the canvas every frame is drawn onto.
    pub width: u16,
    /// The height of the canvas every frame is drawn onto.
    pub height: u16,
    /// The packed fields byte.
    pub flags: u8,
    /// The index of the background color in the global color table.
    pub background_index: u8,
    /// The pixel aspect ratio, 0 if no information is given.
    pub pixel_aspect_ratio: u8,
}

impl LogicalScreenDescriptor {
    /// Whether a global color table follows the descriptor.
    #[must_use]
    pub const fn has_global_color_table(&self) -> bool {
        self.flags & 0b1000_0000 != 0
    }

    /// The number of bits per primary color available to the original image.
    #[must_use]
    pub const fn color_resolution(&self) -> u8 {
        ((self.flags & 0b0111_0000) >> 4) + 1
    }

    /// Whether the global color table is sorted by decreasing importance.
    #[must_use]
    pub const fn is_sorted(&self) -> bool {
        self.flags & 0b0000_1000 != 0
    }

    /// The number of entries in the global color table, if it were present.
    #[must_use]
    pub const fn global_color_table_len(&self) -> usize {
        1 << ((self.flags & 0b0000_0111) + 1)
    }
}

/// An ordered table of up to 256 colors, indexed by palette index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorTable(Vec<Rgb>);

impl ColorTable {
    /// Creates a color table from the given colors.
    ///
    /// # Errors
    /// * `DecodingError`: More than 256 colors were given.
    pub fn new(colors: Vec<Rgb>) -> Result<Self> {
        if colors.len() > 256 {
            return Err(Error::DecodingError(format!(
                "a color table holds at most 256 colors, got {}",
                colors.len()
            )));
        }

        Ok(Self(colors))
    }

    fn read<R: Read>(reader: &mut ByteReader<R>, len: usize) -> Result<Self> {
        let mut buffer = vec![0; len * 3];
        reader.read_exact(&mut buffer, "color table")?;

        Ok(Self(
            buffer
                .chunks_exact(3)
                .map(|rgb| Rgb::new(rgb[0], rgb[1], rgb[2]))
                .collect(),
        ))
    }

    /// Returns the color at the given palette index, if any.
    #[must_use]
    pub fn get(&self, index: u8) -> Option<Rgb> {
        self.0.get(index as usize).copied()
    }

    /// Returns the colors of this table.
    #[must_use]
    pub fn colors(&self) -> &[Rgb] {
        &self.0
    }

    /// Returns the number of colors in this table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether this table holds no colors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Per-frame metadata that applies to the next image block in the stream.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphicControlExtension {
    /// How the frame is disposed of before the next frame is drawn.
    pub disposal: DisposalMethod,
    /// Whether user input is expected before continuing.
    pub user_input: bool,
    /// The delay after this frame, in hundredths of a second.
    pub delay: u16,
    /// Pixels with this palette index are not drawn.
    pub transparent_index: Option<u8>,
}

impl GraphicControlExtension {
    fn parse(data: &[u8]) -> Result<Self> {
        let [flags, delay_lo, delay_hi, transparent_index, ..] = *data else {
            return Err(Error::DecodingError(format!(
                "graphic control extension holds {} bytes, expected 4",
                data.len()
            )));
        };

        Ok(Self {
            disposal: DisposalMethod::from_code((flags >> 2) & 0b111),
            user_input: flags & 0b10 != 0,
            delay: u16::from_le_bytes([delay_lo, delay_hi]),
            transparent_index: (flags & 0b1 != 0).then_some(transparent_index),
        })
    }

    /// Returns the delay as a duration.
    #[must_use]
    pub fn delay_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.delay) * 10)
    }
}

/// Position, size and flags of a single image block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// The offset of the frame from the left edge of the logical screen.
    pub left: u16,
    /// The offset of the frame from the top edge of the logical screen.
    pub top: u16,
    /// The width of the frame.
    pub width: u16,
    /// The height of the frame.
    pub height: u16,
    /// The packed fields byte.
    pub flags: u8,
}

impl ImageDescriptor {
    /// Whether a local color table follows the descriptor.
    #[must_use]
    pub const fn has_local_color_table(&self) -> bool {
        self.flags & 0b1000_0000 != 0
    }

    /// Whether rows are stored in the four-pass interlaced order.
    #[must_use]
    pub const fn is_interlaced(&self) -> bool {
        self.flags & 0b0100_0000 != 0
    }

    /// Whether the local color table is sorted by decreasing importance.
    #[must_use]
    pub const fn is_sorted(&self) -> bool {
        self.flags & 0b0010_0000 != 0
    }

    /// The number of entries in the local color table, if it were present.
    #[must_use]
    pub const fn local_color_table_len(&self) -> usize {
        1 << ((self.flags & 0b0000_0111) + 1)
    }

    /// Returns `(left, top, width, height)`.
    #[must_use]
    pub fn bounds(&self) -> (u32, u32, u32, u32) {
        (
            u32::from(self.left),
            u32::from(self.top),
            u32::from(self.width),
            u32::from(self.height),
        )
    }

    /// The number of pixels in the frame.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// The active color table of one frame with its transparent index applied.
///
/// This is built fresh for every frame; a local table never leaks into the next frame.
#[derive(Clone, Debug)]
pub struct ResolvedPalette {
    colors: Vec<Rgba>,
    transparent_index: Option<u8>,
}

impl ResolvedPalette {
    fn new(table: &ColorTable, transparent_index: Option<u8>) -> Self {
        Self {
            colors: table.colors().iter().copied().map(Rgba::from).collect(),
            transparent_index,
        }
    }

    /// Returns the color of the given palette index, or `None` if the index is transparent.
    ///
    /// # Errors
    /// * `InvalidPaletteIndex`: The index is not covered by the color table.
    pub fn lookup(&self, index: u8) -> Result<Option<Rgba>> {
        if self.transparent_index == Some(index) {
            return Ok(None);
        }

        self.colors
            .get(index as usize)
            .copied()
            .map(Some)
            .ok_or(Error::InvalidPaletteIndex(index))
    }
}

/// A single decoded image block, before it is composited onto the canvas.
#[derive(Clone, Debug)]
pub struct RawFrame {
    /// Where the frame lies on the logical screen.
    pub descriptor: ImageDescriptor,
    /// The color table overriding the global one for this frame only.
    pub local_color_table: Option<ColorTable>,
    /// The graphic control extension that preceded this image block, if any.
    pub control: Option<GraphicControlExtension>,
    /// One palette index per pixel, in row-major order (already de-interlaced).
    pub indices: Vec<u8>,
}

impl RawFrame {
    /// The palette index that is not drawn, if any.
    #[must_use]
    pub fn transparent_index(&self) -> Option<u8> {
        self.control.and_then(|control| control.transparent_index)
    }

    /// The delay of this frame. Zero without a graphic control extension.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.control
            .map(|control| control.delay_duration())
            .unwrap_or_default()
    }

    /// The disposal method of this frame. [`DisposalMethod::None`] without a graphic control
    /// extension.
    #[must_use]
    pub fn disposal(&self) -> DisposalMethod {
        self.control
            .map(|control| control.disposal)
            .unwrap_or_default()
    }

    /// Resolves the color table active for this frame: the local table if there is one,
    /// otherwise the given global table.
    ///
    /// # Errors
    /// * `DecodingError`: There is neither a local nor a global color table.
    pub fn resolve_palette(&self, global: Option<&ColorTable>) -> Result<ResolvedPalette> {
        let table = self
            .local_color_table
            .as_ref()
            .or(global)
            .ok_or_else(|| Error::DecodingError("frame has no color table".to_string()))?;

        Ok(ResolvedPalette::new(table, self.transparent_index()))
    }

    /// Resolves this frame into an RGBA image of the frame's own size. Transparent pixels have
    /// an alpha of 0.
    ///
    /// # Errors
    /// * `DecodingError`: There is no color table for this frame.
    /// * `InvalidPaletteIndex`: An index is not covered by the active color table.
    pub fn to_image(&self, global: Option<&ColorTable>) -> Result<Image<Rgba>> {
        let palette = self.resolve_palette(global)?;
        let data = self
            .indices
            .iter()
            .map(|&index| {
                palette
                    .lookup(index)
                    .map(|color| color.unwrap_or_else(Rgba::transparent))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut image = Image::from_pixels(u32::from(self.descriptor.width), data)?;
        image.set_format(ImageFormat::Gif);
        Ok(image)
    }
}

/// Reorders rows stored in the four interlace passes into top-to-bottom order.
fn deinterlace(indices: &[u8], width: usize, height: usize) -> Vec<u8> {
    const PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

    let mut out = vec![0; indices.len()];
    let rows = PASSES
        .iter()
        .flat_map(|&(start, step)| (start..height).step_by(step));

    for (source, target) in indices.chunks_exact(width).zip(rows) {
        out[target * width..(target + 1) * width].copy_from_slice(source);
    }
    out
}

/// Turns an unexpected end of the stream into `TruncatedData`.
struct ByteReader<R> {
    inner: R,
}

impl<R: Read> ByteReader<R> {
    fn read_exact(&mut self, buf: &mut [u8], context: &'static str) -> Result<()> {
        self.inner.read_exact(buf).map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::TruncatedData(context),
            _ => Error::IoError(err),
        })
    }

    fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N]> {
        let mut buf = [0; N];
        self.read_exact(&mut buf, context)?;
        Ok(buf)
    }

    fn read_u8(&mut self, context: &'static str) -> Result<u8> {
        self.read_array::<1>(context).map(|[byte]| byte)
    }

    /// Appends one data sub-block to `buf`. Returns `false` at the block terminator.
    fn read_sub_block(&mut self, buf: &mut Vec<u8>, context: &'static str) -> Result<bool> {
        let len = self.read_u8(context)? as usize;
        if len == 0 {
            return Ok(false);
        }

        let start = buf.len();
        buf.resize(start + len, 0);
        self.read_exact(&mut buf[start..], context)?;
        Ok(true)
    }

    /// Concatenates every remaining sub-block into `buf`.
    fn read_sub_blocks(&mut self, buf: &mut Vec<u8>, context: &'static str) -> Result<()> {
        while self.read_sub_block(buf, context)? {}
        Ok(())
    }

    fn skip_sub_blocks(&mut self, context: &'static str) -> Result<()> {
        let mut scratch = Vec::with_capacity(255);
        loop {
            scratch.clear();
            if !self.read_sub_block(&mut scratch, context)? {
                return Ok(());
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    BlockScan,
    Done,
    Failed,
}

/// Reads a GIF stream block by block, producing one [`RawFrame`] per image block.
///
/// The header, logical screen descriptor and global color table are read when the reader is
/// created. After that, [`GifReader::next_frame`] scans blocks until the next image block or the
/// trailer. The first error is final: every later call returns `Ok(None)`.
pub struct GifReader<R> {
    reader: ByteReader<R>,
    version: Version,
    screen: LogicalScreenDescriptor,
    global_color_table: Option<ColorTable>,
    pending_control: Option<GraphicControlExtension>,
    loop_count: Option<LoopCount>,
    state: State,
}

impl<R: Read> GifReader<R> {
    /// Reads the header, the logical screen descriptor and the global color table from the given
    /// stream.
    ///
    /// # Errors
    /// * `MalformedHeader`: The stream does not start with `GIF87a` or `GIF89a`.
    /// * `TruncatedData`: The stream ended early.
    /// * `InvalidDimensions`: The logical screen has a width or height of zero.
    pub fn new(stream: R) -> Result<Self> {
        let mut reader = ByteReader { inner: stream };

        let signature = reader.read_array::<6>("header")?;
        let version = match &signature {
            b"GIF87a" => Version::Gif87a,
            b"GIF89a" => Version::Gif89a,
            _ => return Err(Error::MalformedHeader(signature)),
        };

        let [w0, w1, h0, h1, flags, background_index, pixel_aspect_ratio] =
            reader.read_array::<7>("logical screen descriptor")?;
        let screen = LogicalScreenDescriptor {
            width: u16::from_le_bytes([w0, w1]),
            height: u16::from_le_bytes([h0, h1]),
            flags,
            background_index,
            pixel_aspect_ratio,
        };

        if screen.width == 0 || screen.height == 0 {
            return Err(Error::InvalidDimensions {
                width: u32::from(screen.width),
                height: u32::from(screen.height),
            });
        }

        let global_color_table = if screen.has_global_color_table() {
            Some(ColorTable::read(&mut reader, screen.global_color_table_len())?)
        } else {
            None
        };

        debug!(
            "read {:?} header: {}x{} logical screen, global color table of {} colors",
            version,
            screen.width,
            screen.height,
            global_color_table.as_ref().map_or(0, ColorTable::len),
        );

        Ok(Self {
            reader,
            version,
            screen,
            global_color_table,
            pending_control: None,
            loop_count: None,
            state: State::BlockScan,
        })
    }

    /// The version declared in the header.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// The logical screen descriptor of the stream.
    #[must_use]
    pub const fn screen_descriptor(&self) -> &LogicalScreenDescriptor {
        &self.screen
    }

    /// The global color table of the stream, if any.
    #[must_use]
    pub const fn global_color_table(&self) -> Option<&ColorTable> {
        self.global_color_table.as_ref()
    }

    /// The color the canvas starts out with and is restored to: the global color table entry at
    /// the background index, or transparent if there is no such entry.
    #[must_use]
    pub fn background_color(&self) -> Rgba {
        self.global_color_table
            .as_ref()
            .and_then(|table| table.get(self.screen.background_index))
            .map_or_else(Rgba::transparent, Rgba::from)
    }

    /// The loop count declared by an application extension seen so far. Streams without one
    /// play once.
    #[must_use]
    pub fn loop_count(&self) -> LoopCount {
        self.loop_count.unwrap_or(LoopCount::Exactly(1))
    }

    /// Scans blocks until the next image block and decodes it. Returns `Ok(None)` once the
    /// trailer has been read.
    ///
    /// # Errors
    /// * Any decoding error. The reader is finished afterwards.
    pub fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        if self.state != State::BlockScan {
            return Ok(None);
        }

        let result = self.scan();
        match &result {
            Ok(None) => self.state = State::Done,
            Err(_) => self.state = State::Failed,
            Ok(Some(_)) => (),
        }
        result
    }

    fn scan(&mut self) -> Result<Option<RawFrame>> {
        loop {
            match self.reader.read_u8("block introducer")? {
                EXTENSION_INTRODUCER => self.read_extension()?,
                IMAGE_SEPARATOR => return self.read_image().map(Some),
                TRAILER => return Ok(None),
                byte => return Err(Error::UnknownBlockType(byte)),
            }
        }
    }

    fn read_extension(&mut self) -> Result<()> {
        match self.reader.read_u8("extension label")? {
            GRAPHIC_CONTROL_LABEL => {
                let mut data = Vec::with_capacity(4);
                self.reader
                    .read_sub_blocks(&mut data, "graphic control extension")?;

                self.pending_control = Some(GraphicControlExtension::parse(&data)?);
            }
            APPLICATION_LABEL => self.read_application_extension()?,
            label @ (COMMENT_LABEL | PLAIN_TEXT_LABEL) => {
                trace!("skipping extension {label:#04x}");
                self.reader.skip_sub_blocks("extension")?;
            }
            label => {
                trace!("skipping unknown extension {label:#04x}");
                self.reader.skip_sub_blocks("extension")?;
            }
        }
        Ok(())
    }

    fn read_application_extension(&mut self) -> Result<()> {
        let mut identifier = Vec::with_capacity(11);
        if !self
            .reader
            .read_sub_block(&mut identifier, "application extension")?
        {
            return Ok(());
        }

        if identifier != b"NETSCAPE2.0" && identifier != b"ANIMEXTS1.0" {
            trace!(
                "skipping application extension \"{}\"",
                identifier.escape_ascii()
            );
            return self.reader.skip_sub_blocks("application extension");
        }

        let mut data = Vec::with_capacity(3);
        loop {
            data.clear();
            if !self
                .reader
                .read_sub_block(&mut data, "application extension")?
            {
                return Ok(());
            }

            if let [1, lo, hi, ..] = data[..] {
                self.loop_count = Some(match u16::from_le_bytes([lo, hi]) {
                    0 => LoopCount::Infinite,
                    count => LoopCount::Exactly(u32::from(count)),
                });
            }
        }
    }

    fn read_image(&mut self) -> Result<RawFrame> {
        let [l0, l1, t0, t1, w0, w1, h0, h1, flags] = self.reader.read_array("image descriptor")?;
        let descriptor = ImageDescriptor {
            left: u16::from_le_bytes([l0, l1]),
            top: u16::from_le_bytes([t0, t1]),
            width: u16::from_le_bytes([w0, w1]),
            height: u16::from_le_bytes([h0, h1]),
            flags,
        };

        let (left, top, width, height) = descriptor.bounds();
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }

        let screen_width = u32::from(self.screen.width);
        let screen_height = u32::from(self.screen.height);
        if left + width > screen_width || top + height > screen_height {
            return Err(Error::FrameOutOfBounds {
                left,
                top,
                width,
                height,
                screen_width,
                screen_height,
            });
        }

        let local_color_table = if descriptor.has_local_color_table() {
            Some(ColorTable::read(&mut self.reader, descriptor.local_color_table_len())?)
        } else {
            None
        };

        let min_code_size = self.reader.read_u8("LZW minimum code size")?;
        let mut data = Vec::new();
        self.reader.read_sub_blocks(&mut data, "image data")?;

        let mut indices =
            LzwDecoder::new(min_code_size)?.decode(&data, descriptor.pixel_count())?;
        if descriptor.is_interlaced() {
            indices = deinterlace(&indices, width as usize, height as usize);
        }

        Ok(RawFrame {
            descriptor,
            local_color_table,
            control: self.pending_control.take(),
            indices,
        })
    }
}
