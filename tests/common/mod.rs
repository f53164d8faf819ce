#![allow(dead_code)]

use ril_gif::prelude::*;
use std::borrow::Cow;

pub const COLORS: [Rgba; 12] = [
    Rgba::from_rgb(255, 0, 0),
    Rgba::from_rgb(255, 128, 0),
    Rgba::from_rgb(255, 255, 0),
    Rgba::from_rgb(128, 255, 0),
    Rgba::from_rgb(0, 255, 0),
    Rgba::from_rgb(0, 255, 128),
    Rgba::from_rgb(0, 255, 255),
    Rgba::from_rgb(0, 128, 255),
    Rgba::from_rgb(0, 0, 255),
    Rgba::from_rgb(128, 0, 255),
    Rgba::from_rgb(255, 0, 255),
    Rgba::from_rgb(255, 0, 128),
];

/// A 256x256 animation with one solid frame per color in [`COLORS`], 100ms each, looping
/// forever. Encoded with the `gif` crate.
pub fn sample_gif() -> Vec<u8> {
    let mut palette = COLORS
        .iter()
        .flat_map(|c| [c.r, c.g, c.b])
        .collect::<Vec<_>>();
    palette.resize(16 * 3, 0);

    let mut out = Vec::new();
    {
        let mut encoder =
            gif_encoder::Encoder::new(&mut out, 256, 256, &palette).expect("valid header");
        encoder
            .set_repeat(gif_encoder::Repeat::Infinite)
            .expect("valid repeat");

        for index in 0..COLORS.len() as u8 {
            let frame = gif_encoder::Frame {
                width: 256,
                height: 256,
                delay: 10,
                buffer: Cow::Owned(vec![index; 256 * 256]),
                ..gif_encoder::Frame::default()
            };
            encoder.write_frame(&frame).expect("valid frame");
        }
    }
    out
}

/// Writes a GIF byte by byte, for exact control over every block.
pub struct GifBuilder {
    bytes: Vec<u8>,
}

/// An image block for [`GifBuilder::image`]. Indices are given in row-major order.
pub struct ImageBlock<'a> {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub local_table: Option<&'a [Rgb]>,
    pub interlaced: bool,
    pub indices: &'a [u8],
}

impl<'a> ImageBlock<'a> {
    pub fn new(left: u16, top: u16, width: u16, height: u16, indices: &'a [u8]) -> Self {
        Self {
            left,
            top,
            width,
            height,
            local_table: None,
            interlaced: false,
            indices,
        }
    }

    pub fn with_local_table(mut self, table: &'a [Rgb]) -> Self {
        self.local_table = Some(table);
        self
    }

    pub fn interlaced(mut self) -> Self {
        self.interlaced = true;
        self
    }
}

/// Pads a table to a power of two of at least 2 entries, returning its size bits and bytes.
fn color_table(table: &[Rgb]) -> (u8, Vec<u8>) {
    let len = table.len().max(2).next_power_of_two();
    let mut bytes = table
        .iter()
        .flat_map(|c| [c.r, c.g, c.b])
        .collect::<Vec<_>>();
    bytes.resize(len * 3, 0);

    (len.trailing_zeros() as u8 - 1, bytes)
}

fn sub_blocks(out: &mut Vec<u8>, data: &[u8]) {
    for chunk in data.chunks(255) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0);
}

/// LZW-encodes indices as runs of literals with a minimum code size of 8. Each run is short
/// enough that the code width stays at 9 bits, and a clear code starts every run.
fn lzw_literals(indices: &[u8]) -> Vec<u8> {
    const CLEAR: u32 = 256;
    const WIDTH: u8 = 9;

    let mut out = Vec::new();
    let mut buffer = 0u32;
    let mut bits = 0u8;
    let mut write = |code: u32| {
        buffer |= code << bits;
        bits += WIDTH;
        while bits >= 8 {
            out.push(buffer as u8);
            buffer >>= 8;
            bits -= 8;
        }
    };

    for run in indices.chunks(254) {
        write(CLEAR);
        for &index in run {
            write(u32::from(index));
        }
    }
    write(CLEAR + 1);

    if bits > 0 {
        out.push(buffer as u8);
    }
    out
}

/// Reorders row-major rows into the four interlace passes.
fn interlace(indices: &[u8], width: usize, height: usize) -> Vec<u8> {
    [(0, 8), (4, 8), (2, 4), (1, 2)]
        .into_iter()
        .flat_map(|(start, step)| (start..height).step_by(step))
        .flat_map(|row| &indices[row * width..(row + 1) * width])
        .copied()
        .collect()
}

impl GifBuilder {
    pub fn new(width: u16, height: u16, global_table: Option<&[Rgb]>, background: u8) -> Self {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());

        match global_table {
            Some(table) => {
                let (size, table) = color_table(table);
                bytes.extend_from_slice(&[0b1000_0000 | size, background, 0]);
                bytes.extend_from_slice(&table);
            }
            None => bytes.extend_from_slice(&[0, background, 0]),
        }

        Self { bytes }
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn extension(mut self, label: u8, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(&[0x21, label]);
        sub_blocks(&mut self.bytes, data);
        self
    }

    pub fn comment(self, text: &str) -> Self {
        self.extension(0xFE, text.as_bytes())
    }

    /// A NETSCAPE2.0 application extension.
    pub fn loop_count(mut self, count: u16) -> Self {
        let [lo, hi] = count.to_le_bytes();

        self.bytes.extend_from_slice(&[0x21, 0xFF, 11]);
        self.bytes.extend_from_slice(b"NETSCAPE2.0");
        self.bytes.extend_from_slice(&[3, 1, lo, hi, 0]);
        self
    }

    /// A graphic control extension. `delay` is in hundredths of a second.
    pub fn control(mut self, disposal: u8, delay: u16, transparent: Option<u8>) -> Self {
        let flags = (disposal << 2) | u8::from(transparent.is_some());
        let [lo, hi] = delay.to_le_bytes();

        self.bytes
            .extend_from_slice(&[0x21, 0xF9, 4, flags, lo, hi, transparent.unwrap_or(0), 0]);
        self
    }

    pub fn image(mut self, block: ImageBlock) -> Self {
        let mut flags = 0;
        let table = block.local_table.map(|table| {
            let (size, bytes) = color_table(table);
            flags |= 0b1000_0000 | size;
            bytes
        });
        if block.interlaced {
            flags |= 0b0100_0000;
        }

        self.bytes.push(0x2C);
        for value in [block.left, block.top, block.width, block.height] {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        }
        self.bytes.push(flags);
        if let Some(table) = table {
            self.bytes.extend_from_slice(&table);
        }

        let indices = if block.interlaced {
            interlace(block.indices, block.width as usize, block.height as usize)
        } else {
            block.indices.to_vec()
        };

        self.bytes.push(8);
        sub_blocks(&mut self.bytes, &lzw_literals(&indices));
        self
    }

    /// Appends the trailer.
    pub fn finish(mut self) -> Vec<u8> {
        self.bytes.push(0x3B);
        self.bytes
    }

    /// Returns the stream without a trailer.
    pub fn unterminated(self) -> Vec<u8> {
        self.bytes
    }
}

/// Encodes full-screen frames of palette indices with the `gif` crate. Each frame is
/// `(indices, interlaced)`; the encoder stores rows in the given order either way.
pub fn encode_indexed(
    width: u16,
    height: u16,
    palette: &[Rgb],
    frames: &[(&[u8], bool)],
) -> Vec<u8> {
    let palette = palette
        .iter()
        .flat_map(|c| [c.r, c.g, c.b])
        .collect::<Vec<_>>();

    let mut out = Vec::new();
    {
        let mut encoder =
            gif_encoder::Encoder::new(&mut out, width, height, &palette).expect("valid header");

        for &(indices, interlaced) in frames {
            let frame = gif_encoder::Frame {
                width,
                height,
                interlaced,
                buffer: Cow::Borrowed(indices),
                ..gif_encoder::Frame::default()
            };
            encoder.write_frame(&frame).expect("valid frame");
        }
    }
    out
}

/// Decodes every frame to palette indices with the `gif` crate.
pub fn decode_indexed(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut options = gif_encoder::DecodeOptions::new();
    options.set_color_output(gif_encoder::ColorOutput::Indexed);
    let mut decoder = options.read_info(bytes).expect("valid header");

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame().expect("valid frame") {
        frames.push(frame.buffer.to_vec());
    }
    frames
}
