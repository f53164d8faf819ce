mod common;

use common::{
    decode_indexed, encode_indexed, sample_gif, GifBuilder, ImageBlock, COLORS,
};
use ril_gif::{prelude::*, Error};
use std::time::Duration;

const BLACK: Rgb = Rgb::new(0, 0, 0);
const WHITE: Rgb = Rgb::new(255, 255, 255);
const RED: Rgb = Rgb::new(255, 0, 0);
const GREEN: Rgb = Rgb::new(0, 255, 0);

fn rgba(color: Rgb) -> Rgba {
    color.into()
}

fn decode_all(bytes: &[u8]) -> ril_gif::Result<Vec<Image<Rgba>>> {
    ImageSequence::<Rgba>::from_bytes(ImageFormat::Gif, bytes)?
        .map(|frame| frame.map(Frame::into_image))
        .collect()
}

#[test]
fn test_gif_decode() -> ril_gif::Result<()> {
    let bytes = sample_gif();
    let mut frames = 0;

    for (frame, color) in ImageSequence::<Rgba>::from_bytes_inferred(&bytes)?.zip(COLORS) {
        let frame = frame?;

        assert_eq!(frame.dimensions(), (256, 256));
        assert_eq!(frame.delay(), Duration::from_millis(100));
        assert_eq!(frame.get_pixel(0, 0)?, color);
        assert!(frame.pixels().all(|&pixel| pixel == color));
        frames += 1;
    }

    assert_eq!(frames, 12);
    Ok(())
}

#[test]
fn test_gif_decode_rgb() -> ril_gif::Result<()> {
    let bytes = sample_gif();
    let sequence = ImageSequence::<Rgb>::from_bytes(ImageFormat::Gif, &bytes)?.into_sequence()?;

    assert_eq!(sequence.len(), 12);
    assert_eq!(sequence.loop_count(), LoopCount::Infinite);

    for (frame, color) in sequence.iter().zip(COLORS) {
        assert_eq!(frame.get_pixel(255, 255)?, Rgb::from(color));
    }
    Ok(())
}

#[test]
fn test_first_frame() -> ril_gif::Result<()> {
    let bytes = sample_gif();
    let image = Image::<Rgba>::from_bytes_inferred(&bytes)?;

    assert_eq!(image.format(), ImageFormat::Gif);
    assert_eq!(image.get_pixel(128, 128)?, COLORS[0]);
    Ok(())
}

#[test]
fn test_single_frame() -> ril_gif::Result<()> {
    let bytes = GifBuilder::new(4, 4, Some(&[RED, BLACK]), 1)
        .image(ImageBlock::new(0, 0, 4, 4, &[0; 16]))
        .finish();

    let image = Image::<Rgba>::from_bytes(ImageFormat::Gif, &bytes)?;
    assert_eq!(image.dimensions(), (4, 4));
    assert_eq!(image.len(), 16);
    assert!(image.pixels().all(|&pixel| pixel == Rgba::new(255, 0, 0, 255)));
    Ok(())
}

#[test]
fn test_malformed_header() {
    let mut bytes = GifBuilder::new(1, 1, Some(&[RED]), 0).finish();
    bytes[..6].copy_from_slice(b"GIF88a");

    assert!(matches!(
        ImageSequence::<Rgba>::from_bytes(ImageFormat::Gif, &bytes),
        Err(Error::MalformedHeader(header)) if &header == b"GIF88a"
    ));
    assert!(matches!(
        Image::<Rgba>::from_bytes_inferred(b"\x89PNG\r\n"),
        Err(Error::UnknownEncodingFormat)
    ));
}

#[test]
fn test_frame_out_of_bounds() {
    let bytes = GifBuilder::new(4, 4, Some(&[RED]), 0)
        .image(ImageBlock::new(2, 0, 4, 1, &[0; 4]))
        .finish();

    assert!(matches!(
        decode_all(&bytes),
        Err(Error::FrameOutOfBounds {
            left: 2,
            top: 0,
            width: 4,
            height: 1,
            screen_width: 4,
            screen_height: 4,
        })
    ));
}

#[test]
fn test_unknown_block_type() -> ril_gif::Result<()> {
    let bytes = GifBuilder::new(1, 1, Some(&[RED]), 0)
        .image(ImageBlock::new(0, 0, 1, 1, &[0]))
        .raw(&[0x99])
        .finish();
    let mut frames = ImageSequence::<Rgba>::from_bytes(ImageFormat::Gif, &bytes)?;

    assert!(frames.next().transpose()?.is_some());
    assert!(matches!(frames.next(), Some(Err(Error::UnknownBlockType(0x99)))));
    assert!(frames.next().is_none());
    assert!(frames.next().is_none());
    Ok(())
}

#[test]
fn test_errors_abort_collection() {
    let bytes = GifBuilder::new(1, 1, Some(&[RED]), 0)
        .image(ImageBlock::new(0, 0, 1, 1, &[0]))
        .unterminated();

    let frames = ImageSequence::<Rgba>::from_bytes(ImageFormat::Gif, &bytes);
    assert!(matches!(
        frames.and_then(FrameIterator::into_sequence),
        Err(Error::TruncatedData(_))
    ));
}

#[test]
fn test_disposal_background() -> ril_gif::Result<()> {
    let bytes = GifBuilder::new(2, 1, Some(&[BLACK, WHITE, RED, GREEN]), 1)
        .control(2, 0, None)
        .image(ImageBlock::new(0, 0, 1, 1, &[2]))
        .image(ImageBlock::new(1, 0, 1, 1, &[3]))
        .finish();

    let frames = decode_all(&bytes)?;
    assert_eq!(frames[0].data(), [rgba(RED), rgba(WHITE)]);
    assert_eq!(frames[1].data(), [rgba(WHITE), rgba(GREEN)]);
    Ok(())
}

#[test]
fn test_disposal_previous() -> ril_gif::Result<()> {
    let bytes = GifBuilder::new(2, 1, Some(&[BLACK, WHITE, RED, GREEN]), 1)
        .image(ImageBlock::new(0, 0, 2, 1, &[2, 2]))
        .control(3, 0, None)
        .image(ImageBlock::new(0, 0, 1, 1, &[3]))
        .image(ImageBlock::new(1, 0, 1, 1, &[0]))
        .finish();

    let frames = ImageSequence::<Rgba>::from_bytes(ImageFormat::Gif, &bytes)?.into_sequence()?;
    let disposals = frames.iter().map(Frame::disposal).collect::<Vec<_>>();
    assert_eq!(
        disposals,
        [
            DisposalMethod::None,
            DisposalMethod::Previous,
            DisposalMethod::None
        ]
    );

    let frames = frames.into_frames();
    assert_eq!(frames[0].data(), [rgba(RED), rgba(RED)]);
    assert_eq!(frames[1].data(), [rgba(GREEN), rgba(RED)]);
    assert_eq!(frames[2].data(), [rgba(RED), rgba(BLACK)]);
    Ok(())
}

#[test]
fn test_transparency() -> ril_gif::Result<()> {
    let bytes = GifBuilder::new(2, 1, Some(&[BLACK, WHITE, RED, GREEN]), 1)
        .image(ImageBlock::new(0, 0, 2, 1, &[2, 2]))
        .control(1, 7, Some(0))
        .image(ImageBlock::new(0, 0, 2, 1, &[0, 3]))
        .finish();

    let frames = ImageSequence::<Rgba>::from_bytes(ImageFormat::Gif, &bytes)?.into_sequence()?;
    let frames = frames.into_frames();

    assert_eq!(frames[0].delay(), Duration::ZERO);
    assert_eq!(frames[1].delay(), Duration::from_millis(70));
    assert_eq!(frames[1].disposal(), DisposalMethod::Keep);
    assert_eq!(frames[1].data(), [rgba(RED), rgba(GREEN)]);
    Ok(())
}

#[test]
fn test_transparent_background() -> ril_gif::Result<()> {
    // Without a global color table the canvas starts out transparent.
    let bytes = GifBuilder::new(2, 1, None, 0)
        .image(ImageBlock::new(1, 0, 1, 1, &[1]).with_local_table(&[BLACK, WHITE]))
        .finish();

    let frames = decode_all(&bytes)?;
    assert_eq!(frames[0].data(), [Rgba::transparent(), rgba(WHITE)]);
    Ok(())
}

#[test]
fn test_interlaced() -> ril_gif::Result<()> {
    let table = [BLACK, WHITE, RED, GREEN];
    let indices = (0..3 * 11).map(|i| (i / 3 % 4) as u8).collect::<Vec<_>>();

    let progressive = GifBuilder::new(3, 11, Some(&table), 0)
        .image(ImageBlock::new(0, 0, 3, 11, &indices))
        .finish();
    let interlaced = GifBuilder::new(3, 11, Some(&table), 0)
        .image(ImageBlock::new(0, 0, 3, 11, &indices).interlaced())
        .finish();

    let progressive = decode_all(&progressive)?;
    assert_eq!(progressive, decode_all(&interlaced)?);
    assert_eq!(progressive[0].get_pixel(2, 6)?, rgba(RED));
    Ok(())
}

#[test]
fn test_local_color_table() -> ril_gif::Result<()> {
    let bytes = GifBuilder::new(2, 1, Some(&[BLACK, WHITE]), 0)
        .image(ImageBlock::new(0, 0, 2, 1, &[0, 1]).with_local_table(&[RED, GREEN]))
        .image(ImageBlock::new(0, 0, 2, 1, &[0, 1]))
        .finish();

    let frames = decode_all(&bytes)?;
    assert_eq!(frames[0].data(), [rgba(RED), rgba(GREEN)]);
    assert_eq!(frames[1].data(), [rgba(BLACK), rgba(WHITE)]);
    Ok(())
}

#[test]
fn test_skips_extensions() -> ril_gif::Result<()> {
    let bytes = GifBuilder::new(1, 1, Some(&[RED]), 0)
        .comment("made by hand")
        .extension(0x01, &[0; 13])
        .extension(0x42, b"forward compatible")
        .extension(0xFF, b"XMP DataXMP")
        .image(ImageBlock::new(0, 0, 1, 1, &[0]))
        .finish();

    let frames = decode_all(&bytes)?;
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].data(), [rgba(RED)]);
    Ok(())
}

#[test]
fn test_loop_count() -> ril_gif::Result<()> {
    let build = |count: Option<u16>| {
        let builder = GifBuilder::new(1, 1, Some(&[RED]), 0);
        let builder = match count {
            Some(count) => builder.loop_count(count),
            None => builder,
        };
        builder.image(ImageBlock::new(0, 0, 1, 1, &[0])).finish()
    };

    for (count, expected) in [
        (None, LoopCount::Exactly(1)),
        (Some(0), LoopCount::Infinite),
        (Some(3), LoopCount::Exactly(3)),
    ] {
        let bytes = build(count);
        let sequence = ImageSequence::<Rgba>::from_bytes(ImageFormat::Gif, &bytes)?;
        assert_eq!(sequence.into_sequence()?.loop_count(), expected);
    }
    Ok(())
}

#[test]
fn test_invalid_palette_index() {
    let bytes = GifBuilder::new(1, 1, Some(&[RED, GREEN]), 0)
        .image(ImageBlock::new(0, 0, 1, 1, &[3]))
        .finish();

    assert!(matches!(
        decode_all(&bytes),
        Err(Error::InvalidPaletteIndex(3))
    ));
}

#[test]
fn test_missing_color_table() {
    let bytes = GifBuilder::new(1, 1, None, 0)
        .image(ImageBlock::new(0, 0, 1, 1, &[0]))
        .finish();

    assert!(matches!(decode_all(&bytes), Err(Error::DecodingError(_))));
}

#[test]
fn test_truncated_image_data() -> ril_gif::Result<()> {
    let mut bytes = GifBuilder::new(2, 2, Some(&[RED]), 0)
        .image(ImageBlock::new(0, 0, 2, 2, &[0; 4]))
        .unterminated();
    // Cut the only data sub-block short.
    bytes.truncate(bytes.len() - 4);

    let mut frames = ImageSequence::<Rgba>::from_bytes(ImageFormat::Gif, &bytes)?;
    assert!(matches!(frames.next(), Some(Err(Error::TruncatedData(_)))));
    assert!(frames.next().is_none());
    Ok(())
}

#[test]
fn test_noise_fills_code_table() -> ril_gif::Result<()> {
    const WIDTH: u16 = 301;
    const HEIGHT: u16 = 203;

    let palette = (0..=255u8)
        .map(|i| Rgb::new(i, 255 - i, i.wrapping_mul(31)))
        .collect::<Vec<_>>();

    let mut state = 0x2545_F491_4F6C_DD1Du64;
    let mut noise = || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 56) as u8
    };
    let len = WIDTH as usize * HEIGHT as usize;
    let progressive = (0..len).map(|_| noise()).collect::<Vec<_>>();
    let interlaced = (0..len).map(|_| noise()).collect::<Vec<_>>();

    let frames = [(progressive.as_slice(), false), (interlaced.as_slice(), true)];
    let bytes = encode_indexed(WIDTH, HEIGHT, &palette, &frames);
    let reference = decode_indexed(&bytes);
    assert_eq!(reference.len(), 2);
    assert_eq!(reference[0], progressive);

    let frames = decode_all(&bytes)?;
    assert_eq!(frames.len(), 2);

    for (frame, indices) in frames.iter().zip(&reference) {
        assert_eq!(frame.dimensions(), (u32::from(WIDTH), u32::from(HEIGHT)));

        for (pixel, &index) in frame.pixels().zip(indices) {
            assert_eq!(*pixel, rgba(palette[index as usize]));
        }
    }
    Ok(())
}

#[test]
fn test_transparent_subframe() -> ril_gif::Result<()> {
    let bytes = GifBuilder::new(4, 4, Some(&[BLACK, WHITE, RED, GREEN]), 0)
        .image(ImageBlock::new(0, 0, 4, 4, &[2; 16]))
        .control(0, 0, Some(3))
        .image(ImageBlock::new(1, 1, 2, 2, &[3, 1, 3, 3]))
        .finish();

    let frames = decode_all(&bytes)?;
    let frame = &frames[1];
    assert_eq!(frame.get_pixel(2, 1)?, rgba(WHITE));
    assert_eq!(frame.get_pixel(1, 1)?, rgba(RED));
    assert_eq!(frame.get_pixel(2, 2)?, rgba(RED));
    assert_eq!(frame.pixels().filter(|&&pixel| pixel == rgba(RED)).count(), 15);
    Ok(())
}
