//! Decodes a GIF and logs a summary of every composited frame.
//!
//! `RUST_LOG=debug cargo run --example decode_gif -- path/to/image.gif`

use log::{error, info};
use ril_gif::prelude::*;

fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let Some(path) = std::env::args().nth(1) else {
        error!("usage: decode_gif <path>");
        std::process::exit(2);
    };

    if let Err(err) = run(&path) {
        error!("failed to decode {path}: {err}");
        std::process::exit(1);
    }
}

fn run(path: &str) -> ril_gif::Result<()> {
    let mut frames = ImageSequence::<Rgba>::open(path)?;
    let (width, height) = frames.dimensions();
    info!("{path}: {width}x{height} logical screen");

    let mut total = std::time::Duration::ZERO;
    let mut count = 0;

    for frame in frames.by_ref() {
        let frame = frame?;
        let opaque = frame.pixels().filter(|pixel| pixel.alpha() == 255).count();

        info!(
            "frame {count}: delay={:?}, disposal={:?}, opaque pixels={opaque}/{}",
            frame.delay(),
            frame.disposal(),
            frame.len(),
        );
        total += frame.delay();
        count += 1;
    }

    info!(
        "{count} frames, {:?} per loop, loop count {:?}",
        total,
        frames.loop_count()
    );
    Ok(())
}
