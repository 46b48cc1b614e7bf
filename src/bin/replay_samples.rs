// Copyright 2024 the rtls-capture contributors
// SPDX-License-Identifier: MPL-2.0

// Replays a sample log as a marker moving over the floor plan. The first
// sample stays on screen as a fixed anchor.

use std::{
    io::{stdout, Write},
    thread,
};

use log::{info, warn, LevelFilter};
use rtls_capture_lib::{
    config::PlaybackConfig,
    playback::{grid_cell, render, Playback},
    sample_log::{format_x, format_y, read_samples_from},
    Error,
};
use simple_logger::SimpleLogger;

fn main() -> Result<(), Error> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    let config = PlaybackConfig::from_args()?;
    let samples = read_samples_from(&config.log_path)?;
    info!(
        "Replaying {} samples from {}",
        samples.len(),
        config.log_path.display()
    );

    let mut out = stdout().lock();
    for frame in Playback::new(&samples) {
        let (_, _, inside) = grid_cell(&frame.marker, &config.plan, config.columns, config.rows);
        if !inside {
            warn!(
                "Sample {} at {} {} is off the floor plan",
                frame.index, frame.marker.x, frame.marker.y
            );
        }

        // Clear the screen and home the cursor before every frame
        write!(
            out,
            "\x1b[2J\x1b[H{}",
            render(&frame, &config.plan, config.columns, config.rows)
        )?;
        writeln!(out, "{} {}", format_x(frame.marker.x), format_y(frame.marker.y))?;
        out.flush()?;

        thread::sleep(config.interval);
    }
    Ok(())
}
