// Copyright 2024 the rtls-capture contributors
// SPDX-License-Identifier: MPL-2.0

// Sends the samples of a log to a receiver, standing in for a tag. With
// --ranges it works out each position from anchor ranges first, as the
// tag firmware does.

use std::thread;

use log::{debug, info, LevelFilter};
use rtls_capture_lib::{
    config::SenderConfig,
    sample_log::read_samples_from,
    sockets::{get_sender_socket, send_sample},
    trilateration::{locate_all, read_ranges_from},
    Error,
};
use simple_logger::SimpleLogger;

fn main() -> Result<(), Error> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    let config = SenderConfig::from_args()?;
    let samples = match &config.ranges_path {
        Some(path) => {
            let ranges = read_ranges_from(path)?;
            let samples = locate_all(&config.anchors, &ranges);
            info!(
                "Located {} of {} range sets from {}",
                samples.len(),
                ranges.len(),
                path.display()
            );
            samples
        }
        None => read_samples_from(&config.log_path)?,
    };
    let socket = get_sender_socket(&config.target)?;

    for sample in &samples {
        send_sample(&socket, config.target, sample, config.wire_format)?;
        debug!("Sent {sample:?}");
        if !config.delay.is_zero() {
            thread::sleep(config.delay);
        }
    }

    info!("Sent {} samples to {}", samples.len(), config.target);
    Ok(())
}
