// Copyright 2024 the rtls-capture contributors
// SPDX-License-Identifier: MPL-2.0

use log::{error, LevelFilter};
use rtls_capture_lib::{config::ReceiverConfig, receiver::Receiver, Error};
use simple_logger::SimpleLogger;

fn main() -> Result<(), Error> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    let config = ReceiverConfig::from_args()?;
    let mut receiver = Receiver::new(&config)?;

    if let Err(err) = receiver.run() {
        error!("Capture stopped after {} samples: {err}", receiver.summary().samples);
        return Err(err);
    }
    Ok(())
}
