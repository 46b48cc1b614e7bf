// Copyright 2024 the rtls-capture contributors
// SPDX-License-Identifier: MPL-2.0

use std::time::Duration;

use thiserror::Error;

/// Reasons a single payload could not be turned into a coordinate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{text:?} is not a number")]
    NotANumber { text: String },

    #[error("{value} is not a finite coordinate")]
    NonFinite { value: f64 },

    #[error("unknown record version {tag:?}")]
    UnknownVersion { tag: String },

    #[error("record has {found} fields, expected a version tag, x and y")]
    FieldCount { found: usize },

    #[error("record is not valid UTF-8")]
    NotUtf8,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("dgram of {len} bytes exceeds the {limit} byte limit")]
    Oversized { len: usize, limit: usize },

    #[error("no dgram received for {timeout:?}")]
    Idle { timeout: Duration },

    #[error("log line {line}: {token:?} is not a coordinate")]
    MalformedLog { line: usize, token: String },

    #[error("Logger error: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
