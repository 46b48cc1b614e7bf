// Copyright 2024 the rtls-capture contributors
// SPDX-License-Identifier: MPL-2.0

pub mod config;
pub mod error;
pub mod incoming_message_parser;
pub mod playback;
pub mod receiver;
pub mod sample_assembler;
pub mod sample_log;
pub mod sockets;
pub mod trilateration;

pub use error::{Error, ParseError, Result};

/// The largest dgram that we accept from a tag. Anything bigger is
/// rejected rather than silently truncated, so receives go into a buffer
/// one byte longer than this.
pub const DATAGRAM_BUFFER_SIZE: usize = 1024;

/// Number of leading characters of a legacy payload's byte literal
/// rendering that carry no value: the `b'` marker plus two filler bytes
/// from the sender.
pub const LEGACY_PREFIX_LEN: usize = 4;

/// Completed samples collected before the receiver stops, unless
/// configured otherwise. One capture session of the original tool.
pub const DEFAULT_SAMPLE_LIMIT: u64 = 10_001;

pub const DEFAULT_PORT: u16 = 5000;
