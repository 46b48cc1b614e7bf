// Copyright 2024 the rtls-capture contributors
// SPDX-License-Identifier: MPL-2.0

use log::trace;

use crate::error::ParseError;
use crate::incoming_message_parser::{
    parse_legacy_x, parse_legacy_y, parse_tagged_record, Sample,
};

/// Which half of a legacy pair the next dgram is taken to be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorState {
    ExpectX,
    ExpectY { pending_x: f64 },
}

/// What one accepted dgram produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Assembled {
    /// An X value waiting for its Y.
    Pending(f64),
    Complete(Sample),
}

/// Turns raw dgram payloads into samples.
pub trait SampleDecoder {
    /// Decodes one payload. On error the decoder's state is left as it
    /// was, so the payload counts as never received.
    fn accept(&mut self, payload: &[u8]) -> Result<Assembled, ParseError>;
}

/// Reassembles samples from alternating X and Y dgrams.
///
/// Nothing in a payload says which half it is; only its position in the
/// stream does. A lost dgram therefore swaps X and Y for every sample
/// after it.
#[derive(Debug)]
pub struct LegacyAssembler {
    cursor: CursorState,
}

impl LegacyAssembler {
    pub fn new() -> LegacyAssembler {
        return LegacyAssembler {
            cursor: CursorState::ExpectX,
        };
    }

    pub fn cursor(&self) -> CursorState {
        return self.cursor;
    }
}

impl Default for LegacyAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleDecoder for LegacyAssembler {
    fn accept(&mut self, payload: &[u8]) -> Result<Assembled, ParseError> {
        match self.cursor {
            CursorState::ExpectX => {
                let x = parse_legacy_x(payload)?;
                trace!("Got X {x:?}, waiting for Y");
                self.cursor = CursorState::ExpectY { pending_x: x };
                return Ok(Assembled::Pending(x));
            }
            CursorState::ExpectY { pending_x } => {
                let y = parse_legacy_y(payload)?;
                self.cursor = CursorState::ExpectX;
                return Ok(Assembled::Complete(Sample::new(pending_x, y)));
            }
        }
    }
}

/// Decodes `v1 <x> <y>` records, one sample per dgram.
#[derive(Debug, Default)]
pub struct TaggedDecoder;

impl SampleDecoder for TaggedDecoder {
    fn accept(&mut self, payload: &[u8]) -> Result<Assembled, ParseError> {
        return Ok(Assembled::Complete(parse_tagged_record(payload)?));
    }
}
