// Copyright 2024 the rtls-capture contributors
// SPDX-License-Identifier: MPL-2.0

use std::fmt::Write;
use std::sync::LazyLock;

use log::trace;
use regex::Regex;

use crate::error::ParseError;
use crate::LEGACY_PREFIX_LEN;

/// Version tag that opens every single-dgram sample record.
pub const TAGGED_RECORD_VERSION: &str = "v1";

/// Two bytes the legacy senders put in front of every value. Together
/// with the `b'` marker they make up the prefix the parsers drop.
pub const LEGACY_FILLER: &str = "::";

static NON_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9.]").expect("Invalid regex pattern"));

/// One positional fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64) -> Sample {
        return Sample { x: x, y: y };
    }
}

/// Renders a payload as a byte string literal, `b'...'`.
///
/// The legacy senders' framing was built around this rendering rather
/// than around the raw bytes: the first [`LEGACY_PREFIX_LEN`] characters
/// of it are the `b'` marker plus two filler bytes, and the closing quote
/// is stray noise the parsers must strip.
pub fn byte_literal(payload: &[u8]) -> String {
    let quote = if payload.contains(&b'\'') && !payload.contains(&b'"') {
        '"'
    } else {
        '\''
    };

    let mut text = String::with_capacity(payload.len() + 3);
    text.push('b');
    text.push(quote);
    for &byte in payload {
        match byte {
            b'\\' => text.push_str("\\\\"),
            b'\t' => text.push_str("\\t"),
            b'\n' => text.push_str("\\n"),
            b'\r' => text.push_str("\\r"),
            _ if byte as char == quote => {
                text.push('\\');
                text.push(quote);
            }
            0x20..=0x7e => text.push(byte as char),
            _ => {
                // Writing to a String can't fail
                let _ = write!(text, "\\x{byte:02x}");
            }
        }
    }
    text.push(quote);
    return text;
}

fn strip_legacy_prefix(payload: &[u8]) -> String {
    let literal = byte_literal(payload);
    trace!("legacy payload {literal}");
    // The literal is always ASCII, so this can't split a character
    return literal.get(LEGACY_PREFIX_LEN..).unwrap_or("").to_string();
}

fn parse_coordinate(text: &str) -> Result<f64, ParseError> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| ParseError::NotANumber {
            text: text.to_string(),
        })?;
    if !value.is_finite() {
        return Err(ParseError::NonFinite { value: value });
    }
    return Ok(value);
}

/// Removes `_` digit group separators (`1_000.5`). Each one must sit
/// between two digits; otherwise the text is returned as is and fails to
/// parse.
fn strip_digit_separators(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut stripped = String::with_capacity(text.len());
    for (index, &c) in chars.iter().enumerate() {
        if c != '_' {
            stripped.push(c);
            continue;
        }
        let before = index.checked_sub(1).and_then(|i| chars.get(i));
        let after = chars.get(index + 1);
        let between_digits = matches!((before, after), (Some(b), Some(a))
            if b.is_ascii_digit() && a.is_ascii_digit());
        if !between_digits {
            return text.to_string();
        }
    }
    return stripped;
}

/// Parses the X half of a legacy pair: drop the prefix, drop every single
/// quote, and what's left must be a number. Digit group separators are
/// allowed.
pub fn parse_legacy_x(payload: &[u8]) -> Result<f64, ParseError> {
    let text = strip_legacy_prefix(payload).replace('\'', "");
    return parse_coordinate(&strip_digit_separators(&text));
}

/// Parses the Y half of a legacy pair. Y dgrams carry arbitrary noise, so
/// everything that isn't a digit or a decimal point is removed. Note that
/// this also removes a minus sign.
pub fn parse_legacy_y(payload: &[u8]) -> Result<f64, ParseError> {
    let text = strip_legacy_prefix(payload);
    let digits = NON_NUMERIC.replace_all(&text, "");
    return parse_coordinate(&digits);
}

/// Parses a whole sample sent as one dgram: `v1 <x> <y>`.
pub fn parse_tagged_record(payload: &[u8]) -> Result<Sample, ParseError> {
    let text = std::str::from_utf8(payload).map_err(|_| ParseError::NotUtf8)?;
    let fields: Vec<&str> = text.split_whitespace().collect();

    if let Some(tag) = fields.first() {
        if *tag != TAGGED_RECORD_VERSION {
            return Err(ParseError::UnknownVersion {
                tag: tag.to_string(),
            });
        }
    }
    if fields.len() != 3 {
        return Err(ParseError::FieldCount {
            found: fields.len(),
        });
    }

    let x = parse_coordinate(fields[1])?;
    let y = parse_coordinate(fields[2])?;
    return Ok(Sample::new(x, y));
}

/// Builds a dgram that the legacy parsers read back as `value`.
pub fn legacy_payload(value: f64) -> Vec<u8> {
    return format!("{LEGACY_FILLER}{value:?}").into_bytes();
}

/// Builds a single-dgram record for `sample`.
pub fn tagged_payload(sample: &Sample) -> Vec<u8> {
    return format!("{TAGGED_RECORD_VERSION} {:?} {:?}", sample.x, sample.y).into_bytes();
}
