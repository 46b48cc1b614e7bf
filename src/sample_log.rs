// Copyright 2024 the rtls-capture contributors
// SPDX-License-Identifier: MPL-2.0

// One line per sample: "<x> <y>\n", y always with three decimals.
// The file is only ever appended to.

use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::incoming_message_parser::Sample;
use crate::sample_assembler::Assembled;

/// When log writes reach the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    /// Open, append and close the file for every write.
    PerWrite,
    /// Keep the file open for the whole capture and flush after every
    /// write.
    Flush,
}

pub fn format_x(x: f64) -> String {
    return format!("{x:?}");
}

pub fn format_y(y: f64) -> String {
    return format!("{y:.3}");
}

pub fn format_line(sample: &Sample) -> String {
    return format!("{} {}\n", format_x(sample.x), format_y(sample.y));
}

fn open_append(path: &Path) -> std::io::Result<File> {
    return OpenOptions::new().create(true).append(true).open(path);
}

/// Where appended text goes.
#[derive(Debug)]
enum Sink {
    PerWrite,
    Flush(BufWriter<File>),
}

#[derive(Debug)]
pub struct SampleLog {
    path: PathBuf,
    sink: Sink,
    line_open: bool,
}

impl SampleLog {
    /// Opens the log for appending. The file is created if it doesn't
    /// exist, but its directory must.
    pub fn open(path: impl Into<PathBuf>, durability: Durability) -> Result<SampleLog> {
        let path = path.into();
        // Fail now rather than on the first sample
        let file = open_append(&path)?;
        let sink = match durability {
            Durability::PerWrite => Sink::PerWrite,
            Durability::Flush => Sink::Flush(BufWriter::new(file)),
        };
        debug!("Appending samples to {} ({durability:?})", path.display());

        return Ok(SampleLog {
            path: path,
            sink: sink,
            line_open: false,
        });
    }

    pub fn path(&self) -> &Path {
        return &self.path;
    }

    pub fn durability(&self) -> Durability {
        match self.sink {
            Sink::PerWrite => Durability::PerWrite,
            Sink::Flush(_) => Durability::Flush,
        }
    }

    fn append(&mut self, text: &str) -> Result<()> {
        trace!("Appending {text:?}");
        match &mut self.sink {
            Sink::PerWrite => {
                let mut file = open_append(&self.path)?;
                file.write_all(text.as_bytes())?;
            }
            Sink::Flush(writer) => {
                writer.write_all(text.as_bytes())?;
                writer.flush()?;
            }
        }
        return Ok(());
    }

    /// Writes whatever `assembled` adds to the log. A pending X opens a
    /// line that the next complete sample closes.
    pub fn record(&mut self, assembled: &Assembled) -> Result<()> {
        match assembled {
            Assembled::Pending(x) => {
                self.append(&format!("{} ", format_x(*x)))?;
                self.line_open = true;
            }
            Assembled::Complete(sample) => {
                let text = if self.line_open {
                    format!("{}\n", format_y(sample.y))
                } else {
                    format_line(sample)
                };
                self.append(&text)?;
                self.line_open = false;
            }
        }
        return Ok(());
    }
}

/// Reads every complete sample from a log.
///
/// Every line must hold exactly an x and a y. The last line may hold only
/// an x, left behind by a capture that stopped between the two halves of
/// a sample; it is ignored.
pub fn read_samples<R: BufRead>(reader: R) -> Result<Vec<Sample>> {
    let mut samples = Vec::new();
    let mut unfinished: Option<usize> = None;

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        if let Some(open_line) = unfinished {
            // Only the very last line may be unfinished
            return Err(Error::MalformedLog {
                line: open_line,
                token: "<missing y>".to_string(),
            });
        }

        match tokens.as_slice() {
            [] => continue,
            [x] => {
                parse_token(line_number, x)?;
                unfinished = Some(line_number);
            }
            [x, y] => {
                let x = parse_token(line_number, x)?;
                let y = parse_token(line_number, y)?;
                samples.push(Sample::new(x, y));
            }
            [_, _, extra, ..] => {
                return Err(Error::MalformedLog {
                    line: line_number,
                    token: extra.to_string(),
                });
            }
        }
    }

    if let Some(open_line) = unfinished {
        debug!("Ignoring unfinished sample on line {open_line}");
    }
    return Ok(samples);
}

pub fn read_samples_from(path: &Path) -> Result<Vec<Sample>> {
    let file = File::open(path)?;
    return read_samples(std::io::BufReader::new(file));
}

fn parse_token(line: usize, token: &str) -> Result<f64> {
    return token.parse().map_err(|_| Error::MalformedLog {
        line: line,
        token: token.to_string(),
    });
}
