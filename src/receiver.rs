// Copyright 2024 the rtls-capture contributors
// SPDX-License-Identifier: MPL-2.0

use std::net::{SocketAddr, UdpSocket};

use log::{debug, info, trace, warn};

use crate::config::{MalformedPolicy, ReceiverConfig};
use crate::error::{Error, Result};
use crate::incoming_message_parser::Sample;
use crate::sample_assembler::{Assembled, SampleDecoder};
use crate::sample_log::{format_x, format_y, SampleLog};
use crate::sockets::{get_sample_socket, new_receive_buffer, receive_datagram};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    /// Completed samples written to the log.
    pub samples: u64,
    /// Dgrams received, including skipped ones.
    pub datagrams: u64,
    pub skipped: u64,
    pub idle_periods: u64,
}

/// Everything one capture carries from one dgram to the next: the
/// decoder with its cursor, and the log it writes to.
pub struct CaptureSession {
    decoder: Box<dyn SampleDecoder>,
    log: SampleLog,
    on_malformed: MalformedPolicy,
    summary: CaptureSummary,
}

impl CaptureSession {
    pub fn new(
        decoder: Box<dyn SampleDecoder>,
        log: SampleLog,
        on_malformed: MalformedPolicy,
    ) -> CaptureSession {
        return CaptureSession {
            decoder: decoder,
            log: log,
            on_malformed: on_malformed,
            summary: CaptureSummary::default(),
        };
    }

    pub fn summary(&self) -> CaptureSummary {
        return self.summary;
    }

    /// Decodes one payload and writes what it adds to the log. Returns the
    /// sample it completed, if any.
    pub fn process_datagram(&mut self, payload: &[u8]) -> Result<Option<Sample>> {
        self.summary.datagrams += 1;

        let assembled = match self.decoder.accept(payload) {
            Ok(assembled) => assembled,
            Err(err) => {
                self.skip_or_abort(err.into())?;
                return Ok(None);
            }
        };

        self.log.record(&assembled)?;
        match assembled {
            Assembled::Pending(_) => return Ok(None),
            Assembled::Complete(sample) => {
                self.summary.samples += 1;
                info!("X : {}, Y : {}", format_x(sample.x), format_y(sample.y));
                return Ok(Some(sample));
            }
        }
    }

    /// Applies the malformed dgram policy to `err`.
    pub fn skip_or_abort(&mut self, err: Error) -> Result<()> {
        match self.on_malformed {
            MalformedPolicy::Abort => return Err(err),
            MalformedPolicy::Skip => {
                self.summary.skipped += 1;
                warn!("Skipping dgram: {err}");
                return Ok(());
            }
        }
    }
}

/// Receives dgrams on one socket until enough samples are logged.
pub struct Receiver {
    socket: UdpSocket,
    session: CaptureSession,
    sample_limit: Option<u64>,
    stop_when_idle: bool,
}

impl Receiver {
    /// Binds the configured address and opens the log.
    pub fn new(config: &ReceiverConfig) -> Result<Receiver> {
        let socket = get_sample_socket(&config.bind_ip, config.port, config.idle_timeout)?;
        return Self::with_socket(socket, config);
    }

    /// Uses an already bound socket. Its read timeout is replaced by the
    /// configured idle timeout.
    pub fn with_socket(socket: UdpSocket, config: &ReceiverConfig) -> Result<Receiver> {
        socket.set_read_timeout(config.idle_timeout)?;
        let log = SampleLog::open(&config.log_path, config.durability)?;
        let session = CaptureSession::new(
            config.wire_format.decoder(),
            log,
            config.on_malformed,
        );

        return Ok(Receiver {
            socket: socket,
            session: session,
            sample_limit: config.sample_limit,
            stop_when_idle: config.stop_when_idle,
        });
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        return Ok(self.socket.local_addr()?);
    }

    pub fn summary(&self) -> CaptureSummary {
        return self.session.summary();
    }

    fn limit_reached(&self) -> bool {
        match self.sample_limit {
            Some(limit) => self.session.summary.samples >= limit,
            None => false,
        }
    }

    pub fn run(&mut self) -> Result<CaptureSummary> {
        info!("Listening for samples on {}", self.local_addr()?);
        let mut buf = new_receive_buffer();

        while !self.limit_reached() {
            match receive_datagram(&self.socket, &mut buf) {
                Ok(dgram) => {
                    trace!("dgram from {}", dgram.src);
                    self.session.process_datagram(dgram.payload)?;
                }
                Err(Error::Idle { timeout }) => {
                    self.session.summary.idle_periods += 1;
                    warn!("No dgram for {timeout:?}");
                    if self.stop_when_idle {
                        info!("Stopping capture, sender went idle");
                        break;
                    }
                }
                Err(err @ Error::Oversized { .. }) => self.session.skip_or_abort(err)?,
                Err(err) => return Err(err),
            }
        }

        let summary = self.summary();
        info!("Finished {} samples", summary.samples);
        debug!("{summary:?}");
        return Ok(summary);
    }
}
