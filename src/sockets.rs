// Copyright 2024 the rtls-capture contributors
// SPDX-License-Identifier: MPL-2.0

use std::{
    io::ErrorKind,
    net::{SocketAddr, UdpSocket},
    time::Duration,
};

use log::{max_level, trace, LevelFilter};

use crate::config::WireFormat;
use crate::error::{Error, Result};
use crate::incoming_message_parser::{legacy_payload, tagged_payload, Sample};
use crate::DATAGRAM_BUFFER_SIZE;

/// Receive buffer for [`receive_datagram`]. One byte longer than the
/// largest dgram we accept so that a bigger one shows up as a full buffer
/// instead of being cut down to size unnoticed.
pub type ReceiveBuffer = [u8; DATAGRAM_BUFFER_SIZE + 1];

pub fn new_receive_buffer() -> ReceiveBuffer {
    return [0u8; DATAGRAM_BUFFER_SIZE + 1];
}

#[derive(Debug)]
pub struct Datagram<'a> {
    pub payload: &'a [u8],
    pub src: SocketAddr,
}

fn get_socket(bind_ip: &str, port: u16) -> std::result::Result<UdpSocket, std::io::Error> {
    let addr = format!("{}:{}", bind_ip, port);
    return UdpSocket::bind(addr);
}

/// Binds the socket tags send their coordinates to. With an idle timeout
/// set, a receive that waits longer than that fails with [`Error::Idle`]
/// instead of blocking forever.
pub fn get_sample_socket(
    bind_ip: &str,
    port: u16,
    idle_timeout: Option<Duration>,
) -> std::result::Result<UdpSocket, std::io::Error> {
    let socket = get_socket(bind_ip, port)?;
    socket.set_read_timeout(idle_timeout)?;
    return Ok(socket);
}

/// Blocks until one dgram arrives.
pub fn receive_datagram<'a>(
    socket: &UdpSocket,
    buf: &'a mut ReceiveBuffer,
) -> Result<Datagram<'a>> {
    let (amt, src) = match socket.recv_from(buf) {
        Ok(received) => received,
        Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
            let timeout = socket.read_timeout()?.unwrap_or_default();
            return Err(Error::Idle { timeout: timeout });
        }
        Err(err) => return Err(err.into()),
    };

    if amt > DATAGRAM_BUFFER_SIZE {
        return Err(Error::Oversized {
            len: amt,
            limit: DATAGRAM_BUFFER_SIZE,
        });
    }

    let payload = &buf[..amt];
    if max_level() >= LevelFilter::Trace {
        trace!("Got {amt} bytes from {src}: {}", String::from_utf8_lossy(payload));
    }
    return Ok(Datagram {
        payload: payload,
        src: src,
    });
}

/// Sends `sample` to `target` the way a tag would: an X dgram then a Y
/// dgram, or a single record.
pub fn send_sample(
    socket: &UdpSocket,
    target: SocketAddr,
    sample: &Sample,
    format: WireFormat,
) -> Result<()> {
    match format {
        WireFormat::Legacy => {
            socket.send_to(&legacy_payload(sample.x), target)?;
            socket.send_to(&legacy_payload(sample.y), target)?;
        }
        WireFormat::Tagged => {
            socket.send_to(&tagged_payload(sample), target)?;
        }
    }
    return Ok(());
}

/// A socket on an ephemeral port, in the same address family as `target`.
pub fn get_sender_socket(target: &SocketAddr) -> std::result::Result<UdpSocket, std::io::Error> {
    let bind_ip = if target.is_ipv6() { "[::]" } else { "0.0.0.0" };
    return get_socket(bind_ip, 0);
}
