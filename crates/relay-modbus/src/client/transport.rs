// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Abstract byte-stream transport for the transceive engine.
//!
//! The engine is transport-agnostic: it needs only "read available
//! bytes" and "write bytes" over a connected stream. [`TcpTransport`]
//! is the production implementation; tests substitute scripted
//! transports with identical framing behavior.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{ConnectionError, ModbusError, ModbusResult};
use crate::types::ModbusTcpConfig;

// =============================================================================
// TransportState
// =============================================================================

/// Connection state of a client transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportState {
    /// Transport is disconnected.
    #[default]
    Disconnected,
    /// Transport is connecting.
    Connecting,
    /// Transport is connected and ready.
    Connected,
    /// Transport encountered a fatal failure; reconnect before reuse.
    Error,
}

impl TransportState {
    /// Returns `true` if the transport is connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns `true` if the transport can accept operations.
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// FrameTransport Trait
// =============================================================================

/// Blocking byte-stream capability consumed by the transceive engine.
///
/// `read` follows `std::io::Read` semantics: it blocks until at least
/// one byte is available (or the configured read deadline expires,
/// surfaced as `WouldBlock`/`TimedOut`), may return fewer bytes than
/// requested, and returns `Ok(0)` only when the peer closed the
/// connection. The engine relies on exactly these semantics to detect a
/// mid-frame close.
pub trait FrameTransport {
    /// Reads available bytes into `buf`, returning the count.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes all of `buf` to the stream.
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Returns the effective read deadline, for timeout error reporting.
    fn read_timeout(&self) -> Option<Duration> {
        None
    }

    /// Returns the effective write deadline, for timeout error reporting.
    fn write_timeout(&self) -> Option<Duration> {
        None
    }
}

// =============================================================================
// TcpTransport
// =============================================================================

/// A connected TCP stream with Modbus socket options applied.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    peer: SocketAddr,
    read_deadline: Option<Duration>,
    write_deadline: Option<Duration>,
}

impl TcpTransport {
    /// Connects to the configured endpoint.
    ///
    /// The host is parsed as a socket address first and resolved through
    /// DNS otherwise; the connect attempt is bounded by
    /// `config.connect_timeout`.
    pub fn connect(config: &ModbusTcpConfig) -> ModbusResult<Self> {
        let peer = Self::resolve_address(config)?;

        let stream = TcpStream::connect_timeout(&peer, config.connect_timeout).map_err(|e| {
            ModbusError::connection(match e.kind() {
                io::ErrorKind::TimedOut => ConnectionError::timed_out(
                    &config.host,
                    config.port,
                    config.connect_timeout,
                ),
                io::ErrorKind::ConnectionRefused => {
                    ConnectionError::refused_with(&config.host, config.port, e)
                }
                _ => ConnectionError::io("connect failed", e),
            })
        })?;

        stream
            .set_nodelay(config.tcp_nodelay)
            .map_err(|e| ModbusError::connection(ConnectionError::io("set TCP_NODELAY", e)))?;
        stream
            .set_read_timeout(config.read_timeout)
            .map_err(|e| ModbusError::connection(ConnectionError::io("set read timeout", e)))?;
        stream
            .set_write_timeout(config.write_timeout)
            .map_err(|e| ModbusError::connection(ConnectionError::io("set write timeout", e)))?;

        Ok(Self {
            stream,
            peer,
            read_deadline: config.read_timeout,
            write_deadline: config.write_timeout,
        })
    }

    /// Returns the peer socket address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Shuts down both directions of the stream.
    ///
    /// Errors are ignored: the peer may already have closed.
    pub fn shutdown(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    fn resolve_address(config: &ModbusTcpConfig) -> ModbusResult<SocketAddr> {
        let addr_str = config.socket_addr();

        if let Ok(addr) = addr_str.parse::<SocketAddr>() {
            return Ok(addr);
        }

        let mut addrs = addr_str.to_socket_addrs().map_err(|e| {
            ModbusError::connection(ConnectionError::DnsResolutionFailed {
                hostname: config.host.clone(),
                source: Some(e),
            })
        })?;

        addrs
            .next()
            .ok_or_else(|| ModbusError::connection(ConnectionError::dns_failed(&config.host)))
    }
}

impl FrameTransport for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.stream.write_all(buf)
    }

    fn read_timeout(&self) -> Option<Duration> {
        self.read_deadline
    }

    fn write_timeout(&self) -> Option<Duration> {
        self.write_deadline
    }
}

// =============================================================================
// Tests
// =============================================================================
