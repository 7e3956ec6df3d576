// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Mock transports and a loopback mock server.
//!
//! ## Design Principles
//!
//! - Configurable behavior for different test scenarios
//! - Recording of interactions for verification
//! - Easy to set up error injection

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::JoinHandle;
use std::time::Duration;

use relay_modbus::client::FrameTransport;

// =============================================================================
// MockTransport
// =============================================================================

/// One scripted step of a [`MockTransport`] read sequence.
#[derive(Debug, Clone)]
pub enum ReadStep {
    /// Deliver these bytes (possibly split across several reads if the
    /// caller's buffer is smaller).
    Chunk(Vec<u8>),
    /// Return a zero-byte read: the peer closed the connection.
    Closed,
    /// Fail with a timeout-kind I/O error.
    TimedOut,
    /// Fail with an arbitrary I/O error kind.
    Error(io::ErrorKind),
}

/// A scripted in-memory transport.
///
/// Reads are served from a queue of [`ReadStep`]s; every write is
/// captured for later assertions. An exhausted queue behaves like a
/// closed connection.
#[derive(Debug, Default)]
pub struct MockTransport {
    reads: VecDeque<ReadStep>,
    written: Vec<u8>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl MockTransport {
    /// Creates an empty transport; any read reports a closed peer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response delivered in one read.
    pub fn respond_with(mut self, frame: impl Into<Vec<u8>>) -> Self {
        self.reads.push_back(ReadStep::Chunk(frame.into()));
        self
    }

    /// Queues a response delivered in `chunk_size`-byte reads.
    pub fn respond_in_chunks(mut self, frame: &[u8], chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");
        for chunk in frame.chunks(chunk_size) {
            self.reads.push_back(ReadStep::Chunk(chunk.to_vec()));
        }
        self
    }

    /// Queues a peer close.
    pub fn then_close(mut self) -> Self {
        self.reads.push_back(ReadStep::Closed);
        self
    }

    /// Queues a read timeout.
    pub fn then_timeout(mut self) -> Self {
        self.reads.push_back(ReadStep::TimedOut);
        self
    }

    /// Queues an arbitrary I/O error.
    pub fn then_error(mut self, kind: io::ErrorKind) -> Self {
        self.reads.push_back(ReadStep::Error(kind));
        self
    }

    /// Sets the advertised read deadline.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Returns every byte written so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Drains and returns the captured writes.
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }
}

impl FrameTransport for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            Some(ReadStep::Chunk(chunk)) => {
                let count = chunk.len().min(buf.len());
                buf[..count].copy_from_slice(&chunk[..count]);
                if count < chunk.len() {
                    self.reads.push_front(ReadStep::Chunk(chunk[count..].to_vec()));
                }
                Ok(count)
            }
            Some(ReadStep::Closed) | None => Ok(0),
            Some(ReadStep::TimedOut) => Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "scripted read timeout",
            )),
            Some(ReadStep::Error(kind)) => Err(io::Error::new(kind, "scripted read error")),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.written.extend_from_slice(buf);
        Ok(())
    }

    fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout
    }
}

// =============================================================================
// MockServer
// =============================================================================

/// A one-connection loopback TCP server driven by a handler closure.
///
/// The handler receives the accepted stream and runs on its own thread;
/// [`MockServer::join`] waits for it to finish.
pub struct MockServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Binds an ephemeral loopback port and serves one connection with
    /// `handler`.
    pub fn start<F>(handler: F) -> Self
    where
        F: FnOnce(TcpStream) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
        let addr = listener.local_addr().expect("listener local addr");

        let handle = std::thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                handler(stream);
            }
        });

        Self { addr, handle }
    }

    /// Returns the server's socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the server's port.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Waits for the handler to finish.
    pub fn join(self) {
        self.handle.join().expect("mock server thread panicked");
    }
}

/// Reads one complete Modbus TCP request frame from a stream.
///
/// Parses the MBAP length field to know how many bytes follow the
/// 7-byte envelope.
pub fn read_request(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut header = [0u8; 7];
    stream.read_exact(&mut header)?;

    let bytes_following = u16::from_be_bytes([header[4], header[5]]) as usize;
    // The unit identifier is part of the envelope but counted by the
    // length field.
    let mut rest = vec![0u8; bytes_following.saturating_sub(1)];
    stream.read_exact(&mut rest)?;

    let mut frame = header.to_vec();
    frame.extend_from_slice(&rest);
    Ok(frame)
}

/// Writes a complete frame to a stream.
pub fn write_response(stream: &mut TcpStream, frame: &[u8]) -> io::Result<()> {
    stream.write_all(frame)
}
