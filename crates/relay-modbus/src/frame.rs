// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! MBAP frame primitives: header codec, frame buffer, sequencer.
//!
//! Every Modbus TCP frame is prefixed by the 7-byte MBAP envelope:
//!
//! ```text
//! offset  0-1   Transaction Identifier   big-endian
//! offset  2-3   Protocol Identifier      big-endian, always 0
//! offset  4-5   Length                   big-endian, bytes following this field
//! offset  6     Unit Identifier
//! offset  7     Function Code
//! offset  8+    Payload / Exception Code
//! ```
//!
//! All multi-byte envelope fields are big-endian on the wire regardless
//! of host byte order. Payload *data* ordering is configurable and lives
//! in [`crate::client::conversion`]; nothing in this module is.

use std::sync::atomic::{AtomicU16, Ordering};

use byteorder::{BigEndian, ByteOrder as _};

use crate::error::ProtocolError;

// =============================================================================
// Constants
// =============================================================================

/// Maximum Modbus TCP frame size in bytes (MBAP header + 253-byte PDU).
pub const MAX_FRAME_SIZE: usize = 260;

/// Length of the MBAP envelope in bytes.
pub const MBAP_HEADER_LEN: usize = 7;

/// The protocol identifier for Modbus; any other value is a framing error.
pub const PROTOCOL_ID: u16 = 0x0000;

/// Offset added to the request function code to signal an exception response.
pub const EXCEPTION_OFFSET: u8 = 0x80;

/// The broadcast unit identifier (meaningful only in gateway mode).
pub const BROADCAST_UNIT_ID: u8 = 0;

/// Highest unit identifier addressable through a serial-line gateway.
pub const MAX_UNIT_ID: u8 = 247;

// =============================================================================
// MbapHeader
// =============================================================================

/// The decoded 7-byte MBAP envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    /// Per-request sequence number, echoed by the server.
    pub transaction_id: u16,
    /// Must be zero for Modbus.
    pub protocol_id: u16,
    /// Number of bytes following the length field (unit id + PDU).
    pub length: u16,
    /// Address of the logical end device.
    pub unit_id: u8,
}

impl MbapHeader {
    /// Encodes the envelope into its wire representation.
    ///
    /// Multi-byte fields are written big-endian unconditionally; this is
    /// a byte-order transform, not a host-order pass-through.
    pub fn encode(&self) -> [u8; MBAP_HEADER_LEN] {
        let mut bytes = [0u8; MBAP_HEADER_LEN];
        BigEndian::write_u16(&mut bytes[0..2], self.transaction_id);
        BigEndian::write_u16(&mut bytes[2..4], self.protocol_id);
        BigEndian::write_u16(&mut bytes[4..6], self.length);
        bytes[6] = self.unit_id;
        bytes
    }

    /// Decodes an envelope from the first 7 bytes of `bytes`.
    ///
    /// Field validation (protocol identifier, length plausibility) is the
    /// caller's concern; this only requires enough bytes to decode.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < MBAP_HEADER_LEN {
            return Err(ProtocolError::frame_too_short(MBAP_HEADER_LEN, bytes.len()));
        }

        Ok(Self {
            transaction_id: BigEndian::read_u16(&bytes[0..2]),
            protocol_id: BigEndian::read_u16(&bytes[2..4]),
            length: BigEndian::read_u16(&bytes[4..6]),
            unit_id: bytes[6],
        })
    }
}

// =============================================================================
// FrameBuffer
// =============================================================================

/// Fixed-capacity frame storage, reused for every exchange.
///
/// One buffer serves both directions of an exchange: the request is
/// assembled in it through a [`FrameWriter`], then it is cleared and the
/// response accumulates into it across partial reads. It is owned
/// exclusively by one client; `&mut` access rules out concurrent
/// exchanges at compile time.
#[derive(Debug)]
pub struct FrameBuffer {
    storage: [u8; MAX_FRAME_SIZE],
    filled: usize,
}

impl FrameBuffer {
    /// Creates an empty frame buffer.
    pub fn new() -> Self {
        Self {
            storage: [0u8; MAX_FRAME_SIZE],
            filled: 0,
        }
    }

    /// Clears the fill cursor. The storage itself is not zeroed.
    #[inline]
    pub fn reset(&mut self) {
        self.filled = 0;
    }

    /// Returns a writer positioned at offset 0.
    pub fn writer(&mut self) -> FrameWriter<'_> {
        FrameWriter {
            storage: &mut self.storage,
            position: 0,
        }
    }

    /// Returns the buffer contents.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.storage
    }

    /// Returns the unfilled tail of the buffer, for reading into.
    #[inline]
    pub fn unfilled(&mut self) -> &mut [u8] {
        &mut self.storage[self.filled..]
    }

    /// Advances the fill cursor after `count` bytes were read in.
    #[inline]
    pub fn advance(&mut self, count: usize) {
        debug_assert!(self.filled + count <= MAX_FRAME_SIZE);
        self.filled += count;
    }

    /// Returns the number of bytes accumulated so far.
    #[inline]
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Returns the total capacity.
    #[inline]
    pub const fn capacity(&self) -> usize {
        MAX_FRAME_SIZE
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// FrameWriter
// =============================================================================

/// Sequential write cursor over a [`FrameBuffer`].
///
/// Writing past [`MAX_FRAME_SIZE`] is a contract violation and fails
/// with [`ProtocolError::FrameTooLong`] rather than growing the buffer.
#[derive(Debug)]
pub struct FrameWriter<'a> {
    storage: &'a mut [u8; MAX_FRAME_SIZE],
    position: usize,
}

impl FrameWriter<'_> {
    /// Moves the cursor to an absolute offset.
    #[inline]
    pub fn seek(&mut self, position: usize) {
        debug_assert!(position <= MAX_FRAME_SIZE);
        self.position = position;
    }

    /// Returns the current cursor position.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, value: u8) -> Result<(), ProtocolError> {
        self.check_capacity(1)?;
        self.storage[self.position] = value;
        self.position += 1;
        Ok(())
    }

    /// Writes a 16-bit value big-endian (protocol field order).
    pub fn write_u16(&mut self, value: u16) -> Result<(), ProtocolError> {
        self.check_capacity(2)?;
        BigEndian::write_u16(&mut self.storage[self.position..self.position + 2], value);
        self.position += 2;
        Ok(())
    }

    /// Writes a byte slice.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.check_capacity(bytes.len())?;
        self.storage[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
        Ok(())
    }

    fn check_capacity(&self, additional: usize) -> Result<(), ProtocolError> {
        if self.position + additional > MAX_FRAME_SIZE {
            return Err(ProtocolError::frame_too_long(
                MAX_FRAME_SIZE,
                self.position + additional,
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TransactionSequencer
// =============================================================================

/// Wrapping 16-bit transaction identifier source.
///
/// Each call to [`next`](Self::next) returns a distinct value until the
/// counter wraps at 65536. Safe under concurrent callers sharing one
/// session; the identifier is used only for request self-identification
/// on the wire, never for response correlation (the client runs one
/// exchange at a time).
#[derive(Debug, Default)]
pub struct TransactionSequencer {
    counter: AtomicU16,
}

impl TransactionSequencer {
    /// Creates a sequencer starting at zero.
    pub const fn new() -> Self {
        Self {
            counter: AtomicU16::new(0),
        }
    }

    /// Returns the current identifier and advances the counter,
    /// wrapping at 65536.
    #[inline]
    pub fn next(&self) -> u16 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }
}

// =============================================================================
// Tests
// =============================================================================
