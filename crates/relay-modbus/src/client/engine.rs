// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The request/response transceive engine.
//!
//! This module orchestrates one full Modbus TCP exchange: envelope
//! assembly and request transmission, then incremental response
//! accumulation from a stream that may deliver the frame across
//! arbitrarily many partial reads.
//!
//! The response decoder is a small state machine:
//!
//! ```text
//! accumulating ──(≥ 7 bytes)──► header parsed ──(length satisfied)──► complete
//!       │                             │
//!       └──── zero-byte read / timeout / framing violation ──► failed
//! ```
//!
//! The envelope is parsed exactly once; afterwards each read costs only
//! the length comparison, however fragmented the delivery. Nothing here
//! retries: every failure is surfaced to the caller as a distinct
//! [`ModbusError`] classification.

use std::io;

use crate::error::{ConnectionError, ModbusError, ModbusResult, ProtocolError, TimeoutError};
use crate::frame::{
    FrameBuffer, FrameWriter, MbapHeader, TransactionSequencer, BROADCAST_UNIT_ID,
    EXCEPTION_OFFSET, MAX_UNIT_ID, MBAP_HEADER_LEN, PROTOCOL_ID,
};
use crate::types::FunctionCode;

use super::transport::FrameTransport;

// =============================================================================
// TransceiveEngine
// =============================================================================

/// Stateful engine driving one exchange at a time over a borrowed
/// transport.
///
/// The engine owns the session's [`FrameBuffer`] and
/// [`TransactionSequencer`]; taking `&mut self` through
/// [`transceive`](Self::transceive) makes a second in-flight exchange
/// unrepresentable, which is what permits discarding the response
/// transaction identifier.
#[derive(Debug)]
pub struct TransceiveEngine {
    buffer: FrameBuffer,
    sequencer: TransactionSequencer,
    gateway_mode: bool,
}

impl TransceiveEngine {
    /// Creates an engine.
    pub fn new(gateway_mode: bool) -> Self {
        Self {
            buffer: FrameBuffer::new(),
            sequencer: TransactionSequencer::new(),
            gateway_mode,
        }
    }

    /// Returns the gateway mode flag.
    pub fn gateway_mode(&self) -> bool {
        self.gateway_mode
    }

    /// Enables or disables gateway mode.
    pub fn set_gateway_mode(&mut self, enabled: bool) {
        self.gateway_mode = enabled;
    }

    /// Performs one full request/response exchange.
    ///
    /// `build_payload` appends the function code byte and the
    /// function-specific fields; the engine reserves the envelope
    /// region, backfills it afterwards and transmits the frame. The
    /// returned slice spans the response from the function code byte to
    /// the end of the received frame. Broadcast writes (gateway mode,
    /// unit identifier 0) return an empty slice without awaiting a
    /// response.
    ///
    /// # Errors
    ///
    /// Every failure classification is a distinct variant:
    /// validation ([`ProtocolError::InvalidUnitId`],
    /// [`ProtocolError::InvalidBroadcastFunction`]) before any I/O,
    /// transport ([`ConnectionError::Closed`], [`TimeoutError`]),
    /// framing ([`ProtocolError::InvalidProtocolId`]), remote exceptions
    /// ([`ProtocolError::ExceptionResponse`]) and desynchronization
    /// ([`ProtocolError::FunctionCodeMismatch`]).
    pub fn transceive<T, F>(
        &mut self,
        transport: &mut T,
        unit_id: u8,
        function: FunctionCode,
        build_payload: F,
    ) -> ModbusResult<&[u8]>
    where
        T: FrameTransport,
        F: FnOnce(&mut FrameWriter<'_>) -> ModbusResult<()>,
    {
        // Validation happens before a single byte is sent.
        if self.gateway_mode && unit_id > MAX_UNIT_ID {
            return Err(ProtocolError::invalid_unit_id(unit_id).into());
        }

        let broadcast = self.gateway_mode && unit_id == BROADCAST_UNIT_ID;
        if broadcast && !function.is_write_class() {
            return Err(ProtocolError::invalid_broadcast_function(function.as_u8()).into());
        }

        // Build the request: reserve the envelope, append the PDU, then
        // seek back and backfill the envelope around it.
        self.buffer.reset();
        let frame_len = {
            let mut writer = self.buffer.writer();
            writer.seek(MBAP_HEADER_LEN);
            build_payload(&mut writer)?;
            let frame_len = writer.position();

            let header = MbapHeader {
                transaction_id: self.sequencer.next(),
                protocol_id: PROTOCOL_ID,
                length: (frame_len - 6) as u16,
                unit_id,
            };
            writer.seek(0);
            writer.write_bytes(&header.encode())?;
            frame_len
        };

        transport
            .write_all(&self.buffer.bytes()[..frame_len])
            .map_err(|e| map_write_error(e, transport))?;

        tracing::trace!(
            unit_id,
            function = %function,
            frame_len,
            broadcast,
            "request frame sent"
        );

        // Broadcasts elicit no response.
        if broadcast {
            return Ok(&[]);
        }

        // Accumulate the response. The header is parsed once; afterwards
        // completion is a length comparison per read.
        self.buffer.reset();
        let mut bytes_following: usize = 0;
        let mut header_parsed = false;

        loop {
            let count = match transport.read(self.buffer.unfilled()) {
                Ok(count) => count,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_read_error(e, transport)),
            };

            if count == 0 {
                return Err(ConnectionError::closed(Some(
                    "peer closed the connection mid-frame".to_string(),
                ))
                .into());
            }

            self.buffer.advance(count);

            if self.buffer.filled() >= MBAP_HEADER_LEN {
                if !header_parsed {
                    let header = MbapHeader::decode(self.buffer.bytes())?;
                    // The transaction identifier is read and discarded:
                    // a single outstanding request per session makes
                    // correlation unnecessary.
                    if header.protocol_id != PROTOCOL_ID {
                        return Err(ProtocolError::invalid_protocol_id(header.protocol_id).into());
                    }
                    bytes_following = header.length as usize;
                    header_parsed = true;
                }

                if self.buffer.filled() - 6 >= bytes_following {
                    break;
                }
            }
        }

        let frame_len = self.buffer.filled();
        let raw_function_code = self.buffer.bytes()[MBAP_HEADER_LEN];

        if raw_function_code == function.as_u8() + EXCEPTION_OFFSET {
            if frame_len < MBAP_HEADER_LEN + 2 {
                return Err(ProtocolError::frame_too_short(MBAP_HEADER_LEN + 2, frame_len).into());
            }
            let exception_code = self.buffer.bytes()[MBAP_HEADER_LEN + 1];
            tracing::debug!(
                unit_id,
                function = %function,
                exception_code,
                "exception response received"
            );
            return Err(ProtocolError::exception_response(function.as_u8(), exception_code).into());
        }

        if raw_function_code != function.as_u8() {
            return Err(
                ProtocolError::function_code_mismatch(function.as_u8(), raw_function_code).into(),
            );
        }

        Ok(&self.buffer.bytes()[MBAP_HEADER_LEN..frame_len])
    }
}

// =============================================================================
// I/O error mapping
// =============================================================================

fn map_read_error<T: FrameTransport>(error: io::Error, transport: &T) -> ModbusError {
    match error.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            TimeoutError::read(transport.read_timeout().unwrap_or_default()).into()
        }
        _ => ConnectionError::from(error).into(),
    }
}

fn map_write_error<T: FrameTransport>(error: io::Error, transport: &T) -> ModbusError {
    match error.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            TimeoutError::write(transport.write_timeout().unwrap_or_default()).into()
        }
        _ => ConnectionError::from(error).into(),
    }
}

// =============================================================================
// Tests
// =============================================================================
