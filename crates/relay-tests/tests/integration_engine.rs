// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Transceive Engine Integration Tests
//!
//! Exercises the protocol engine over scripted transports:
//!
//! - request/response round trips across function codes and unit ids
//! - broadcast gating in gateway mode
//! - partial-delivery robustness down to 1-byte reads
//! - envelope length invariant
//! - exception-bit detection for every exception code
//! - sequencer wraparound
//! - transport-closed and framing failure paths

use relay_modbus::client::TransceiveEngine;
use relay_modbus::error::{ConnectionError, ModbusError, ProtocolError};
use relay_modbus::frame::TransactionSequencer;
use relay_modbus::types::FunctionCode;

use relay_tests::common::fixtures;
use relay_tests::common::mocks::MockTransport;

// =============================================================================
// Round Trips
// =============================================================================

#[test]
fn test_round_trip_across_unit_ids() {
    // A well-formed mock response with matching function code yields the
    // exact payload the mock wrote after the envelope, for gateway-range
    // unit ids.
    for unit_id in [1u8, 17, 100, 200, 247] {
        let pdu = [0x03, 0x04, 0xDE, 0xAD, 0xBE, 0xEF];
        let frame = fixtures::response_frame(0, unit_id, &pdu);

        let mut transport = MockTransport::new().respond_with(frame);
        let mut engine = TransceiveEngine::new(true);

        let payload = engine
            .transceive(&mut transport, unit_id, FunctionCode::ReadHoldingRegisters, |w| {
                w.write_u8(0x03)?;
                w.write_u16(0x0000)?;
                w.write_u16(0x0002)?;
                Ok(())
            })
            .unwrap()
            .to_vec();

        assert_eq!(payload, pdu);
    }
}

#[test]
fn test_round_trip_across_function_codes() {
    let cases: &[(FunctionCode, &[u8])] = &[
        (FunctionCode::ReadCoils, &[0x01, 0x01, 0x05]),
        (FunctionCode::ReadDiscreteInputs, &[0x02, 0x01, 0x03]),
        (FunctionCode::ReadHoldingRegisters, &[0x03, 0x02, 0x12, 0x34]),
        (FunctionCode::ReadInputRegisters, &[0x04, 0x02, 0xAB, 0xCD]),
        (FunctionCode::WriteSingleCoil, &[0x05, 0x00, 0x07, 0xFF, 0x00]),
        (FunctionCode::WriteSingleRegister, &[0x06, 0x00, 0x07, 0x00, 0x2A]),
        (FunctionCode::WriteMultipleCoils, &[0x0F, 0x00, 0x00, 0x00, 0x08]),
        (FunctionCode::WriteMultipleRegisters, &[0x10, 0x00, 0x00, 0x00, 0x02]),
        (FunctionCode::MaskWriteRegister, &[0x16, 0x00, 0x01, 0xF0, 0xF0, 0x0F, 0x0F]),
        (FunctionCode::ReadWriteMultipleRegisters, &[0x17, 0x02, 0x00, 0x2A]),
    ];

    for (function, pdu) in cases {
        let frame = fixtures::response_frame(0, 1, pdu);
        let mut transport = MockTransport::new().respond_with(frame);
        let mut engine = TransceiveEngine::new(false);

        let payload = engine
            .transceive(&mut transport, 1, *function, |w| {
                w.write_u8(function.as_u8())?;
                Ok(())
            })
            .unwrap()
            .to_vec();

        assert_eq!(&payload, pdu, "function {function}");
    }
}

// =============================================================================
// Broadcast Gating
// =============================================================================

#[test]
fn test_broadcast_write_has_no_read_phase() {
    // No read steps are queued: a read attempt would surface as a
    // connection-closed error, so an Ok proves nothing was read.
    let mut transport = MockTransport::new();
    let mut engine = TransceiveEngine::new(true);

    let payload = engine
        .transceive(&mut transport, 0, FunctionCode::WriteMultipleRegisters, |w| {
            w.write_u8(0x10)?;
            w.write_u16(0x0000)?;
            w.write_u16(0x0001)?;
            w.write_u8(0x02)?;
            w.write_u16(0x1234)?;
            Ok(())
        })
        .unwrap()
        .to_vec();

    assert!(payload.is_empty());
    assert!(!transport.written().is_empty());
}

#[test]
fn test_every_write_class_function_broadcasts() {
    for function in [
        FunctionCode::WriteSingleCoil,
        FunctionCode::WriteSingleRegister,
        FunctionCode::WriteMultipleCoils,
        FunctionCode::WriteMultipleRegisters,
        FunctionCode::WriteFileRecord,
        FunctionCode::MaskWriteRegister,
    ] {
        let mut transport = MockTransport::new();
        let mut engine = TransceiveEngine::new(true);

        let result = engine.transceive(&mut transport, 0, function, |w| {
            w.write_u8(function.as_u8())?;
            Ok(())
        });

        assert!(result.is_ok(), "function {function}");
    }
}

#[test]
fn test_broadcast_rejects_reads_before_any_byte() {
    for function in [
        FunctionCode::ReadCoils,
        FunctionCode::ReadDiscreteInputs,
        FunctionCode::ReadHoldingRegisters,
        FunctionCode::ReadInputRegisters,
        FunctionCode::ReadWriteMultipleRegisters,
    ] {
        let mut transport = MockTransport::new();
        let mut engine = TransceiveEngine::new(true);

        let error = engine
            .transceive(&mut transport, 0, function, |w| {
                w.write_u8(function.as_u8())?;
                Ok(())
            })
            .unwrap_err();

        assert!(
            matches!(
                error,
                ModbusError::Protocol(ProtocolError::InvalidBroadcastFunction { .. })
            ),
            "function {function}"
        );
        assert!(
            transport.written().is_empty(),
            "no bytes may be sent for rejected broadcast ({function})"
        );
    }
}

// =============================================================================
// Partial Delivery
// =============================================================================

#[test]
fn test_partial_delivery_all_chunk_sizes() {
    // Feeding the same frame in every possible chunking, including one
    // byte at a time, must decode identically.
    let pdu = [0x03, 0x06, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
    let frame = fixtures::response_frame(0x0042, 9, &pdu);

    for chunk_size in 1..=frame.len() {
        let mut transport = MockTransport::new().respond_in_chunks(&frame, chunk_size);
        let mut engine = TransceiveEngine::new(false);

        let payload = engine
            .transceive(&mut transport, 9, FunctionCode::ReadHoldingRegisters, |w| {
                w.write_u8(0x03)?;
                w.write_u16(0x0000)?;
                w.write_u16(0x0003)?;
                Ok(())
            })
            .unwrap()
            .to_vec();

        assert_eq!(payload, pdu, "chunk size {chunk_size}");
    }
}

// =============================================================================
// Envelope Length Invariant
// =============================================================================

#[test]
fn test_length_field_tracks_payload_writer() {
    // For a payload writer producing k bytes, the length field is k + 1
    // (the unit identifier byte follows the length field too). Broadcast
    // writes skip the response phase, so the written frame can be
    // inspected in isolation.
    for k in [1usize, 2, 5, 16, 100, 252] {
        let mut transport = MockTransport::new();
        let mut engine = TransceiveEngine::new(true);

        engine
            .transceive(&mut transport, 0, FunctionCode::WriteMultipleRegisters, |w| {
                w.write_u8(0x10)?;
                for _ in 0..k - 1 {
                    w.write_u8(0xAA)?;
                }
                Ok(())
            })
            .unwrap();

        let written = transport.take_written();
        assert_eq!(written.len(), 7 + k);

        let length_field = u16::from_be_bytes([written[4], written[5]]) as usize;
        assert_eq!(length_field, k + 1, "payload writer bytes: {k}");
        assert_eq!(length_field, written.len() - 6);
    }
}

// =============================================================================
// Exception Detection
// =============================================================================

#[test]
fn test_exception_bit_for_every_exception_code() {
    for exception_code in 1..=255u8 {
        let frame = fixtures::exception_response(0, 1, 0x03, exception_code);
        let mut transport = MockTransport::new().respond_with(frame);
        let mut engine = TransceiveEngine::new(false);

        let error = engine
            .transceive(&mut transport, 1, FunctionCode::ReadHoldingRegisters, |w| {
                w.write_u8(0x03)?;
                Ok(())
            })
            .unwrap_err();

        match error {
            ModbusError::Protocol(ProtocolError::ExceptionResponse {
                function_code,
                exception_code: reported,
                ..
            }) => {
                assert_eq!(function_code, 0x03);
                assert_eq!(reported, exception_code);
            }
            other => panic!("expected exception response for code {exception_code}, got {other}"),
        }
    }
}

#[test]
fn test_mismatched_function_code_is_not_an_exception() {
    // 0x86 is the exception variant of FC 06, not of the requested FC 03.
    let frame = fixtures::response_frame(0, 1, &[0x86, 0x02]);
    let mut transport = MockTransport::new().respond_with(frame);
    let mut engine = TransceiveEngine::new(false);

    let error = engine
        .transceive(&mut transport, 1, FunctionCode::ReadHoldingRegisters, |w| {
            w.write_u8(0x03)?;
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(
        error,
        ModbusError::Protocol(ProtocolError::FunctionCodeMismatch {
            expected: 0x03,
            actual: 0x86,
        })
    ));
}

// =============================================================================
// Sequencer
// =============================================================================

#[test]
fn test_sequencer_full_wraparound() {
    let sequencer = TransactionSequencer::new();

    for expected in 0..=65535u16 {
        assert_eq!(sequencer.next(), expected);
    }
    // Wrapped: the cycle repeats from zero.
    assert_eq!(sequencer.next(), 0);
    assert_eq!(sequencer.next(), 1);
}

#[test]
fn test_transaction_id_on_the_wire() {
    let mut engine = TransceiveEngine::new(true);

    for expected in 0u16..5 {
        let mut transport = MockTransport::new();
        engine
            .transceive(&mut transport, 0, FunctionCode::WriteSingleRegister, |w| {
                w.write_u8(0x06)?;
                w.write_u16(0x0000)?;
                w.write_u16(0x0001)?;
                Ok(())
            })
            .unwrap();

        let written = transport.take_written();
        assert_eq!(u16::from_be_bytes([written[0], written[1]]), expected);
    }
}

// =============================================================================
// Transport Failures
// =============================================================================

#[test]
fn test_transport_closed_mid_frame() {
    // Nine of the declared thirteen bytes arrive, then the peer closes.
    let frame = fixtures::response_frame(0, 1, &[0x03, 0x04, 0x00, 0x01, 0x00, 0x02]);
    let partial = fixtures::truncated(frame, 9);

    let mut transport = MockTransport::new().respond_with(partial).then_close();
    let mut engine = TransceiveEngine::new(false);

    let error = engine
        .transceive(&mut transport, 1, FunctionCode::ReadHoldingRegisters, |w| {
            w.write_u8(0x03)?;
            w.write_u16(0x0000)?;
            w.write_u16(0x0002)?;
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(
        error,
        ModbusError::Connection(ConnectionError::Closed { .. })
    ));
}

#[test]
fn test_transport_closed_before_any_byte() {
    let mut transport = MockTransport::new().then_close();
    let mut engine = TransceiveEngine::new(false);

    let error = engine
        .transceive(&mut transport, 1, FunctionCode::ReadHoldingRegisters, |w| {
            w.write_u8(0x03)?;
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(
        error,
        ModbusError::Connection(ConnectionError::Closed { .. })
    ));
}

#[test]
fn test_read_timeout_is_distinct_from_closed() {
    use std::time::Duration;

    let mut transport = MockTransport::new()
        .with_read_timeout(Duration::from_millis(250))
        .then_timeout();
    let mut engine = TransceiveEngine::new(false);

    let error = engine
        .transceive(&mut transport, 1, FunctionCode::ReadHoldingRegisters, |w| {
            w.write_u8(0x03)?;
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(error, ModbusError::Timeout(_)));
}

// =============================================================================
// Framing Failures
// =============================================================================

#[test]
fn test_nonzero_protocol_identifier_rejected() {
    for protocol_id in [0x0001u16, 0x00FF, 0x1234, 0xFFFF] {
        let frame = fixtures::bad_protocol_id_frame(protocol_id, 1, &[0x03, 0x02, 0x00, 0x2A]);
        let mut transport = MockTransport::new().respond_with(frame);
        let mut engine = TransceiveEngine::new(false);

        let error = engine
            .transceive(&mut transport, 1, FunctionCode::ReadHoldingRegisters, |w| {
                w.write_u8(0x03)?;
                Ok(())
            })
            .unwrap_err();

        match error {
            ModbusError::Protocol(ProtocolError::InvalidProtocolId { protocol_id: found }) => {
                assert_eq!(found, protocol_id);
            }
            other => panic!("expected framing failure for protocol id {protocol_id}, got {other}"),
        }
    }
}

#[test]
fn test_invalid_unit_id_in_gateway_mode() {
    for unit_id in [248u8, 250, 255] {
        let mut transport = MockTransport::new();
        let mut engine = TransceiveEngine::new(true);

        let error = engine
            .transceive(&mut transport, unit_id, FunctionCode::ReadCoils, |w| {
                w.write_u8(0x01)?;
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(
            error,
            ModbusError::Protocol(ProtocolError::InvalidUnitId { .. })
        ));
        assert!(transport.written().is_empty());
    }
}
