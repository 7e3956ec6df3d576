// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Canned Modbus TCP frames for tests.
//!
//! Every builder produces a complete wire frame (MBAP envelope + PDU);
//! malformed variants exist for the failure-path suites.

/// Builds a complete response frame around a PDU.
///
/// The PDU starts with the function code byte; the length field is
/// derived as `unit id + PDU`, which keeps the envelope invariant
/// (`length == total - 6`) intact by construction.
pub fn response_frame(transaction_id: u16, unit_id: u8, pdu: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(7 + pdu.len());
    frame.extend_from_slice(&transaction_id.to_be_bytes());
    frame.extend_from_slice(&0u16.to_be_bytes());
    frame.extend_from_slice(&((pdu.len() as u16 + 1).to_be_bytes()));
    frame.push(unit_id);
    frame.extend_from_slice(pdu);
    frame
}

/// Builds a register-read response (FC 03/04 shape) with big-endian
/// register data.
pub fn register_read_response(
    transaction_id: u16,
    unit_id: u8,
    function_code: u8,
    values: &[u16],
) -> Vec<u8> {
    let mut pdu = vec![function_code, (values.len() * 2) as u8];
    for value in values {
        pdu.extend_from_slice(&value.to_be_bytes());
    }
    response_frame(transaction_id, unit_id, &pdu)
}

/// Builds a coil-read response (FC 01/02 shape) from packed bytes.
pub fn bit_read_response(
    transaction_id: u16,
    unit_id: u8,
    function_code: u8,
    packed: &[u8],
) -> Vec<u8> {
    let mut pdu = vec![function_code, packed.len() as u8];
    pdu.extend_from_slice(packed);
    response_frame(transaction_id, unit_id, &pdu)
}

/// Builds a write-echo response (FC 05/06/15/16 shape).
pub fn echo_response(
    transaction_id: u16,
    unit_id: u8,
    function_code: u8,
    address: u16,
    value: u16,
) -> Vec<u8> {
    let mut pdu = vec![function_code];
    pdu.extend_from_slice(&address.to_be_bytes());
    pdu.extend_from_slice(&value.to_be_bytes());
    response_frame(transaction_id, unit_id, &pdu)
}

/// Builds an exception response: function code + 0x80, then the
/// exception code byte.
pub fn exception_response(
    transaction_id: u16,
    unit_id: u8,
    function_code: u8,
    exception_code: u8,
) -> Vec<u8> {
    response_frame(
        transaction_id,
        unit_id,
        &[function_code + 0x80, exception_code],
    )
}

/// Builds an otherwise well-formed frame carrying a non-zero protocol
/// identifier.
pub fn bad_protocol_id_frame(protocol_id: u16, unit_id: u8, pdu: &[u8]) -> Vec<u8> {
    let mut frame = response_frame(0, unit_id, pdu);
    frame[2..4].copy_from_slice(&protocol_id.to_be_bytes());
    frame
}

/// Truncates a frame mid-body, for connection-closed scenarios.
pub fn truncated(mut frame: Vec<u8>, keep: usize) -> Vec<u8> {
    frame.truncate(keep);
    frame
}
