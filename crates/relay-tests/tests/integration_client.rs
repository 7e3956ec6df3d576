// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # TCP Client Integration Tests
//!
//! Drives [`ModbusTcpClient`] against a loopback mock server:
//!
//! - connect / disconnect lifecycle and state reporting
//! - typed reads and writes end to end, including byte-order handling
//! - exception responses surfaced without poisoning the connection
//! - read timeouts and mid-frame closes poisoning the connection

use std::io::Read;
use std::time::Duration;

use relay_modbus::client::{ModbusTcpClient, TransportState};
use relay_modbus::error::{ConnectionError, ModbusError, ProtocolError};
use relay_modbus::types::{ByteOrder, ModbusTcpConfig};

use relay_tests::common::fixtures;
use relay_tests::common::mocks::{read_request, write_response, MockServer};

fn client_for(server: &MockServer) -> ModbusTcpClient {
    let config = ModbusTcpConfig::builder()
        .host("127.0.0.1")
        .port(server.port())
        .connect_timeout(Duration::from_secs(2))
        .read_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    ModbusTcpClient::new(config)
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_connect_and_disconnect() {
    let server = MockServer::start(|mut stream| {
        // Hold the connection until the client hangs up.
        let mut buf = [0u8; 1];
        let _ = stream.read(&mut buf);
    });

    let mut client = client_for(&server);
    assert_eq!(client.state(), TransportState::Disconnected);

    client.connect().unwrap();
    assert!(client.is_connected());

    // Connecting twice is a no-op.
    client.connect().unwrap();

    client.disconnect();
    assert_eq!(client.state(), TransportState::Disconnected);

    server.join();
}

#[test]
fn test_connect_refused() {
    // Bind then immediately free a port so nothing is listening on it.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let mut client = ModbusTcpClient::simple("127.0.0.1", port);
    let error = client.connect().unwrap_err();

    assert!(matches!(error, ModbusError::Connection(_)));
    assert_eq!(client.state(), TransportState::Disconnected);
}

// =============================================================================
// Reads
// =============================================================================

#[test]
fn test_read_holding_registers_end_to_end() {
    let server = MockServer::start(|mut stream| {
        let request = read_request(&mut stream).unwrap();

        // MBAP: transaction 0, protocol 0, length 6, unit 1;
        // PDU: FC 03, address 0x0010, count 3.
        assert_eq!(&request[2..4], &[0x00, 0x00]);
        assert_eq!(&request[4..6], &[0x00, 0x06]);
        assert_eq!(request[6], 1);
        assert_eq!(&request[7..], &[0x03, 0x00, 0x10, 0x00, 0x03]);

        let response = fixtures::register_read_response(0, 1, 0x03, &[0x1111, 0x2222, 0x3333]);
        write_response(&mut stream, &response).unwrap();
    });

    let mut client = client_for(&server);
    client.connect().unwrap();

    let values = client.read_holding_registers(1, 0x0010, 3).unwrap();
    assert_eq!(values, vec![0x1111, 0x2222, 0x3333]);
    assert!(client.is_connected());

    client.disconnect();
    server.join();
}

#[test]
fn test_read_respects_little_endian_byte_order() {
    let server = MockServer::start(|mut stream| {
        let _ = read_request(&mut stream).unwrap();
        // Wire bytes 0x12 0x34 per register.
        let response = fixtures::register_read_response(0, 1, 0x04, &[0x1234]);
        write_response(&mut stream, &response).unwrap();
    });

    let config = ModbusTcpConfig::builder()
        .host("127.0.0.1")
        .port(server.port())
        .read_timeout(Duration::from_secs(2))
        .byte_order(ByteOrder::LittleEndian)
        .build()
        .unwrap();
    let mut client = ModbusTcpClient::new(config);
    client.connect().unwrap();

    // The same wire bytes decode swapped under DCBA.
    let values = client.read_input_registers(1, 0, 1).unwrap();
    assert_eq!(values, vec![0x3412]);

    client.disconnect();
    server.join();
}

#[test]
fn test_read_coils_end_to_end() {
    let server = MockServer::start(|mut stream| {
        let request = read_request(&mut stream).unwrap();
        assert_eq!(&request[7..], &[0x01, 0x00, 0x00, 0x00, 0x0A]);

        // 10 coils: 0b0100_1101, 0b0000_0011.
        let response = fixtures::bit_read_response(0, 1, 0x01, &[0b0100_1101, 0b0000_0011]);
        write_response(&mut stream, &response).unwrap();
    });

    let mut client = client_for(&server);
    client.connect().unwrap();

    let coils = client.read_coils(1, 0, 10).unwrap();
    assert_eq!(
        coils,
        vec![true, false, true, true, false, false, true, false, true, true]
    );

    client.disconnect();
    server.join();
}

// =============================================================================
// Writes
// =============================================================================

#[test]
fn test_write_single_register_echo() {
    let server = MockServer::start(|mut stream| {
        let request = read_request(&mut stream).unwrap();
        assert_eq!(&request[7..], &[0x06, 0x00, 0x64, 0x12, 0x34]);

        let response = fixtures::echo_response(0, 1, 0x06, 0x0064, 0x1234);
        write_response(&mut stream, &response).unwrap();
    });

    let mut client = client_for(&server);
    client.connect().unwrap();

    client.write_single_register(1, 100, 0x1234).unwrap();
    assert!(client.is_connected());

    client.disconnect();
    server.join();
}

#[test]
fn test_write_multiple_coils_packs_bits() {
    let server = MockServer::start(|mut stream| {
        let request = read_request(&mut stream).unwrap();
        // FC 0F, address 0, count 10, 2 data bytes, LSB-first packing.
        assert_eq!(
            &request[7..],
            &[0x0F, 0x00, 0x00, 0x00, 0x0A, 0x02, 0b0100_1101, 0b0000_0011]
        );

        let response = fixtures::echo_response(0, 1, 0x0F, 0x0000, 0x000A);
        write_response(&mut stream, &response).unwrap();
    });

    let mut client = client_for(&server);
    client.connect().unwrap();

    let values = [true, false, true, true, false, false, true, false, true, true];
    client.write_multiple_coils(1, 0, &values).unwrap();

    client.disconnect();
    server.join();
}

#[test]
fn test_mask_write_register() {
    let server = MockServer::start(|mut stream| {
        let request = read_request(&mut stream).unwrap();
        assert_eq!(&request[7..], &[0x16, 0x00, 0x01, 0xF0, 0xF0, 0x0F, 0x0F]);

        // The echo repeats the full request PDU.
        let response = fixtures::response_frame(0, 1, &[0x16, 0x00, 0x01, 0xF0, 0xF0, 0x0F, 0x0F]);
        write_response(&mut stream, &response).unwrap();
    });

    let mut client = client_for(&server);
    client.connect().unwrap();

    client.mask_write_register(1, 1, 0xF0F0, 0x0F0F).unwrap();

    client.disconnect();
    server.join();
}

#[test]
fn test_read_write_multiple_registers() {
    let server = MockServer::start(|mut stream| {
        let request = read_request(&mut stream).unwrap();
        // FC 17, read 0x0000 x2, write 0x0010 x1, 2 bytes of data.
        assert_eq!(
            &request[7..],
            &[0x17, 0x00, 0x00, 0x00, 0x02, 0x00, 0x10, 0x00, 0x01, 0x02, 0xBE, 0xEF]
        );

        let response = fixtures::register_read_response(0, 1, 0x17, &[0x0001, 0x0002]);
        write_response(&mut stream, &response).unwrap();
    });

    let mut client = client_for(&server);
    client.connect().unwrap();

    let values = client
        .read_write_multiple_registers(1, 0, 2, 0x0010, &[0xBEEF])
        .unwrap();
    assert_eq!(values, vec![0x0001, 0x0002]);

    client.disconnect();
    server.join();
}

#[test]
fn test_broadcast_write_returns_without_response() {
    let server = MockServer::start(|mut stream| {
        // Receive the broadcast; never respond.
        let request = read_request(&mut stream).unwrap();
        assert_eq!(request[6], 0);
    });

    let config = ModbusTcpConfig::builder()
        .host("127.0.0.1")
        .port(server.port())
        .gateway_mode(true)
        .read_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let mut client = ModbusTcpClient::new(config);
    client.connect().unwrap();

    // Completes although the server never writes a byte back.
    client.write_single_coil(0, 3, true).unwrap();

    client.disconnect();
    server.join();
}

#[test]
fn test_broadcast_read_rejected_locally() {
    let server = MockServer::start(|mut stream| {
        let mut buf = [0u8; 1];
        let _ = stream.read(&mut buf);
    });

    let config = ModbusTcpConfig::builder()
        .host("127.0.0.1")
        .port(server.port())
        .gateway_mode(true)
        .build()
        .unwrap();
    let mut client = ModbusTcpClient::new(config);
    client.connect().unwrap();

    let error = client.read_coils(0, 0, 1).unwrap_err();
    assert!(matches!(
        error,
        ModbusError::Protocol(ProtocolError::InvalidBroadcastFunction { .. })
    ));

    client.disconnect();
    server.join();
}

// =============================================================================
// Failure Paths
// =============================================================================

#[test]
fn test_exception_response_keeps_connection_usable() {
    let server = MockServer::start(|mut stream| {
        let _ = read_request(&mut stream).unwrap();
        let response = fixtures::exception_response(0, 1, 0x03, 0x02);
        write_response(&mut stream, &response).unwrap();

        // Serve a second, successful exchange on the same connection.
        let _ = read_request(&mut stream).unwrap();
        let response = fixtures::register_read_response(1, 1, 0x03, &[0x2A]);
        write_response(&mut stream, &response).unwrap();
    });

    let mut client = client_for(&server);
    client.connect().unwrap();

    let error = client.read_holding_registers(1, 9999, 1).unwrap_err();
    match error {
        ModbusError::Protocol(ProtocolError::ExceptionResponse { exception_code, .. }) => {
            assert_eq!(exception_code, 0x02);
        }
        other => panic!("expected exception response, got {other}"),
    }

    // The exchange failed but the stream stayed in sync.
    assert!(client.is_connected());
    let values = client.read_holding_registers(1, 0, 1).unwrap();
    assert_eq!(values, vec![0x2A]);

    client.disconnect();
    server.join();
}

#[test]
fn test_read_timeout_poisons_connection() {
    let server = MockServer::start(|mut stream| {
        let _ = read_request(&mut stream).unwrap();
        // Never respond; wait for the client to hang up.
        let mut buf = [0u8; 1];
        let _ = stream.read(&mut buf);
    });

    let config = ModbusTcpConfig::builder()
        .host("127.0.0.1")
        .port(server.port())
        .read_timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let mut client = ModbusTcpClient::new(config);
    client.connect().unwrap();

    let error = client.read_holding_registers(1, 0, 1).unwrap_err();
    assert!(matches!(error, ModbusError::Timeout(_)));
    assert_eq!(client.state(), TransportState::Error);

    client.disconnect();
    server.join();
}

#[test]
fn test_server_close_mid_frame_poisons_connection() {
    let server = MockServer::start(|mut stream| {
        let _ = read_request(&mut stream).unwrap();
        // Send 9 of the declared 13 bytes, then drop the stream.
        let full = fixtures::register_read_response(0, 1, 0x03, &[0x0001, 0x0002]);
        let partial = fixtures::truncated(full, 9);
        write_response(&mut stream, &partial).unwrap();
    });

    let mut client = client_for(&server);
    client.connect().unwrap();

    let error = client.read_holding_registers(1, 0, 2).unwrap_err();
    assert!(matches!(
        error,
        ModbusError::Connection(ConnectionError::Closed { .. })
    ));
    assert_eq!(client.state(), TransportState::Error);

    client.disconnect();
    server.join();
}

#[test]
fn test_byte_count_shortfall_is_a_conversion_error() {
    let server = MockServer::start(|mut stream| {
        let _ = read_request(&mut stream).unwrap();
        // Declares 4 data bytes but the frame only carries 2.
        let response = fixtures::response_frame(0, 1, &[0x03, 0x04, 0x00, 0x2A]);
        write_response(&mut stream, &response).unwrap();
    });

    let mut client = client_for(&server);
    client.connect().unwrap();

    let error = client.read_holding_registers(1, 0, 2).unwrap_err();
    assert!(matches!(error, ModbusError::Conversion(_)));

    client.disconnect();
    server.join();
}
