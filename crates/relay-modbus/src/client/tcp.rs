// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus TCP client.
//!
//! [`ModbusTcpClient`] binds the transceive engine to a TCP transport
//! and exposes the standard function codes as typed operations. Each
//! operation is a thin wrapper: validate the request quantities, build
//! the PDU through a payload closure, run one exchange, decode the
//! returned payload per the configured byte order.
//!
//! The unit identifier is a per-call parameter because one TCP endpoint
//! may be a gateway fronting many serial end units.
//!
//! # Example
//!
//! ```rust,ignore
//! use relay_modbus::client::ModbusTcpClient;
//! use relay_modbus::types::ModbusTcpConfig;
//!
//! let config = ModbusTcpConfig::builder()
//!     .host("192.168.1.100")
//!     .port(502)
//!     .build()?;
//!
//! let mut client = ModbusTcpClient::new(config);
//! client.connect()?;
//!
//! let registers = client.read_holding_registers(1, 0, 10)?;
//! client.write_single_register(1, 100, 0x1234)?;
//! client.disconnect();
//! ```

use crate::error::{ConversionError, ModbusError, ModbusResult, OperationError, ProtocolError};
use crate::frame::FrameWriter;
use crate::types::{FunctionCode, ModbusTcpConfig, RegisterType};

use super::conversion::{pack_coils, unpack_coils, DataConverter};
use super::engine::TransceiveEngine;
use super::transport::{TcpTransport, TransportState};

/// FC 23 writes share the frame with the read parameters, so the write
/// quantity limit is lower than plain FC 16.
const MAX_READ_WRITE_WRITE_COUNT: u16 = 121;

// =============================================================================
// ModbusTcpClient
// =============================================================================

/// Synchronous Modbus TCP client.
///
/// The client owns its frame buffer and transaction sequencer through
/// the engine and supports exactly one exchange at a time; `&mut self`
/// on every operation makes that a compile-time guarantee rather than a
/// runtime check.
#[derive(Debug)]
pub struct ModbusTcpClient {
    config: ModbusTcpConfig,
    transport: Option<TcpTransport>,
    engine: TransceiveEngine,
    converter: DataConverter,
    state: TransportState,
}

impl ModbusTcpClient {
    /// Creates a disconnected client with the given configuration.
    pub fn new(config: ModbusTcpConfig) -> Self {
        let engine = TransceiveEngine::new(config.gateway_mode);
        let converter = DataConverter::new(config.byte_order);
        Self {
            config,
            transport: None,
            engine,
            converter,
            state: TransportState::Disconnected,
        }
    }

    /// Creates a simple client with host and port.
    pub fn simple(host: impl Into<String>, port: u16) -> Self {
        Self::new(ModbusTcpConfig::with_port(host, port))
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &ModbusTcpConfig {
        &self.config
    }

    /// Returns the current transport state.
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Returns `true` if connected.
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Enables or disables gateway mode.
    pub fn set_gateway_mode(&mut self, enabled: bool) {
        self.config.gateway_mode = enabled;
        self.engine.set_gateway_mode(enabled);
    }

    /// Sets the payload byte order.
    pub fn set_byte_order(&mut self, byte_order: crate::types::ByteOrder) {
        self.config.byte_order = byte_order;
        self.converter = DataConverter::new(byte_order);
    }

    // =========================================================================
    // Connection Management
    // =========================================================================

    /// Establishes the TCP connection.
    ///
    /// A no-op when already connected.
    pub fn connect(&mut self) -> ModbusResult<()> {
        if self.state.is_connected() {
            return Ok(());
        }

        self.state = TransportState::Connecting;

        match TcpTransport::connect(&self.config) {
            Ok(transport) => {
                tracing::info!(
                    host = %self.config.host,
                    port = self.config.port,
                    peer = %transport.peer_addr(),
                    "connected to Modbus TCP device"
                );
                self.transport = Some(transport);
                self.state = TransportState::Connected;
                Ok(())
            }
            Err(error) => {
                self.state = TransportState::Disconnected;
                Err(error)
            }
        }
    }

    /// Disconnects from the device.
    ///
    /// Safe to call at any time; a closed or absent stream is not an
    /// error.
    pub fn disconnect(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.shutdown();
            tracing::debug!(
                host = %self.config.host,
                port = self.config.port,
                "disconnected from Modbus TCP device"
            );
        }
        self.state = TransportState::Disconnected;
    }

    // =========================================================================
    // Read Operations (FC 01-04)
    // =========================================================================

    /// Reads coils (FC 01).
    pub fn read_coils(&mut self, unit_id: u8, address: u16, count: u16) -> ModbusResult<Vec<bool>> {
        validate_quantity(count, RegisterType::Coil.max_read_count())?;

        let function = FunctionCode::ReadCoils;
        let payload = self.exchange(unit_id, function, |w| {
            w.write_u8(function.as_u8())?;
            w.write_u16(address)?;
            w.write_u16(count)?;
            Ok(())
        })?;

        let data = sized_payload(&payload)?;
        Ok(unpack_coils(data, count)?)
    }

    /// Reads discrete inputs (FC 02).
    pub fn read_discrete_inputs(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> ModbusResult<Vec<bool>> {
        validate_quantity(count, RegisterType::DiscreteInput.max_read_count())?;

        let function = FunctionCode::ReadDiscreteInputs;
        let payload = self.exchange(unit_id, function, |w| {
            w.write_u8(function.as_u8())?;
            w.write_u16(address)?;
            w.write_u16(count)?;
            Ok(())
        })?;

        let data = sized_payload(&payload)?;
        Ok(unpack_coils(data, count)?)
    }

    /// Reads holding registers (FC 03).
    pub fn read_holding_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> ModbusResult<Vec<u16>> {
        validate_quantity(count, RegisterType::HoldingRegister.max_read_count())?;

        let function = FunctionCode::ReadHoldingRegisters;
        let payload = self.exchange(unit_id, function, |w| {
            w.write_u8(function.as_u8())?;
            w.write_u16(address)?;
            w.write_u16(count)?;
            Ok(())
        })?;

        self.decode_registers(&payload, count)
    }

    /// Reads input registers (FC 04).
    pub fn read_input_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> ModbusResult<Vec<u16>> {
        validate_quantity(count, RegisterType::InputRegister.max_read_count())?;

        let function = FunctionCode::ReadInputRegisters;
        let payload = self.exchange(unit_id, function, |w| {
            w.write_u8(function.as_u8())?;
            w.write_u16(address)?;
            w.write_u16(count)?;
            Ok(())
        })?;

        self.decode_registers(&payload, count)
    }

    // =========================================================================
    // Write Operations (FC 05, 06, 15, 16)
    // =========================================================================

    /// Writes a single coil (FC 05).
    pub fn write_single_coil(&mut self, unit_id: u8, address: u16, value: bool) -> ModbusResult<()> {
        let coil_value: u16 = if value { 0xFF00 } else { 0x0000 };

        let function = FunctionCode::WriteSingleCoil;
        let payload = self.exchange(unit_id, function, |w| {
            w.write_u8(function.as_u8())?;
            w.write_u16(address)?;
            w.write_u16(coil_value)?;
            Ok(())
        })?;

        expect_echo(&payload, 5)
    }

    /// Writes a single holding register (FC 06).
    pub fn write_single_register(
        &mut self,
        unit_id: u8,
        address: u16,
        value: u16,
    ) -> ModbusResult<()> {
        let value_bytes = self.converter.register_to_bytes(value);

        let function = FunctionCode::WriteSingleRegister;
        let payload = self.exchange(unit_id, function, |w| {
            w.write_u8(function.as_u8())?;
            w.write_u16(address)?;
            w.write_bytes(&value_bytes)?;
            Ok(())
        })?;

        expect_echo(&payload, 5)
    }

    /// Writes multiple coils (FC 15).
    pub fn write_multiple_coils(
        &mut self,
        unit_id: u8,
        address: u16,
        values: &[bool],
    ) -> ModbusResult<()> {
        let max = RegisterType::Coil.max_write_count().unwrap_or(1968);
        let count = saturating_count(values.len());
        validate_quantity(count, max)?;

        let packed = pack_coils(values);

        let function = FunctionCode::WriteMultipleCoils;
        let payload = self.exchange(unit_id, function, |w| {
            w.write_u8(function.as_u8())?;
            w.write_u16(address)?;
            w.write_u16(count)?;
            w.write_u8(packed.len() as u8)?;
            w.write_bytes(&packed)?;
            Ok(())
        })?;

        expect_echo(&payload, 5)
    }

    /// Writes multiple holding registers (FC 16).
    pub fn write_multiple_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        values: &[u16],
    ) -> ModbusResult<()> {
        let max = RegisterType::HoldingRegister.max_write_count().unwrap_or(123);
        let count = saturating_count(values.len());
        validate_quantity(count, max)?;

        let data = self.converter.registers_to_bytes(values);

        let function = FunctionCode::WriteMultipleRegisters;
        let payload = self.exchange(unit_id, function, |w| {
            w.write_u8(function.as_u8())?;
            w.write_u16(address)?;
            w.write_u16(count)?;
            w.write_u8(data.len() as u8)?;
            w.write_bytes(&data)?;
            Ok(())
        })?;

        expect_echo(&payload, 5)
    }

    // =========================================================================
    // Combined Operations (FC 22, 23)
    // =========================================================================

    /// Masks a holding register in place (FC 22).
    ///
    /// The device computes `(current AND and_mask) OR (or_mask AND NOT
    /// and_mask)`.
    pub fn mask_write_register(
        &mut self,
        unit_id: u8,
        address: u16,
        and_mask: u16,
        or_mask: u16,
    ) -> ModbusResult<()> {
        let function = FunctionCode::MaskWriteRegister;
        let payload = self.exchange(unit_id, function, |w| {
            w.write_u8(function.as_u8())?;
            w.write_u16(address)?;
            w.write_u16(and_mask)?;
            w.write_u16(or_mask)?;
            Ok(())
        })?;

        expect_echo(&payload, 7)
    }

    /// Reads and writes registers in one exchange (FC 23).
    ///
    /// The write is performed before the read on the device side.
    pub fn read_write_multiple_registers(
        &mut self,
        unit_id: u8,
        read_address: u16,
        read_count: u16,
        write_address: u16,
        write_values: &[u16],
    ) -> ModbusResult<Vec<u16>> {
        validate_quantity(read_count, RegisterType::HoldingRegister.max_read_count())?;
        let write_count = saturating_count(write_values.len());
        validate_quantity(write_count, MAX_READ_WRITE_WRITE_COUNT)?;

        let data = self.converter.registers_to_bytes(write_values);

        let function = FunctionCode::ReadWriteMultipleRegisters;
        let payload = self.exchange(unit_id, function, |w| {
            w.write_u8(function.as_u8())?;
            w.write_u16(read_address)?;
            w.write_u16(read_count)?;
            w.write_u16(write_address)?;
            w.write_u16(write_count)?;
            w.write_u8(data.len() as u8)?;
            w.write_bytes(&data)?;
            Ok(())
        })?;

        self.decode_registers(&payload, read_count)
    }

    // =========================================================================
    // Private Methods
    // =========================================================================

    /// Runs one exchange and copies the response payload out of the
    /// frame buffer.
    ///
    /// Transport failures and stream desynchronization poison the
    /// connection: the state moves to [`TransportState::Error`] and the
    /// surrounding application is expected to reconnect.
    fn exchange<F>(
        &mut self,
        unit_id: u8,
        function: FunctionCode,
        build_payload: F,
    ) -> ModbusResult<Vec<u8>>
    where
        F: FnOnce(&mut FrameWriter<'_>) -> ModbusResult<()>,
    {
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(ModbusError::not_connected)?;

        match self.engine.transceive(transport, unit_id, function, build_payload) {
            Ok(payload) => Ok(payload.to_vec()),
            Err(error) => {
                if connection_poisoned(&error) {
                    self.state = TransportState::Error;
                    error.log("modbus exchange");
                }
                Err(error)
            }
        }
    }

    /// Decodes a register-read payload into values, honoring the
    /// configured byte order.
    fn decode_registers(&self, payload: &[u8], count: u16) -> ModbusResult<Vec<u16>> {
        let data = sized_payload(payload)?;
        let expected = count as usize * 2;
        if data.len() != expected {
            return Err(ConversionError::insufficient_data(expected, data.len()).into());
        }
        Ok(self.converter.registers_from_bytes(data)?)
    }
}

impl Drop for ModbusTcpClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

// =============================================================================
// Payload helpers
// =============================================================================

/// Returns `true` for failures after which the stream cannot be trusted:
/// transport errors, timeouts, and a desynchronized response.
fn connection_poisoned(error: &ModbusError) -> bool {
    matches!(
        error,
        ModbusError::Connection(_)
            | ModbusError::Timeout(_)
            | ModbusError::Protocol(ProtocolError::FunctionCodeMismatch { .. })
    )
}

/// Validates a request quantity against a per-function limit.
fn validate_quantity(count: u16, max: u16) -> ModbusResult<()> {
    if count == 0 || count > max {
        return Err(OperationError::invalid_quantity(count, 1, max).into());
    }
    Ok(())
}

/// Clamps a slice length into the u16 quantity domain so the limit
/// check reports it as out of range instead of wrapping.
fn saturating_count(len: usize) -> u16 {
    u16::try_from(len).unwrap_or(u16::MAX)
}

/// Extracts the data region of a byte-counted response payload
/// (`[function code, byte count, data...]`).
fn sized_payload(payload: &[u8]) -> ModbusResult<&[u8]> {
    if payload.len() < 2 {
        return Err(ConversionError::insufficient_data(2, payload.len()).into());
    }

    let byte_count = payload[1] as usize;
    let data = &payload[2..];
    if data.len() < byte_count {
        return Err(ConversionError::insufficient_data(byte_count, data.len()).into());
    }

    Ok(&data[..byte_count])
}

/// Checks an echo-style response for the expected length.
///
/// Broadcast writes return an empty payload; that is success, not a
/// short echo.
fn expect_echo(payload: &[u8], expected: usize) -> ModbusResult<()> {
    if payload.is_empty() {
        return Ok(());
    }
    if payload.len() < expected {
        return Err(ConversionError::insufficient_data(expected, payload.len()).into());
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConnectionError, ModbusError};
    use crate::types::ByteOrder;

    #[test]
    fn test_simple_constructor() {
        let client = ModbusTcpClient::simple("127.0.0.1", 502);
        assert_eq!(client.config().host, "127.0.0.1");
        assert_eq!(client.config().port, 502);
        assert_eq!(client.state(), TransportState::Disconnected);
        assert!(!client.is_connected());
    }

    #[test]
    fn test_operations_require_connection() {
        let mut client = ModbusTcpClient::simple("127.0.0.1", 502);
        let error = client.read_holding_registers(1, 0, 1).unwrap_err();
        assert!(matches!(
            error,
            ModbusError::Connection(ConnectionError::NotConnected)
        ));
    }

    #[test]
    fn test_quantity_validation_before_io() {
        // Out-of-range quantities fail even without a connection,
        // proving validation happens before any transport access.
        let mut client = ModbusTcpClient::simple("127.0.0.1", 502);

        assert!(matches!(
            client.read_holding_registers(1, 0, 126).unwrap_err(),
            ModbusError::Operation(OperationError::InvalidQuantity { count: 126, .. })
        ));
        assert!(matches!(
            client.read_coils(1, 0, 2001).unwrap_err(),
            ModbusError::Operation(OperationError::InvalidQuantity { count: 2001, .. })
        ));
        assert!(matches!(
            client.read_holding_registers(1, 0, 0).unwrap_err(),
            ModbusError::Operation(OperationError::InvalidQuantity { count: 0, .. })
        ));
        assert!(matches!(
            client.write_multiple_registers(1, 0, &[0u16; 124]).unwrap_err(),
            ModbusError::Operation(OperationError::InvalidQuantity { count: 124, .. })
        ));
    }

    #[test]
    fn test_set_gateway_mode() {
        let mut client = ModbusTcpClient::simple("127.0.0.1", 502);
        assert!(!client.config().gateway_mode);

        client.set_gateway_mode(true);
        assert!(client.config().gateway_mode);
    }

    #[test]
    fn test_set_byte_order() {
        let mut client = ModbusTcpClient::simple("127.0.0.1", 502);
        client.set_byte_order(ByteOrder::LittleEndian);
        assert_eq!(client.config().byte_order, ByteOrder::LittleEndian);
    }

    #[test]
    fn test_sized_payload() {
        let payload = [0x03, 0x04, 0xAA, 0xBB, 0xCC, 0xDD];
        assert_eq!(sized_payload(&payload).unwrap(), &[0xAA, 0xBB, 0xCC, 0xDD]);

        // Declared byte count exceeds the received data.
        let short = [0x03, 0x04, 0xAA];
        assert!(sized_payload(&short).is_err());

        assert!(sized_payload(&[0x03]).is_err());
    }

    #[test]
    fn test_expect_echo() {
        assert!(expect_echo(&[0x05, 0x00, 0x01, 0xFF, 0x00], 5).is_ok());
        assert!(expect_echo(&[], 5).is_ok()); // broadcast
        assert!(expect_echo(&[0x05, 0x00], 5).is_err());
    }

    #[test]
    fn test_saturating_count() {
        assert_eq!(saturating_count(3), 3);
        assert_eq!(saturating_count(70_000), u16::MAX);
    }
}
