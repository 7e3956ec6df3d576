// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus protocol types and client configuration.
//!
//! This module provides the protocol-level type definitions used by the
//! transceive engine and the client surface:
//!
//! - **FunctionCode**: the standard public function codes, with the
//!   broadcast write-class subset
//! - **ExceptionCode**: remote-reported exception codes with names
//! - **RegisterType**: the four Modbus register types with per-type limits
//! - **ByteOrder**: payload word/byte orders for multi-register values
//! - **ModbusTcpConfig**: TCP connection configuration with builder
//!
//! # Examples
//!
//! ```
//! use relay_modbus::types::{FunctionCode, ModbusTcpConfig};
//! use std::time::Duration;
//!
//! assert!(FunctionCode::WriteSingleCoil.is_write_class());
//!
//! let config = ModbusTcpConfig::builder()
//!     .host("192.168.1.100")
//!     .port(502)
//!     .read_timeout(Duration::from_secs(1))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ModbusError};

// =============================================================================
// FunctionCode
// =============================================================================

/// Modbus public function codes implemented by this client.
///
/// An error response carries the request's function code plus `0x80`
/// (the exception offset); that raw byte is not representable here and
/// is handled at the framing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum FunctionCode {
    /// Read Coils (FC 01).
    ReadCoils = 0x01,
    /// Read Discrete Inputs (FC 02).
    ReadDiscreteInputs = 0x02,
    /// Read Holding Registers (FC 03).
    ReadHoldingRegisters = 0x03,
    /// Read Input Registers (FC 04).
    ReadInputRegisters = 0x04,
    /// Write Single Coil (FC 05).
    WriteSingleCoil = 0x05,
    /// Write Single Register (FC 06).
    WriteSingleRegister = 0x06,
    /// Write Multiple Coils (FC 15).
    WriteMultipleCoils = 0x0F,
    /// Write Multiple Registers (FC 16).
    WriteMultipleRegisters = 0x10,
    /// Write File Record (FC 21).
    WriteFileRecord = 0x15,
    /// Mask Write Register (FC 22).
    MaskWriteRegister = 0x16,
    /// Read/Write Multiple Registers (FC 23).
    ReadWriteMultipleRegisters = 0x17,
}

impl FunctionCode {
    /// Returns the raw function code byte.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Creates from a raw function code byte.
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::ReadCoils),
            0x02 => Some(Self::ReadDiscreteInputs),
            0x03 => Some(Self::ReadHoldingRegisters),
            0x04 => Some(Self::ReadInputRegisters),
            0x05 => Some(Self::WriteSingleCoil),
            0x06 => Some(Self::WriteSingleRegister),
            0x0F => Some(Self::WriteMultipleCoils),
            0x10 => Some(Self::WriteMultipleRegisters),
            0x15 => Some(Self::WriteFileRecord),
            0x16 => Some(Self::MaskWriteRegister),
            0x17 => Some(Self::ReadWriteMultipleRegisters),
            _ => None,
        }
    }

    /// Returns `true` if this function code is permitted in a broadcast
    /// request (unit identifier 0 with gateway mode enabled).
    ///
    /// Broadcasts elicit no response, so only write commands qualify.
    #[inline]
    pub const fn is_write_class(self) -> bool {
        matches!(
            self,
            Self::WriteSingleCoil
                | Self::WriteSingleRegister
                | Self::WriteMultipleCoils
                | Self::WriteMultipleRegisters
                | Self::WriteFileRecord
                | Self::MaskWriteRegister
        )
    }

    /// Returns the full name of this function code.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ReadCoils => "Read Coils",
            Self::ReadDiscreteInputs => "Read Discrete Inputs",
            Self::ReadHoldingRegisters => "Read Holding Registers",
            Self::ReadInputRegisters => "Read Input Registers",
            Self::WriteSingleCoil => "Write Single Coil",
            Self::WriteSingleRegister => "Write Single Register",
            Self::WriteMultipleCoils => "Write Multiple Coils",
            Self::WriteMultipleRegisters => "Write Multiple Registers",
            Self::WriteFileRecord => "Write File Record",
            Self::MaskWriteRegister => "Mask Write Register",
            Self::ReadWriteMultipleRegisters => "Read/Write Multiple Registers",
        }
    }
}

impl fmt::Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (FC {:#04x})", self.name(), self.as_u8())
    }
}

// =============================================================================
// ExceptionCode
// =============================================================================

/// Modbus exception codes reported by the remote unit.
///
/// Every byte value in `[1, 255]` round-trips through
/// [`ExceptionCode::from_u8`] / [`ExceptionCode::as_u8`]; codes outside
/// the standard set map to [`ExceptionCode::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionCode {
    /// The function code is not supported (0x01).
    IllegalFunction,
    /// The data address is not valid (0x02).
    IllegalDataAddress,
    /// The data value is not valid (0x03).
    IllegalDataValue,
    /// The device failed while executing the request (0x04).
    ServerDeviceFailure,
    /// The request was accepted, a long-running operation is in progress (0x05).
    Acknowledge,
    /// The device is busy (0x06).
    ServerDeviceBusy,
    /// The device cannot perform the programming function (0x07).
    NegativeAcknowledge,
    /// Parity error in the extended memory (0x08).
    MemoryParityError,
    /// The gateway path is not available (0x0A).
    GatewayPathUnavailable,
    /// The gateway target device failed to respond (0x0B).
    GatewayTargetDeviceFailed,
    /// A non-standard exception code.
    Custom(u8),
}

impl ExceptionCode {
    /// Creates from a raw exception code byte.
    pub const fn from_u8(code: u8) -> Self {
        match code {
            0x01 => Self::IllegalFunction,
            0x02 => Self::IllegalDataAddress,
            0x03 => Self::IllegalDataValue,
            0x04 => Self::ServerDeviceFailure,
            0x05 => Self::Acknowledge,
            0x06 => Self::ServerDeviceBusy,
            0x07 => Self::NegativeAcknowledge,
            0x08 => Self::MemoryParityError,
            0x0A => Self::GatewayPathUnavailable,
            0x0B => Self::GatewayTargetDeviceFailed,
            other => Self::Custom(other),
        }
    }

    /// Returns the raw exception code byte.
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::IllegalFunction => 0x01,
            Self::IllegalDataAddress => 0x02,
            Self::IllegalDataValue => 0x03,
            Self::ServerDeviceFailure => 0x04,
            Self::Acknowledge => 0x05,
            Self::ServerDeviceBusy => 0x06,
            Self::NegativeAcknowledge => 0x07,
            Self::MemoryParityError => 0x08,
            Self::GatewayPathUnavailable => 0x0A,
            Self::GatewayTargetDeviceFailed => 0x0B,
            Self::Custom(code) => code,
        }
    }

    /// Returns the human-readable name for this exception code.
    pub const fn name(self) -> &'static str {
        match self {
            Self::IllegalFunction => "Illegal Function",
            Self::IllegalDataAddress => "Illegal Data Address",
            Self::IllegalDataValue => "Illegal Data Value",
            Self::ServerDeviceFailure => "Slave Device Failure",
            Self::Acknowledge => "Acknowledge",
            Self::ServerDeviceBusy => "Slave Device Busy",
            Self::NegativeAcknowledge => "Negative Acknowledge",
            Self::MemoryParityError => "Memory Parity Error",
            Self::GatewayPathUnavailable => "Gateway Path Unavailable",
            Self::GatewayTargetDeviceFailed => "Gateway Target Device Failed to Respond",
            Self::Custom(_) => "Unknown Exception",
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#04x})", self.name(), self.as_u8())
    }
}

// =============================================================================
// RegisterType
// =============================================================================

/// Modbus register type with per-type limits.
///
/// Modbus defines four types of registers, each with different
/// characteristics for read/write access and data size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterType {
    /// Coil (read/write, 1 bit).
    Coil,

    /// Discrete Input (read-only, 1 bit).
    DiscreteInput,

    /// Holding Register (read/write, 16 bits).
    #[default]
    HoldingRegister,

    /// Input Register (read-only, 16 bits).
    InputRegister,
}

impl RegisterType {
    /// Returns `true` if this register type is writable.
    #[inline]
    pub const fn is_writable(&self) -> bool {
        matches!(self, Self::Coil | Self::HoldingRegister)
    }

    /// Returns `true` if this is a bit-type register (1-bit).
    #[inline]
    pub const fn is_bit(&self) -> bool {
        matches!(self, Self::Coil | Self::DiscreteInput)
    }

    /// Returns `true` if this is a word-type register (16-bit).
    #[inline]
    pub const fn is_word(&self) -> bool {
        matches!(self, Self::HoldingRegister | Self::InputRegister)
    }

    /// Returns the function code for reading this register type.
    #[inline]
    pub const fn read_function_code(&self) -> FunctionCode {
        match self {
            Self::Coil => FunctionCode::ReadCoils,
            Self::DiscreteInput => FunctionCode::ReadDiscreteInputs,
            Self::HoldingRegister => FunctionCode::ReadHoldingRegisters,
            Self::InputRegister => FunctionCode::ReadInputRegisters,
        }
    }

    /// Returns the function code for writing a single value.
    ///
    /// Returns `None` for read-only register types.
    #[inline]
    pub const fn write_single_function_code(&self) -> Option<FunctionCode> {
        match self {
            Self::Coil => Some(FunctionCode::WriteSingleCoil),
            Self::HoldingRegister => Some(FunctionCode::WriteSingleRegister),
            Self::DiscreteInput | Self::InputRegister => None,
        }
    }

    /// Returns the function code for writing multiple values.
    ///
    /// Returns `None` for read-only register types.
    #[inline]
    pub const fn write_multiple_function_code(&self) -> Option<FunctionCode> {
        match self {
            Self::Coil => Some(FunctionCode::WriteMultipleCoils),
            Self::HoldingRegister => Some(FunctionCode::WriteMultipleRegisters),
            Self::DiscreteInput | Self::InputRegister => None,
        }
    }

    /// Returns the maximum number of items readable in a single request.
    #[inline]
    pub const fn max_read_count(&self) -> u16 {
        match self {
            Self::Coil | Self::DiscreteInput => 2000,
            Self::HoldingRegister | Self::InputRegister => 125,
        }
    }

    /// Returns the maximum number of items writable in a single request.
    #[inline]
    pub const fn max_write_count(&self) -> Option<u16> {
        match self {
            Self::Coil => Some(1968),
            Self::HoldingRegister => Some(123),
            Self::DiscreteInput | Self::InputRegister => None,
        }
    }

    /// Returns the short name for this register type.
    pub const fn short_name(&self) -> &'static str {
        match self {
            Self::Coil => "C",
            Self::DiscreteInput => "DI",
            Self::InputRegister => "IR",
            Self::HoldingRegister => "HR",
        }
    }

    /// Returns the full name for this register type.
    pub const fn full_name(&self) -> &'static str {
        match self {
            Self::Coil => "Coil",
            Self::DiscreteInput => "Discrete Input",
            Self::InputRegister => "Input Register",
            Self::HoldingRegister => "Holding Register",
        }
    }
}

impl fmt::Display for RegisterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order for payload data values.
///
/// The MBAP envelope and the protocol fields inside a request (addresses,
/// quantities) are always big-endian on the wire. Register *data* is
/// interpreted per this setting, because devices disagree on the layout
/// of 16-bit words and of values spanning multiple registers.
///
/// The letter codes describe the byte layout of the 32-bit value
/// `0xAABBCCDD` on the wire, `A` being the most significant byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// `ABCD` - high word first, big-endian bytes within each word.
    /// The most common layout for Modbus devices.
    #[default]
    BigEndian,

    /// `DCBA` - low word first, little-endian bytes within each word.
    LittleEndian,

    /// `CDAB` - low word first, big-endian bytes within each word
    /// (word-swapped, common on Modicon-style devices).
    MidBigEndian,

    /// `BADC` - high word first, little-endian bytes within each word
    /// (byte-swapped).
    MidLittleEndian,
}

impl ByteOrder {
    /// Returns `true` if bytes within each 16-bit word are big-endian.
    #[inline]
    pub const fn word_bytes_big_endian(&self) -> bool {
        matches!(self, Self::BigEndian | Self::MidBigEndian)
    }

    /// Returns `true` if the high-order word comes first in
    /// multi-register values.
    #[inline]
    pub const fn high_word_first(&self) -> bool {
        matches!(self, Self::BigEndian | Self::MidLittleEndian)
    }

    /// Returns the letter code of this byte order.
    pub const fn letter_code(&self) -> &'static str {
        match self {
            Self::BigEndian => "ABCD",
            Self::LittleEndian => "DCBA",
            Self::MidBigEndian => "CDAB",
            Self::MidLittleEndian => "BADC",
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BigEndian => "big_endian",
            Self::LittleEndian => "little_endian",
            Self::MidBigEndian => "mid_big_endian",
            Self::MidLittleEndian => "mid_little_endian",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ByteOrder {
    type Err = ModbusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "bigendian" | "big" | "be" | "abcd" | "network" => Ok(Self::BigEndian),
            "littleendian" | "little" | "le" | "dcba" | "intel" => Ok(Self::LittleEndian),
            "midbigendian" | "midbig" | "cdab" | "wordswap" => Ok(Self::MidBigEndian),
            "midlittleendian" | "midlittle" | "badc" | "byteswap" => Ok(Self::MidLittleEndian),
            _ => Err(ModbusError::configuration(ConfigurationError::invalid_value(
                "byte_order",
                format!(
                    "'{}' (expected: big_endian, little_endian, mid_big_endian, mid_little_endian)",
                    s
                ),
            ))),
        }
    }
}

// =============================================================================
// ModbusTcpConfig
// =============================================================================

/// Configuration for Modbus TCP connections.
///
/// The unit identifier is not part of the configuration: it is supplied
/// per request, because a single TCP endpoint may be a gateway fronting
/// many serial end units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModbusTcpConfig {
    /// Target host address.
    pub host: String,

    /// Target port (default: 502).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connection timeout.
    #[serde(default = "default_connect_timeout")]
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Read timeout (None = block until the peer responds).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    #[serde(with = "option_duration")]
    pub read_timeout: Option<Duration>,

    /// Write timeout (None = block until the kernel accepts the bytes).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    #[serde(with = "option_duration")]
    pub write_timeout: Option<Duration>,

    /// Gateway mode: enables unit identifier 0 for Modbus broadcasts and
    /// restricts unit identifiers to the serial-line range 0-247.
    #[serde(default)]
    pub gateway_mode: bool,

    /// Enable TCP_NODELAY.
    #[serde(default = "default_true")]
    pub tcp_nodelay: bool,

    /// Byte order for payload data values.
    #[serde(default)]
    pub byte_order: ByteOrder,
}

fn default_port() -> u16 {
    502
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(1)
}

fn default_true() -> bool {
    true
}

mod option_duration {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => {
                let s = humantime::format_duration(*d).to_string();
                s.serialize(serializer)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        match opt {
            Some(s) => {
                let d = humantime::parse_duration(&s).map_err(serde::de::Error::custom)?;
                Ok(Some(d))
            }
            None => Ok(None),
        }
    }
}

impl ModbusTcpConfig {
    /// Creates a new builder for ModbusTcpConfig.
    pub fn builder() -> ModbusTcpConfigBuilder {
        ModbusTcpConfigBuilder::default()
    }

    /// Creates a simple configuration with just host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Creates configuration with host and port.
    pub fn with_port(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Returns the socket address string.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), ModbusError> {
        if self.host.is_empty() {
            return Err(ModbusError::configuration(
                ConfigurationError::missing_field("host"),
            ));
        }

        if self.port == 0 {
            return Err(ModbusError::configuration(
                ConfigurationError::invalid_port(0, "port must be non-zero"),
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(ModbusError::configuration(
                ConfigurationError::invalid_timeout(
                    self.connect_timeout,
                    "connect timeout must be greater than 0",
                ),
            ));
        }

        for (field, timeout) in [("read", self.read_timeout), ("write", self.write_timeout)] {
            if let Some(duration) = timeout {
                if duration.is_zero() {
                    return Err(ModbusError::configuration(
                        ConfigurationError::invalid_timeout(
                            duration,
                            format!("{} timeout must be greater than 0 when set", field),
                        ),
                    ));
                }
            }
        }

        Ok(())
    }
}

impl Default for ModbusTcpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            connect_timeout: default_connect_timeout(),
            read_timeout: None,
            write_timeout: None,
            gateway_mode: false,
            tcp_nodelay: true,
            byte_order: ByteOrder::default(),
        }
    }
}

// =============================================================================
// ModbusTcpConfigBuilder
// =============================================================================

/// Builder for ModbusTcpConfig.
#[derive(Debug, Default)]
pub struct ModbusTcpConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    gateway_mode: Option<bool>,
    tcp_nodelay: Option<bool>,
    byte_order: Option<ByteOrder>,
}

impl ModbusTcpConfigBuilder {
    /// Sets the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Sets the write timeout.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// Enables or disables gateway mode.
    pub fn gateway_mode(mut self, enabled: bool) -> Self {
        self.gateway_mode = Some(enabled);
        self
    }

    /// Sets TCP_NODELAY.
    pub fn tcp_nodelay(mut self, nodelay: bool) -> Self {
        self.tcp_nodelay = Some(nodelay);
        self
    }

    /// Sets the payload byte order.
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = Some(order);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Result<ModbusTcpConfig, ModbusError> {
        let host = self
            .host
            .ok_or_else(|| ModbusError::configuration(ConfigurationError::missing_field("host")))?;

        let config = ModbusTcpConfig {
            host,
            port: self.port.unwrap_or_else(default_port),
            connect_timeout: self.connect_timeout.unwrap_or_else(default_connect_timeout),
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
            gateway_mode: self.gateway_mode.unwrap_or(false),
            tcp_nodelay: self.tcp_nodelay.unwrap_or(true),
            byte_order: self.byte_order.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Tests
// =============================================================================
