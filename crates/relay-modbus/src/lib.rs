// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # relay-modbus
//!
//! Synchronous Modbus TCP client for RELAY industrial tooling.
//!
//! This crate implements the Modbus TCP wire protocol in full, without
//! delegating the framing to an external protocol stack:
//!
//! - **MBAP framing**: envelope codec, fixed reusable frame buffer,
//!   wrapping transaction sequencer
//! - **Transceive engine**: one exchange at a time over an abstract
//!   blocking byte stream, robust against arbitrarily fragmented reads
//! - **Typed client API**: FC 01-06, 15, 16, 22 and 23 as typed
//!   operations with per-function quantity validation
//! - **Gateway mode**: unit identifier range checks and unit-0
//!   broadcasts for serial-line gateways
//! - **Byte-order handling**: configurable payload data orders
//!   (`ABCD`/`DCBA`/`CDAB`/`BADC`); the envelope itself is always
//!   big-endian
//! - **Closed error taxonomy**: validation, transport, framing, remote
//!   exception and desynchronization failures are distinct variants
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use relay_modbus::client::ModbusTcpClient;
//! use relay_modbus::types::ModbusTcpConfig;
//! use std::time::Duration;
//!
//! let config = ModbusTcpConfig::builder()
//!     .host("192.168.1.100")
//!     .port(502)
//!     .read_timeout(Duration::from_secs(1))
//!     .build()?;
//!
//! let mut client = ModbusTcpClient::new(config);
//! client.connect()?;
//!
//! let registers = client.read_holding_registers(1, 0, 10)?;
//! client.write_single_register(1, 100, 0x1234)?;
//!
//! client.disconnect();
//! ```
//!
//! ## Error Handling
//!
//! ```rust,ignore
//! use relay_modbus::error::{ModbusError, ProtocolError};
//!
//! match client.read_holding_registers(1, 0, 10) {
//!     Ok(values) => println!("{values:?}"),
//!     Err(ModbusError::Protocol(ProtocolError::ExceptionResponse {
//!         exception_code, ..
//!     })) => println!("device reported exception {exception_code}"),
//!     Err(error) if error.is_retryable() => {
//!         println!("transient failure, retry after {:?}", error.suggested_retry_delay());
//!     }
//!     Err(error) => return Err(error.into()),
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! One client supports one exchange at a time; every operation takes
//! `&mut self`, so a second in-flight request is a compile error rather
//! than a runtime hazard. The transaction sequencer is atomic and is the
//! only state that tolerates concurrent access.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod client;
pub mod error;
pub mod frame;
pub mod types;

// =============================================================================
// Re-exports - Error Module
// =============================================================================

pub use error::{
    // Main error type
    ModbusError,
    ModbusResult,
    // Error categories
    ConfigurationError,
    ConnectionError,
    ConversionError,
    OperationError,
    ProtocolError,
    TimeoutError,
    // Error metadata
    ErrorCode,
    ErrorSeverity,
};

// =============================================================================
// Re-exports - Types Module
// =============================================================================

pub use types::{
    ByteOrder,
    ExceptionCode,
    FunctionCode,
    ModbusTcpConfig,
    ModbusTcpConfigBuilder,
    RegisterType,
};

// =============================================================================
// Re-exports - Frame Module
// =============================================================================

pub use frame::{
    FrameBuffer,
    FrameWriter,
    MbapHeader,
    TransactionSequencer,
    BROADCAST_UNIT_ID,
    EXCEPTION_OFFSET,
    MAX_FRAME_SIZE,
    MAX_UNIT_ID,
    MBAP_HEADER_LEN,
    PROTOCOL_ID,
};

// =============================================================================
// Re-exports - Client Module
// =============================================================================

pub use client::{
    DataConverter,
    FrameTransport,
    ModbusTcpClient,
    TcpTransport,
    TransceiveEngine,
    TransportState,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
