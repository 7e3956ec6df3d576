// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus client implementations.
//!
//! This module layers the client surface over the protocol engine:
//!
//! - **Transport Layer**: blocking byte-stream abstraction and the TCP
//!   implementation
//! - **Transceive Engine**: one request/response exchange, transport-agnostic
//! - **TCP Client**: connection management plus the typed function-code API
//! - **Data Conversion**: payload byte-order handling and coil packing
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      ModbusTcpClient                            │
//! │        (connection management, typed read/write API)           │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     TransceiveEngine                            │
//! │      (envelope assembly, response accumulation, validation)     │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      FrameTransport                             │
//! │              (abstract blocking byte stream)                    │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                    ┌─────────────────────┐
//!                    │    TcpTransport     │
//!                    │  (std::net stream)  │
//!                    └─────────────────────┘
//! ```
//!
//! The engine never touches a socket directly: it consumes the
//! [`FrameTransport`] capability, so the framing logic is identical for
//! the production TCP stream and for the scripted transports used in
//! tests.

mod conversion;
mod engine;
mod tcp;
mod transport;

pub use conversion::{pack_coils, unpack_coils, DataConverter};
pub use engine::TransceiveEngine;
pub use tcp::ModbusTcpClient;
pub use transport::{FrameTransport, TcpTransport, TransportState};
