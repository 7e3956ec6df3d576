// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus client error types with comprehensive diagnostics.
//!
//! This module provides a rich error type hierarchy for Modbus TCP
//! exchanges, designed for:
//!
//! - **Exhaustiveness**: every failure class a `transceive` call can
//!   produce is a distinct, matchable variant
//! - **Diagnostics**: detailed error information for debugging
//! - **Recovery**: hints for error recovery and retry strategies
//!
//! # Error Categories
//!
//! ```text
//! ModbusError
//! ├── Connection    - TCP connect/stream failures
//! ├── Protocol      - framing violations, exception responses
//! ├── Timeout       - read/write deadline exceeded
//! ├── Operation     - request validation (quantity limits)
//! ├── Conversion    - response payload decoding
//! └── Configuration - invalid settings
//! ```
//!
//! Retry policy is a caller concern: nothing in this crate retries on
//! its own. [`ModbusError::is_retryable`] and
//! [`ModbusError::suggested_retry_delay`] exist so callers can build
//! their own policy on top.
//!
//! # Examples
//!
//! ```
//! use relay_modbus::error::{ModbusError, ConnectionError};
//!
//! let error = ModbusError::connection(ConnectionError::refused("192.168.1.100", 502));
//!
//! if error.is_retryable() {
//!     println!("Will retry after {:?}", error.suggested_retry_delay());
//! }
//! for hint in error.recovery_hints() {
//!     println!("Hint: {}", hint);
//! }
//! ```

use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

use crate::types::ExceptionCode;

// =============================================================================
// ModbusError - Main Error Type
// =============================================================================

/// The main error type for Modbus operations.
///
/// This enum categorizes errors by their domain, making it easy to handle
/// specific error types while maintaining a unified interface.
#[derive(Debug, Error)]
pub enum ModbusError {
    /// Connection-related errors.
    #[error("{0}")]
    Connection(#[from] ConnectionError),

    /// Modbus protocol errors (framing, exception responses).
    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    /// Timeout errors.
    #[error("{0}")]
    Timeout(#[from] TimeoutError),

    /// Request validation errors.
    #[error("{0}")]
    Operation(#[from] OperationError),

    /// Response payload conversion errors.
    #[error("{0}")]
    Conversion(#[from] ConversionError),

    /// Configuration errors.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),
}

impl ModbusError {
    // =========================================================================
    // Factory Methods
    // =========================================================================

    /// Creates a connection error.
    #[inline]
    pub fn connection(error: ConnectionError) -> Self {
        Self::Connection(error)
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(error: ProtocolError) -> Self {
        Self::Protocol(error)
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(error: TimeoutError) -> Self {
        Self::Timeout(error)
    }

    /// Creates an operation error.
    #[inline]
    pub fn operation(error: OperationError) -> Self {
        Self::Operation(error)
    }

    /// Creates a conversion error.
    #[inline]
    pub fn conversion(error: ConversionError) -> Self {
        Self::Conversion(error)
    }

    /// Creates a configuration error.
    #[inline]
    pub fn configuration(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }

    // =========================================================================
    // Convenience Factory Methods
    // =========================================================================

    /// Creates a not connected error.
    pub fn not_connected() -> Self {
        Self::Connection(ConnectionError::NotConnected)
    }

    /// Creates an exception response error.
    pub fn exception(function_code: u8, exception_code: u8) -> Self {
        Self::Protocol(ProtocolError::exception_response(
            function_code,
            exception_code,
        ))
    }

    /// Creates a read operation timeout.
    pub fn read_timeout(duration: Duration) -> Self {
        Self::Timeout(TimeoutError::read(duration))
    }

    /// Creates a write operation timeout.
    pub fn write_timeout(duration: Duration) -> Self {
        Self::Timeout(TimeoutError::write(duration))
    }

    // =========================================================================
    // Error Properties
    // =========================================================================

    /// Returns `true` if this error is retryable.
    ///
    /// Retryable errors are typically transient issues that may succeed
    /// on a subsequent attempt with appropriate backoff. The exchange
    /// itself is never retried by this crate.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(e) => e.is_retryable(),
            Self::Protocol(e) => e.is_retryable(),
            Self::Timeout(_) => true,
            Self::Operation(_) | Self::Conversion(_) | Self::Configuration(_) => false,
        }
    }

    /// Returns the suggested retry delay for this error.
    ///
    /// Returns `None` if the error is not retryable.
    pub fn suggested_retry_delay(&self) -> Option<Duration> {
        if !self.is_retryable() {
            return None;
        }

        match self {
            Self::Connection(e) => Some(e.suggested_retry_delay()),
            Self::Protocol(e) => e.suggested_retry_delay(),
            Self::Timeout(e) => Some(e.suggested_retry_delay()),
            _ => None,
        }
    }

    /// Returns the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Connection(e) => e.severity(),
            Self::Protocol(e) => e.severity(),
            Self::Timeout(_) => ErrorSeverity::Warning,
            Self::Operation(_) => ErrorSeverity::Error,
            Self::Conversion(_) => ErrorSeverity::Error,
            Self::Configuration(_) => ErrorSeverity::Critical,
        }
    }

    /// Returns the error category for logging and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Protocol(_) => "protocol",
            Self::Timeout(_) => "timeout",
            Self::Operation(_) => "operation",
            Self::Conversion(_) => "conversion",
            Self::Configuration(_) => "configuration",
        }
    }

    /// Returns a unique error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Connection(e) => e.error_code(),
            Self::Protocol(e) => e.error_code(),
            Self::Timeout(e) => e.error_code(),
            Self::Operation(e) => e.error_code(),
            Self::Conversion(e) => e.error_code(),
            Self::Configuration(e) => e.error_code(),
        }
    }

    /// Returns recovery hints for this error.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::Connection(e) => e.recovery_hints(),
            Self::Protocol(e) => e.recovery_hints(),
            Self::Timeout(e) => e.recovery_hints(),
            Self::Operation(e) => e.recovery_hints(),
            Self::Conversion(e) => e.recovery_hints(),
            Self::Configuration(e) => e.recovery_hints(),
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Connection(e) => e.user_message(),
            Self::Protocol(e) => e.user_message(),
            Self::Timeout(e) => e.user_message(),
            Self::Operation(e) => e.user_message(),
            Self::Conversion(e) => e.user_message(),
            Self::Configuration(e) => e.user_message(),
        }
    }

    /// Returns the tracing level for this error.
    pub fn tracing_level(&self) -> Level {
        self.severity().to_tracing_level()
    }

    /// Logs this error with appropriate level and context.
    pub fn log(&self, context: &str) {
        let level = self.tracing_level();
        let code = self.error_code();

        match level {
            Level::ERROR => tracing::error!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            Level::WARN => tracing::warn!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            _ => tracing::debug!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
        }
    }
}

// =============================================================================
// ConnectionError
// =============================================================================

/// Connection-related errors.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// TCP connection refused.
    #[error("Connection refused to {host}:{port}")]
    Refused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
        /// Underlying error.
        #[source]
        source: Option<io::Error>,
    },

    /// TCP connection timed out.
    #[error("Connection timed out to {host}:{port} after {duration:?}")]
    TimedOut {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
        /// Timeout duration.
        duration: Duration,
    },

    /// DNS resolution failed.
    #[error("Failed to resolve hostname '{hostname}'")]
    DnsResolutionFailed {
        /// The hostname that failed to resolve.
        hostname: String,
        /// Underlying error.
        #[source]
        source: Option<io::Error>,
    },

    /// Connection closed unexpectedly.
    ///
    /// Raised when a read returns zero bytes while frame bytes are still
    /// outstanding. The exchange is aborted; the connection must not be
    /// reused.
    #[error("Connection closed unexpectedly")]
    Closed {
        /// Reason for closure.
        reason: Option<String>,
    },

    /// Not connected.
    #[error("Not connected to Modbus device")]
    NotConnected,

    /// Generic I/O error.
    #[error("I/O error: {message}")]
    Io {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl ConnectionError {
    /// Creates a connection refused error.
    pub fn refused(host: impl Into<String>, port: u16) -> Self {
        Self::Refused {
            host: host.into(),
            port,
            source: None,
        }
    }

    /// Creates a connection refused error with source.
    pub fn refused_with(host: impl Into<String>, port: u16, source: io::Error) -> Self {
        Self::Refused {
            host: host.into(),
            port,
            source: Some(source),
        }
    }

    /// Creates a connection timed out error.
    pub fn timed_out(host: impl Into<String>, port: u16, duration: Duration) -> Self {
        Self::TimedOut {
            host: host.into(),
            port,
            duration,
        }
    }

    /// Creates a DNS resolution failed error.
    pub fn dns_failed(hostname: impl Into<String>) -> Self {
        Self::DnsResolutionFailed {
            hostname: hostname.into(),
            source: None,
        }
    }

    /// Creates a connection closed error.
    pub fn closed(reason: Option<String>) -> Self {
        Self::Closed { reason }
    }

    /// Creates an I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Refused { .. } => true,
            Self::TimedOut { .. } => true,
            Self::DnsResolutionFailed { .. } => true,
            Self::Closed { .. } => true,
            Self::NotConnected => true,
            Self::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::Interrupted
            ),
        }
    }

    /// Returns the suggested retry delay.
    pub fn suggested_retry_delay(&self) -> Duration {
        match self {
            Self::Refused { .. } => Duration::from_secs(1),
            Self::TimedOut { duration, .. } => *duration,
            Self::DnsResolutionFailed { .. } => Duration::from_secs(5),
            Self::Closed { .. } => Duration::from_millis(500),
            Self::NotConnected => Duration::from_millis(100),
            Self::Io { .. } => Duration::from_secs(1),
        }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotConnected => ErrorSeverity::Warning,
            Self::TimedOut { .. } => ErrorSeverity::Warning,
            Self::Closed { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Refused { .. } => ErrorCode::new(1, 1),
            Self::TimedOut { .. } => ErrorCode::new(1, 2),
            Self::DnsResolutionFailed { .. } => ErrorCode::new(1, 3),
            Self::Closed { .. } => ErrorCode::new(1, 4),
            Self::NotConnected => ErrorCode::new(1, 5),
            Self::Io { .. } => ErrorCode::new(1, 6),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::Refused { .. } => vec![
                "Check if the Modbus device is powered on",
                "Verify the IP address and port are correct",
                "Check firewall rules allow the connection",
            ],
            Self::TimedOut { .. } => vec![
                "Check network connectivity to the device",
                "Increase the connection timeout setting",
                "Verify the device is not overloaded",
            ],
            Self::DnsResolutionFailed { .. } => vec![
                "Verify the hostname is correct",
                "Check DNS server configuration",
                "Try using an IP address instead",
            ],
            Self::Closed { .. } => vec![
                "The connection was closed by the device or network",
                "Reconnect before issuing further requests",
            ],
            Self::NotConnected => vec!["Call connect() before performing operations"],
            Self::Io { .. } => vec!["Check network connectivity", "Retry the operation"],
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Refused { host, port, .. } => {
                format!("Modbus 장비({}:{})에 연결할 수 없습니다", host, port)
            }
            Self::TimedOut { host, port, .. } => {
                format!("Modbus 장비({}:{}) 연결 시간 초과", host, port)
            }
            Self::DnsResolutionFailed { hostname, .. } => {
                format!("호스트명 '{}' 조회 실패", hostname)
            }
            Self::Closed { .. } => "연결이 끊어졌습니다".to_string(),
            Self::NotConnected => "Modbus 장비에 연결되어 있지 않습니다".to_string(),
            Self::Io { .. } => "네트워크 오류가 발생했습니다".to_string(),
        }
    }
}

impl From<io::Error> for ConnectionError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::ConnectionRefused => Self::Refused {
                host: "unknown".to_string(),
                port: 0,
                source: Some(error),
            },
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => Self::Closed {
                reason: Some(error.to_string()),
            },
            _ => Self::Io {
                message: error.to_string(),
                source: error,
            },
        }
    }
}

// =============================================================================
// ProtocolError
// =============================================================================

/// Modbus protocol-level errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Modbus exception response received.
    ///
    /// A normal, expected outcome carrying a remote-reported exception
    /// code. Not necessarily fatal to the connection.
    #[error("Modbus exception: function code {function_code:#04x}, exception {exception_code} ({exception_name})")]
    ExceptionResponse {
        /// The function code that caused the exception.
        function_code: u8,
        /// The exception code.
        exception_code: u8,
        /// Human-readable exception name.
        exception_name: String,
    },

    /// Non-zero protocol identifier in the MBAP envelope.
    ///
    /// The response is unparseable per protocol rules; the exchange is
    /// aborted.
    #[error("Invalid protocol identifier: {protocol_id:#06x} (expected 0)")]
    InvalidProtocolId {
        /// The protocol identifier found in the envelope.
        protocol_id: u16,
    },

    /// Response function code matches neither the request nor its
    /// exception variant.
    ///
    /// Indicates a desynchronized stream; the connection must not be
    /// assumed reusable.
    #[error("Response function code mismatch: expected {expected:#04x}, got {actual:#04x}")]
    FunctionCodeMismatch {
        /// The requested function code.
        expected: u8,
        /// The function code found in the response.
        actual: u8,
    },

    /// Invalid function code byte.
    #[error("Invalid function code: {code:#04x}")]
    InvalidFunctionCode {
        /// The invalid code.
        code: u8,
    },

    /// Frame too short.
    #[error("Frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum bytes.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Frame exceeds the protocol maximum.
    #[error("Frame too long: maximum {max} bytes, got {actual}")]
    FrameTooLong {
        /// Maximum allowed bytes.
        max: usize,
        /// Actual bytes.
        actual: usize,
    },

    /// Unit identifier outside the gateway-addressable range.
    #[error("Invalid unit identifier: {unit_id} (valid range: 0-247 in gateway mode)")]
    InvalidUnitId {
        /// The invalid unit identifier.
        unit_id: u8,
    },

    /// Broadcast used with a non-write function code.
    #[error("Invalid use of broadcast: function code {function_code:#04x} is not a write command")]
    InvalidBroadcastFunction {
        /// The offending function code.
        function_code: u8,
    },
}

impl ProtocolError {
    /// Creates an exception response error.
    pub fn exception_response(function_code: u8, exception_code: u8) -> Self {
        Self::ExceptionResponse {
            function_code,
            exception_code,
            exception_name: ExceptionCode::from_u8(exception_code).name().to_string(),
        }
    }

    /// Creates an invalid protocol identifier error.
    pub fn invalid_protocol_id(protocol_id: u16) -> Self {
        Self::InvalidProtocolId { protocol_id }
    }

    /// Creates a function code mismatch error.
    pub fn function_code_mismatch(expected: u8, actual: u8) -> Self {
        Self::FunctionCodeMismatch { expected, actual }
    }

    /// Creates a frame too short error.
    pub fn frame_too_short(expected: usize, actual: usize) -> Self {
        Self::FrameTooShort { expected, actual }
    }

    /// Creates a frame too long error.
    pub fn frame_too_long(max: usize, actual: usize) -> Self {
        Self::FrameTooLong { max, actual }
    }

    /// Creates an invalid unit identifier error.
    pub fn invalid_unit_id(unit_id: u8) -> Self {
        Self::InvalidUnitId { unit_id }
    }

    /// Creates an invalid broadcast error.
    pub fn invalid_broadcast_function(function_code: u8) -> Self {
        Self::InvalidBroadcastFunction { function_code }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ExceptionResponse { exception_code, .. } => {
                // Acknowledge, busy, gateway target failed
                matches!(exception_code, 0x05 | 0x06 | 0x0B)
            }
            _ => false,
        }
    }

    /// Returns the suggested retry delay.
    pub fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            Self::ExceptionResponse { exception_code, .. } => match exception_code {
                0x05 => Some(Duration::from_millis(500)),
                0x06 => Some(Duration::from_secs(1)),
                0x0B => Some(Duration::from_secs(2)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ExceptionResponse { exception_code, .. } => match exception_code {
                0x05 | 0x06 => ErrorSeverity::Warning,
                0x01..=0x03 => ErrorSeverity::Error,
                _ => ErrorSeverity::Critical,
            },
            Self::InvalidUnitId { .. } | Self::InvalidBroadcastFunction { .. } => {
                ErrorSeverity::Error
            }
            Self::FunctionCodeMismatch { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::ExceptionResponse { exception_code, .. } => ErrorCode::new(2, *exception_code),
            Self::InvalidProtocolId { .. } => ErrorCode::new(2, 20),
            Self::FunctionCodeMismatch { .. } => ErrorCode::new(2, 21),
            Self::InvalidFunctionCode { .. } => ErrorCode::new(2, 22),
            Self::FrameTooShort { .. } => ErrorCode::new(2, 23),
            Self::FrameTooLong { .. } => ErrorCode::new(2, 24),
            Self::InvalidUnitId { .. } => ErrorCode::new(2, 25),
            Self::InvalidBroadcastFunction { .. } => ErrorCode::new(2, 26),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::ExceptionResponse { exception_code, .. } => match exception_code {
                0x01 => vec![
                    "The function code is not supported by this device",
                    "Check device documentation for supported functions",
                ],
                0x02 => vec![
                    "The register address is out of range",
                    "Check device memory map documentation",
                ],
                0x03 => vec![
                    "The value is not valid for this register",
                    "Check value range constraints",
                ],
                0x06 => vec!["The device is busy, retry after a delay"],
                _ => vec!["Check device status and documentation"],
            },
            Self::InvalidProtocolId { .. } => vec![
                "The peer is not speaking Modbus TCP",
                "Verify the endpoint and port configuration",
            ],
            Self::FunctionCodeMismatch { .. } => vec![
                "The stream is desynchronized",
                "Disconnect and reconnect before issuing further requests",
            ],
            Self::InvalidUnitId { .. } => vec![
                "Gateway-routed unit identifiers must be 0-247",
            ],
            Self::InvalidBroadcastFunction { .. } => vec![
                "Broadcast (unit 0) only supports write commands",
            ],
            _ => vec!["Check protocol configuration"],
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::ExceptionResponse { exception_name, .. } => {
                format!("Modbus 예외 응답: {}", exception_name)
            }
            Self::InvalidProtocolId { protocol_id } => {
                format!("잘못된 프로토콜 식별자: {:#06x}", protocol_id)
            }
            Self::FunctionCodeMismatch { expected, actual } => {
                format!("응답 기능 코드 불일치 (예상: {:#04x}, 실제: {:#04x})", expected, actual)
            }
            Self::FrameTooShort { .. } | Self::FrameTooLong { .. } => {
                "잘못된 프레임 크기".to_string()
            }
            Self::InvalidUnitId { unit_id } => {
                format!("잘못된 유닛 ID: {}", unit_id)
            }
            Self::InvalidBroadcastFunction { .. } => {
                "브로드캐스트는 쓰기 명령에서만 사용할 수 있습니다".to_string()
            }
            Self::InvalidFunctionCode { code } => {
                format!("잘못된 기능 코드: {:#04x}", code)
            }
        }
    }
}

// =============================================================================
// TimeoutError
// =============================================================================

/// Timeout errors.
#[derive(Debug, Error)]
pub enum TimeoutError {
    /// Read operation timeout.
    #[error("Read operation timed out after {duration:?}")]
    Read {
        /// Timeout duration.
        duration: Duration,
    },

    /// Write operation timeout.
    #[error("Write operation timed out after {duration:?}")]
    Write {
        /// Timeout duration.
        duration: Duration,
    },
}

impl TimeoutError {
    /// Creates a read timeout.
    pub fn read(duration: Duration) -> Self {
        Self::Read { duration }
    }

    /// Creates a write timeout.
    pub fn write(duration: Duration) -> Self {
        Self::Write { duration }
    }

    /// Returns the timeout duration.
    pub fn duration(&self) -> Duration {
        match self {
            Self::Read { duration } | Self::Write { duration } => *duration,
        }
    }

    /// Returns the suggested retry delay.
    pub fn suggested_retry_delay(&self) -> Duration {
        self.duration().mul_f32(0.5).max(Duration::from_millis(100))
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::new(3, 1),
            Self::Write { .. } => ErrorCode::new(3, 2),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        vec![
            "Check network connectivity",
            "Increase the timeout value",
            "Reconnect before issuing further requests",
        ]
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        let duration = self.duration();
        match self {
            Self::Read { .. } => {
                format!("읽기 시간 초과 ({:.1}초)", duration.as_secs_f64())
            }
            Self::Write { .. } => {
                format!("쓰기 시간 초과 ({:.1}초)", duration.as_secs_f64())
            }
        }
    }
}

// =============================================================================
// OperationError
// =============================================================================

/// Request validation errors, detected before any I/O.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Requested quantity outside the per-function limits.
    #[error("Invalid quantity: {count} (valid: {min}-{max})")]
    InvalidQuantity {
        /// Requested count.
        count: u16,
        /// Minimum allowed.
        min: u16,
        /// Maximum allowed.
        max: u16,
    },
}

impl OperationError {
    /// Creates an invalid quantity error.
    pub fn invalid_quantity(count: u16, min: u16, max: u16) -> Self {
        Self::InvalidQuantity { count, min, max }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidQuantity { .. } => ErrorCode::new(4, 1),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        vec![
            "Split the request into smaller batches",
            "Refer to the per-function quantity limits",
        ]
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidQuantity { count, min, max } => {
                format!("요청 수량 범위 초과: {} ({}-{} 허용)", count, min, max)
            }
        }
    }
}

// =============================================================================
// ConversionError
// =============================================================================

/// Response payload conversion errors.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Not enough data in the response payload.
    #[error("Not enough data: expected {expected} bytes, got {actual}")]
    InsufficientData {
        /// Expected bytes.
        expected: usize,
        /// Actual bytes.
        actual: usize,
    },

    /// Register payload with an odd byte count.
    #[error("Odd register payload length: {count} bytes")]
    OddByteCount {
        /// The offending byte count.
        count: usize,
    },
}

impl ConversionError {
    /// Creates an insufficient data error.
    pub fn insufficient_data(expected: usize, actual: usize) -> Self {
        Self::InsufficientData { expected, actual }
    }

    /// Creates an odd byte count error.
    pub fn odd_byte_count(count: usize) -> Self {
        Self::OddByteCount { count }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InsufficientData { .. } => ErrorCode::new(5, 1),
            Self::OddByteCount { .. } => ErrorCode::new(5, 2),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        vec![
            "The device returned fewer bytes than its own byte-count field declares",
            "Check the device firmware for framing defects",
        ]
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::InsufficientData { expected, actual } => {
                format!("데이터 부족 ({}바이트 필요, {}바이트 수신)", expected, actual)
            }
            Self::OddByteCount { count } => {
                format!("잘못된 레지스터 데이터 길이: {}바이트", count)
            }
        }
    }
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Missing required field.
    #[error("Missing required configuration: {field}")]
    MissingField {
        /// The missing field.
        field: String,
    },

    /// Invalid port.
    #[error("Invalid port: {port} ({reason})")]
    InvalidPort {
        /// The invalid port.
        port: u16,
        /// Reason.
        reason: String,
    },

    /// Invalid timeout.
    #[error("Invalid timeout: {duration:?} ({reason})")]
    InvalidTimeout {
        /// The invalid duration.
        duration: Duration,
        /// Reason.
        reason: String,
    },

    /// Invalid value for a configuration field.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// The field name.
        field: String,
        /// Reason.
        reason: String,
    },
}

impl ConfigurationError {
    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid port error.
    pub fn invalid_port(port: u16, reason: impl Into<String>) -> Self {
        Self::InvalidPort {
            port,
            reason: reason.into(),
        }
    }

    /// Creates an invalid timeout error.
    pub fn invalid_timeout(duration: Duration, reason: impl Into<String>) -> Self {
        Self::InvalidTimeout {
            duration,
            reason: reason.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingField { .. } => ErrorCode::new(6, 1),
            Self::InvalidPort { .. } => ErrorCode::new(6, 2),
            Self::InvalidTimeout { .. } => ErrorCode::new(6, 3),
            Self::InvalidValue { .. } => ErrorCode::new(6, 4),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::MissingField { .. } => {
                vec!["Check the configuration for required fields"]
            }
            Self::InvalidPort { .. } => vec![
                "Standard Modbus TCP port is 502",
                "Port must be between 1 and 65535",
            ],
            Self::InvalidTimeout { .. } => {
                vec!["Timeout should be between 100ms and 30s"]
            }
            Self::InvalidValue { .. } => {
                vec!["Check the configuration value against the documented choices"]
            }
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingField { field } => {
                format!("필수 설정 누락: {}", field)
            }
            Self::InvalidPort { port, .. } => {
                format!("잘못된 포트 번호: {}", port)
            }
            Self::InvalidTimeout { duration, .. } => {
                format!("잘못된 타임아웃: {:?}", duration)
            }
            Self::InvalidValue { field, .. } => {
                format!("잘못된 설정 값: {}", field)
            }
        }
    }
}

// =============================================================================
// ErrorSeverity
// =============================================================================

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational - no action required.
    Info,
    /// Warning - action may be required.
    Warning,
    /// Error - action required, but recoverable.
    Error,
    /// Critical - immediate action required.
    Critical,
}

impl ErrorSeverity {
    /// Converts to tracing level.
    pub fn to_tracing_level(self) -> Level {
        match self {
            Self::Info => Level::INFO,
            Self::Warning => Level::WARN,
            Self::Error => Level::ERROR,
            Self::Critical => Level::ERROR,
        }
    }

    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// ErrorCode
// =============================================================================

/// Structured error code for categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// Category (1=connection, 2=protocol, 3=timeout, 4=operation, 5=conversion, 6=config).
    pub category: u8,
    /// Specific error within category.
    pub code: u8,
}

impl ErrorCode {
    /// Creates a new error code.
    pub const fn new(category: u8, code: u8) -> Self {
        Self { category, code }
    }

    /// Returns the full error code as a u16.
    pub fn as_u16(&self) -> u16 {
        ((self.category as u16) << 8) | (self.code as u16)
    }

    /// Creates from a u16.
    pub fn from_u16(value: u16) -> Self {
        Self {
            category: (value >> 8) as u8,
            code: (value & 0xFF) as u8,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MB-{:02X}{:02X}", self.category, self.code)
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// A Result type with ModbusError.
pub type ModbusResult<T> = Result<T, ModbusError>;

// =============================================================================
// Tests
// =============================================================================
