// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # relay-tests
//!
//! Integration tests and shared test infrastructure for `relay-modbus`.
//!
//! The `common` module provides scripted transports, a loopback mock
//! server and canned frame fixtures; the `tests/` directory holds the
//! integration suites built on top of them.

pub mod common;
