// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Qbitel FOTA Common Library
//!
//! This crate provides the error definitions, logging infrastructure and
//! shared size constants used across the Qbitel FOTA crates.
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for embedded debugging
//!
//! # Security
//!
//! No heap allocations are performed - all buffers use fixed-size arrays or
//! heapless collections.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod errors;
pub mod log;

// Re-export commonly used items
pub use errors::{Error, Result};
