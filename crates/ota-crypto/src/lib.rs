// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Cryptographic primitives for Qbitel FOTA
//!
//! This crate provides the two surfaces the update engine verifies images
//! with:
//!
//! - **[`HashAlgorithm`]**: a streaming digest
//!   (`begin -> add_data* -> end -> digest`)
//! - **[`SignatureVerifier`]**: checks a detached signature over a digest
//!
//! Both traits are object safe, so an updater can hold whichever
//! algorithm the operator installed without being generic over it.
//! Concrete implementations cover the SHA3 family and Ed25519.
//!
//! # Security
//!
//! Comparisons that gate authenticity decisions go through
//! [`constant_time_eq`].

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod ed25519;
pub mod error;
pub mod hash;
pub mod traits;

// Re-export commonly used items
pub use ed25519::Ed25519Verifier;
pub use error::CryptoError;
pub use hash::{Sha3_256Hasher, Sha3_512Hasher};
pub use traits::{constant_time_eq, HashAlgorithm, SignatureVerifier};
