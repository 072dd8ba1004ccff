// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Size constants shared across the FOTA stack
//!
//! These bound the fixed-capacity buffers used on constrained devices.
//! The chunk sizes are tuning knobs for small-RAM targets, not part of any
//! wire or storage contract.

/// Maximum length of the configured magic marker in bytes
pub const MAX_MAGIC_LEN: usize = 32;

/// Maximum length of a detached image signature in bytes
///
/// Covers Ed25519 (64) and RSA up to 4096 bit (512).
pub const MAX_SIGNATURE_LEN: usize = 512;

/// Maximum digest length produced by a supported hash algorithm in bytes
pub const MAX_DIGEST_LEN: usize = 64;

/// Size of the little-endian signature length field at the image tail
pub const SIGNATURE_LEN_FIELD: usize = 4;

/// Read chunk size used while hashing an image back from flash
pub const HASH_CHUNK_SIZE: usize = 256;
