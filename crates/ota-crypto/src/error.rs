// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Crypto error types

use core::fmt;

/// Crypto error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// Key bytes are not a valid key for the algorithm
    InvalidKey,
    /// Signature bytes are not a valid signature encoding
    InvalidSignature,
    /// Digest length does not match the algorithm output
    InvalidDigestLength,
}

impl CryptoError {
    /// Get error description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidKey => "invalid key",
            Self::InvalidSignature => "invalid signature encoding",
            Self::InvalidDigestLength => "invalid digest length",
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<CryptoError> for ota_common::Error {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidKey => Self::InvalidKey,
            CryptoError::InvalidSignature => Self::InvalidSignature,
            CryptoError::InvalidDigestLength => Self::HashError,
        }
    }
}
