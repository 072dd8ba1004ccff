// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Error types for the Qbitel FOTA stack
//!
//! This module defines the unified error type shared across the FOTA
//! crates. All errors are no_std compatible and carry no heap-allocated
//! context.

use core::fmt;

/// Result type alias for FOTA operations
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the FOTA stack
///
/// The per-crate error enums (`HalError`, `CryptoError`, `UpdateError`)
/// convert into this type at component boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Cryptographic Errors (0x01xx)
    // =========================================================================
    /// Invalid cryptographic key format or size
    InvalidKey,
    /// Signature verification failed
    InvalidSignature,
    /// Hash computation failed
    HashError,

    // =========================================================================
    // HAL Errors (0x02xx)
    // =========================================================================
    /// Hardware initialization failed
    HardwareInitFailed,
    /// Flash operation failed
    FlashError,
    /// Boot selector rejected the requested slot
    BootSelectFailed,

    // =========================================================================
    // Update Errors (0x03xx)
    // =========================================================================
    /// Another update transaction is already in progress
    UpdateInProgress,
    /// No inactive slot is available for the update
    NoUpdateSlot,
    /// Written image is malformed (inconsistent appendix)
    UpdateCorrupted,
    /// Magic marker not found in the written image
    MagicMismatch,
    /// No update transaction is currently active
    UpdateNotRunning,

    // =========================================================================
    // General Errors (0xFFxx)
    // =========================================================================
    /// Buffer is too small for operation
    BufferTooSmall,
    /// Invalid parameter provided
    InvalidParameter,
    /// Resource is busy
    Busy,
    /// Invalid state for the operation
    InvalidState,
    /// Transient buffer acquisition failed
    AllocFailure,
    /// Internal error (should not occur)
    InternalError,
}

impl Error {
    /// Get the error code for this error
    ///
    /// Error codes are organized by category:
    /// - 0x01xx: Cryptographic errors
    /// - 0x02xx: HAL errors
    /// - 0x03xx: Update errors
    /// - 0xFFxx: General errors
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            // Crypto errors (0x01xx)
            Self::InvalidKey => 0x0101,
            Self::InvalidSignature => 0x0102,
            Self::HashError => 0x0103,

            // HAL errors (0x02xx)
            Self::HardwareInitFailed => 0x0201,
            Self::FlashError => 0x0202,
            Self::BootSelectFailed => 0x0203,

            // Update errors (0x03xx)
            Self::UpdateInProgress => 0x0301,
            Self::NoUpdateSlot => 0x0302,
            Self::UpdateCorrupted => 0x0303,
            Self::MagicMismatch => 0x0304,
            Self::UpdateNotRunning => 0x0305,

            // General errors (0xFFxx)
            Self::BufferTooSmall => 0xFF01,
            Self::InvalidParameter => 0xFF02,
            Self::Busy => 0xFF03,
            Self::InvalidState => 0xFF04,
            Self::AllocFailure => 0xFF05,
            Self::InternalError => 0xFFFF,
        }
    }

    /// Check if this is a security-critical error
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidKey
                | Self::InvalidSignature
                | Self::UpdateCorrupted
                | Self::MagicMismatch
        )
    }

    /// Get a short description of the error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidKey => "invalid cryptographic key",
            Self::InvalidSignature => "signature verification failed",
            Self::HashError => "hash computation failed",
            Self::HardwareInitFailed => "hardware init failed",
            Self::FlashError => "flash error",
            Self::BootSelectFailed => "boot selector failed",
            Self::UpdateInProgress => "update in progress",
            Self::NoUpdateSlot => "no update slot available",
            Self::UpdateCorrupted => "update image corrupted",
            Self::MagicMismatch => "magic marker mismatch",
            Self::UpdateNotRunning => "no update running",
            Self::BufferTooSmall => "buffer too small",
            Self::InvalidParameter => "invalid parameter",
            Self::Busy => "busy",
            Self::InvalidState => "invalid state",
            Self::AllocFailure => "transient buffer unavailable",
            Self::InternalError => "internal error",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[0x{:04X}] {}", self.code(), self.description());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_unique() {
        let errors = [
            Error::InvalidKey,
            Error::InvalidSignature,
            Error::HashError,
            Error::HardwareInitFailed,
            Error::FlashError,
            Error::BootSelectFailed,
            Error::UpdateInProgress,
            Error::NoUpdateSlot,
            Error::UpdateCorrupted,
            Error::MagicMismatch,
            Error::UpdateNotRunning,
            Error::BufferTooSmall,
            Error::InvalidParameter,
            Error::Busy,
            Error::InvalidState,
            Error::AllocFailure,
            Error::InternalError,
        ];

        for (i, a) in errors.iter().enumerate() {
            for b in errors.iter().skip(i + 1) {
                assert_ne!(a.code(), b.code());
            }
        }
    }

    #[test]
    fn test_security_errors_flagged() {
        assert!(Error::InvalidSignature.is_security_error());
        assert!(Error::MagicMismatch.is_security_error());
        assert!(!Error::Busy.is_security_error());
        assert!(!Error::FlashError.is_security_error());
    }
}
