// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! HAL error types

use core::fmt;

/// HAL error type
///
/// Returned verbatim by the flash and boot-selector drivers. The update
/// engine surfaces these codes to its caller without reinterpreting them;
/// whether a flash write error is retryable is a driver property the
/// engine does not second-guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Hardware not initialized
    NotInitialized,
    /// Flash operation failed
    FlashError,
    /// Flash address or length out of bounds
    FlashOutOfBounds,
    /// Flash erase failed
    FlashEraseFailed,
    /// Flash write failed
    FlashWriteFailed,
    /// Flash read failed
    FlashReadFailed,
    /// Flash operation timeout
    FlashTimeout,
    /// Write session handle is unknown or already closed
    InvalidSession,
    /// A write session is already open on this target
    SessionInUse,
    /// Boot selector rejected the slot
    BootSelectFailed,
    /// Invalid parameter
    InvalidParameter,
    /// Operation not supported by this platform
    NotSupported,
}

impl HalError {
    /// Get error code
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::NotInitialized => 0x0801,
            Self::FlashError => 0x0810,
            Self::FlashOutOfBounds => 0x0811,
            Self::FlashEraseFailed => 0x0812,
            Self::FlashWriteFailed => 0x0813,
            Self::FlashReadFailed => 0x0814,
            Self::FlashTimeout => 0x0815,
            Self::InvalidSession => 0x0820,
            Self::SessionInUse => 0x0821,
            Self::BootSelectFailed => 0x0830,
            Self::InvalidParameter => 0x08F0,
            Self::NotSupported => 0x08FF,
        }
    }

    /// Get error description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not initialized",
            Self::FlashError => "flash error",
            Self::FlashOutOfBounds => "flash address out of bounds",
            Self::FlashEraseFailed => "flash erase failed",
            Self::FlashWriteFailed => "flash write failed",
            Self::FlashReadFailed => "flash read failed",
            Self::FlashTimeout => "flash operation timeout",
            Self::InvalidSession => "invalid write session",
            Self::SessionInUse => "write session already open",
            Self::BootSelectFailed => "boot selector failed",
            Self::InvalidParameter => "invalid parameter",
            Self::NotSupported => "not supported",
        }
    }
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

impl From<HalError> for ota_common::Error {
    fn from(e: HalError) -> Self {
        match e {
            HalError::NotInitialized => Self::HardwareInitFailed,
            HalError::FlashError
            | HalError::FlashOutOfBounds
            | HalError::FlashEraseFailed
            | HalError::FlashWriteFailed
            | HalError::FlashReadFailed
            | HalError::FlashTimeout => Self::FlashError,
            HalError::InvalidSession | HalError::SessionInUse => Self::InvalidState,
            HalError::BootSelectFailed => Self::BootSelectFailed,
            HalError::InvalidParameter => Self::InvalidParameter,
            HalError::NotSupported => Self::InternalError,
        }
    }
}

/// HAL Result type
pub type HalResult<T> = Result<T, HalError>;
