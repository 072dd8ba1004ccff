// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Update engine error type

use core::fmt;
use ota_hal::HalError;

/// Update engine error
///
/// Every variant is returned to the immediate caller; nothing is thrown
/// across component boundaries. Flash driver codes travel verbatim inside
/// [`UpdateError::Flash`] - the engine does not decide whether a driver
/// error is retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateError {
    /// Another update transaction is active
    Busy,
    /// No inactive slot available for the update
    NoSlot,
    /// Flash driver error, surfaced verbatim
    Flash(HalError),
    /// Appendix header inconsistent (signature length overflows the image)
    Malformed,
    /// Configured magic marker not found in the image
    MagicMismatch,
    /// Hash/signature check failed
    SignatureInvalid,
    /// Boot selector rejected the slot
    BootSelectFailed,
    /// Operation requires an active transaction
    NotRunning,
    /// Transient buffer acquisition failed
    AllocFailure,
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => f.write_str("update already in progress"),
            Self::NoSlot => f.write_str("no update slot available"),
            Self::Flash(e) => write!(f, "flash driver error: {e}"),
            Self::Malformed => f.write_str("malformed image appendix"),
            Self::MagicMismatch => f.write_str("magic marker mismatch"),
            Self::SignatureInvalid => f.write_str("firmware signature invalid"),
            Self::BootSelectFailed => f.write_str("boot selector failed"),
            Self::NotRunning => f.write_str("no update transaction running"),
            Self::AllocFailure => f.write_str("transient buffer unavailable"),
        }
    }
}

impl From<UpdateError> for ota_common::Error {
    fn from(e: UpdateError) -> Self {
        match e {
            UpdateError::Busy => Self::UpdateInProgress,
            UpdateError::NoSlot => Self::NoUpdateSlot,
            UpdateError::Flash(hal) => hal.into(),
            UpdateError::Malformed => Self::UpdateCorrupted,
            UpdateError::MagicMismatch => Self::MagicMismatch,
            UpdateError::SignatureInvalid => Self::InvalidSignature,
            UpdateError::BootSelectFailed => Self::BootSelectFailed,
            UpdateError::NotRunning => Self::UpdateNotRunning,
            UpdateError::AllocFailure => Self::AllocFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_code_travels_verbatim() {
        let err = UpdateError::Flash(HalError::FlashTimeout);
        assert_eq!(err, UpdateError::Flash(HalError::FlashTimeout));
        assert_ne!(err, UpdateError::Flash(HalError::FlashWriteFailed));
    }

    #[test]
    fn test_conversion_to_common_error() {
        let common: ota_common::Error = UpdateError::SignatureInvalid.into();
        assert_eq!(common, ota_common::Error::InvalidSignature);
        assert!(common.is_security_error());

        let common: ota_common::Error = UpdateError::Flash(HalError::FlashWriteFailed).into();
        assert_eq!(common, ota_common::Error::FlashError);
    }
}
