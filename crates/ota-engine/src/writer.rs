// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Firmware byte sink
//!
//! The narrow surface a download source pushes firmware bytes through.
//! Downloaders (HTTP, serial, BLE, test drivers) hold this trait and stay
//! ignorant of slots, sessions and verification; the updater behind it
//! decides where the bytes land.

use crate::error::UpdateError;

/// Byte sink for an active update transaction
pub trait FirmwareWriter {
    /// Write firmware bytes continuously to flash
    ///
    /// Called repeatedly as data arrives; the bytes are appended
    /// sequentially to the image being staged.
    ///
    /// # Errors
    ///
    /// [`UpdateError::NotRunning`] when no transaction is active, or the
    /// flash driver code verbatim. A driver error leaves the transaction
    /// open so the caller may retry, continue or abort.
    fn write_firmware_bytes(&mut self, data: &[u8]) -> Result<(), UpdateError>;
}
