// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! In-memory OTA flash double
//!
//! [`MemFlash`] implements [`OtaFlash`] and [`BootSelector`] over two
//! RAM-backed banks. It serves as the host-side test double for the
//! update engine and as the flash target of the simulation platform.
//!
//! Fault injection is one-shot: each `fail_next_*` arms exactly one
//! failure, which lets tests exercise the retry path (first write fails,
//! second succeeds) without driver-specific behavior.

use core::cell::Cell;

use crate::error::{HalError, HalResult};
use crate::traits::{BootSelector, ImageSize, OtaFlash, SessionHandle, Slot};

/// Erased flash reads back as all ones
const ERASED: u8 = 0xFF;

struct OpenSession {
    handle: SessionHandle,
    slot: Slot,
    cursor: u32,
}

/// RAM-backed dual-slot flash with a built-in boot selector
///
/// `N` is the capacity of each bank in bytes.
pub struct MemFlash<const N: usize> {
    banks: [[u8; N]; 2],
    booted: Slot,
    selected: Slot,
    session: Option<OpenSession>,
    next_handle: u32,
    no_update_slot: bool,
    set_boot_calls: u32,
    fail_open: Option<HalError>,
    fail_write: Option<HalError>,
    // Cell because reads take &self
    fail_read: Cell<Option<HalError>>,
    fail_close: Option<HalError>,
    fail_set_boot: Option<HalError>,
}

impl<const N: usize> MemFlash<N> {
    /// Create a fully erased device, booted from slot A
    #[must_use]
    pub const fn new() -> Self {
        Self {
            banks: [[ERASED; N]; 2],
            booted: Slot::A,
            selected: Slot::A,
            session: None,
            next_handle: 1,
            no_update_slot: false,
            set_boot_calls: 0,
            fail_open: None,
            fail_write: None,
            fail_read: Cell::new(None),
            fail_close: None,
            fail_set_boot: None,
        }
    }

    /// Capacity of each bank in bytes
    #[must_use]
    pub const fn bank_size(&self) -> usize {
        N
    }

    /// Get the slot currently executing
    #[must_use]
    pub const fn booted_slot(&self) -> Slot {
        self.booted
    }

    /// Pretend the device booted from `slot`
    pub fn set_booted_slot(&mut self, slot: Slot) {
        self.booted = slot;
    }

    /// Raw contents of a bank
    #[must_use]
    pub fn slot_data(&self, slot: Slot) -> &[u8] {
        &self.banks[slot.index()]
    }

    /// Number of times the boot selector was invoked
    #[must_use]
    pub const fn set_boot_calls(&self) -> u32 {
        self.set_boot_calls
    }

    /// Make the next [`OtaFlash::next_update_slot`] return `None`
    pub fn pretend_single_bank(&mut self, enabled: bool) {
        self.no_update_slot = enabled;
    }

    /// Arm a one-shot failure for the next `open_session`
    pub fn fail_next_open(&mut self, err: HalError) {
        self.fail_open = Some(err);
    }

    /// Arm a one-shot failure for the next `write_session`
    pub fn fail_next_write(&mut self, err: HalError) {
        self.fail_write = Some(err);
    }

    /// Arm a one-shot failure for the next `read`
    pub fn fail_next_read(&mut self, err: HalError) {
        self.fail_read.set(Some(err));
    }

    /// Arm a one-shot failure for the next `close_session`
    pub fn fail_next_close(&mut self, err: HalError) {
        self.fail_close = Some(err);
    }

    /// Arm a one-shot failure for the next `set_boot_slot`
    pub fn fail_next_set_boot(&mut self, err: HalError) {
        self.fail_set_boot = Some(err);
    }
}

impl<const N: usize> Default for MemFlash<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> OtaFlash for MemFlash<N> {
    fn next_update_slot(&self) -> Option<Slot> {
        if self.no_update_slot {
            return None;
        }
        Some(self.booted.other())
    }

    fn open_session(&mut self, slot: Slot, size: ImageSize) -> HalResult<SessionHandle> {
        if let Some(e) = self.fail_open.take() {
            return Err(e);
        }
        if self.session.is_some() {
            return Err(HalError::SessionInUse);
        }

        let erase_len = match size {
            ImageSize::Unknown => N,
            ImageSize::Bytes(n) => {
                if n as usize > N {
                    return Err(HalError::FlashOutOfBounds);
                }
                n as usize
            }
        };
        self.banks[slot.index()][..erase_len].fill(ERASED);

        let handle = SessionHandle::from_raw(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.session = Some(OpenSession {
            handle,
            slot,
            cursor: 0,
        });
        Ok(handle)
    }

    fn write_session(&mut self, handle: SessionHandle, data: &[u8]) -> HalResult<()> {
        if let Some(e) = self.fail_write.take() {
            return Err(e);
        }

        let session = self.session.as_mut().ok_or(HalError::InvalidSession)?;
        if session.handle != handle {
            return Err(HalError::InvalidSession);
        }

        let start = session.cursor as usize;
        let end = start
            .checked_add(data.len())
            .ok_or(HalError::FlashOutOfBounds)?;
        if end > N {
            return Err(HalError::FlashOutOfBounds);
        }

        self.banks[session.slot.index()][start..end].copy_from_slice(data);
        session.cursor = end as u32;
        Ok(())
    }

    fn close_session(&mut self, handle: SessionHandle) -> HalResult<()> {
        let session = self.session.take().ok_or(HalError::InvalidSession)?;
        if session.handle != handle {
            return Err(HalError::InvalidSession);
        }
        if let Some(e) = self.fail_close.take() {
            return Err(e);
        }
        Ok(())
    }

    fn read(&self, slot: Slot, offset: u32, buffer: &mut [u8]) -> HalResult<()> {
        if let Some(e) = self.fail_read.take() {
            return Err(e);
        }

        let start = offset as usize;
        let end = start
            .checked_add(buffer.len())
            .ok_or(HalError::FlashOutOfBounds)?;
        if end > N {
            return Err(HalError::FlashOutOfBounds);
        }

        buffer.copy_from_slice(&self.banks[slot.index()][start..end]);
        Ok(())
    }
}

impl<const N: usize> BootSelector for MemFlash<N> {
    fn set_boot_slot(&mut self, slot: Slot) -> HalResult<()> {
        if let Some(e) = self.fail_set_boot.take() {
            return Err(e);
        }
        self.set_boot_calls += 1;
        self.selected = slot;
        Ok(())
    }

    fn boot_slot(&self) -> Slot {
        self.selected
    }
}
