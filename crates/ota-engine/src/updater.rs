// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Update transaction engine
//!
//! [`FirmwareUpdater`] drives a single update transaction at a time:
//!
//! 1. [`begin`](FirmwareUpdater::begin) acquires the process-wide lock,
//!    resolves the inactive slot and opens a streaming write session
//! 2. [`write`](FirmwareUpdater::write) appends bytes as they arrive
//! 3. [`finish`](FirmwareUpdater::finish) closes the session, verifies
//!    the image appendix and commits the boot selector
//! 4. [`abort`](FirmwareUpdater::abort) tears the transaction down
//!    without touching the boot selector
//!
//! The lock is held exactly while a transaction exists and is released
//! exactly once on every terminal path. The boot selector is only ever
//! invoked after appendix verification succeeded on the same slot within
//! the same transaction.
//!
//! Between `begin` and the matching terminal call all `write`s must come
//! from one logical producer; `&mut self` enforces this per instance, and
//! the lock keeps a second instance out entirely.

use heapless::Vec;
use ota_common::constants::MAX_MAGIC_LEN;
use ota_common::log::LogBuffer;
use ota_common::{log_error, log_info, log_warn};
use ota_crypto::{HashAlgorithm, SignatureVerifier};
use ota_hal::{BootSelector, ImageSize, OtaFlash, SessionHandle, Slot};

use crate::appendix;
use crate::error::UpdateError;
use crate::lock::{LockGuard, UpdateLock};
use crate::writer::FirmwareWriter;

const MODULE: &str = "fota::updater";

/// Engine state
///
/// `Verifying`, `Committing` and `Aborting` exist only within the call
/// frame of [`FirmwareUpdater::finish`] / [`FirmwareUpdater::abort`];
/// between calls the engine is either `Idle` or `Writing`. `Faulted` is
/// transient and collapses to `Idle` once the lock is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    /// No transaction active
    Idle,
    /// Transaction open, accepting bytes
    Writing,
    /// Session closed, appendix checks running
    Verifying,
    /// Verification passed, boot selector being set
    Committing,
    /// Transaction being torn down without commit
    Aborting,
    /// A fatal error occurred; lock release pending
    Faulted,
}

struct Transaction<'l> {
    // Dropping the guard is the single release point of the
    // process-wide lock
    _guard: LockGuard<'l>,
    slot: Slot,
    session: SessionHandle,
    bytes_written: u32,
}

/// Transactional firmware updater over a dual-slot platform
///
/// `P` is the platform singleton implementing both [`OtaFlash`] and
/// [`BootSelector`]. The configured magic marker and verifier pair
/// outlive transactions; they are installed once per updater instance.
pub struct FirmwareUpdater<'v, P> {
    platform: P,
    lock: &'v UpdateLock,
    magic: Vec<u8, MAX_MAGIC_LEN>,
    hasher: Option<&'v mut dyn HashAlgorithm>,
    verifier: Option<&'v dyn SignatureVerifier>,
    txn: Option<Transaction<'v>>,
    state: UpdateState,
    log: LogBuffer,
}

impl<'v, P> FirmwareUpdater<'v, P>
where
    P: OtaFlash + BootSelector,
{
    /// Create an updater using the process-global update lock
    #[must_use]
    pub fn new(platform: P) -> Self {
        Self::with_lock(platform, UpdateLock::global())
    }

    /// Create an updater sharing an explicit update lock
    ///
    /// All updaters touching the same flash hardware must share one lock
    /// instance.
    #[must_use]
    pub fn with_lock(platform: P, lock: &'v UpdateLock) -> Self {
        Self {
            platform,
            lock,
            magic: Vec::new(),
            hasher: None,
            verifier: None,
            txn: None,
            state: UpdateState::Idle,
            log: LogBuffer::new(),
        }
    }

    /// Start an update transaction
    ///
    /// Acquires the process-wide update lock, resolves the target slot
    /// (the inactive slot when `slot` is `None`) and opens a streaming
    /// write session erased per `size`.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::Busy`] - another transaction holds the lock
    /// - [`UpdateError::NoSlot`] - no inactive slot available
    /// - [`UpdateError::Flash`] - the session could not be opened
    ///
    /// On every error the lock is released before returning.
    pub fn begin(&mut self, size: ImageSize, slot: Option<Slot>) -> Result<(), UpdateError> {
        if self.txn.is_some() {
            return Err(UpdateError::Busy);
        }
        let guard = self.lock.try_lock().ok_or(UpdateError::Busy)?;

        let Some(slot) = slot.or_else(|| self.platform.next_update_slot()) else {
            log_error!(self.log, MODULE, "no update slot available, aborting");
            return Err(UpdateError::NoSlot);
        };

        let session = match self.platform.open_session(slot, size) {
            Ok(handle) => handle,
            Err(e) => {
                log_error!(self.log, MODULE, "open session failed: {e}");
                return Err(UpdateError::Flash(e));
            }
        };

        self.txn = Some(Transaction {
            _guard: guard,
            slot,
            session,
            bytes_written: 0,
        });
        self.state = UpdateState::Writing;
        Ok(())
    }

    /// Write firmware bytes continuously to flash
    ///
    /// Called repeatedly as data is received. On success `bytes_written`
    /// advances by exactly `data.len()`.
    ///
    /// # Errors
    ///
    /// [`UpdateError::NotRunning`] without touching flash when no
    /// transaction is active. Flash driver errors are surfaced verbatim
    /// and leave the transaction in `Writing`: whether to retry the
    /// chunk, continue or abort is the caller's decision.
    pub fn write(&mut self, data: &[u8]) -> Result<(), UpdateError> {
        let Some(txn) = self.txn.as_mut() else {
            return Err(UpdateError::NotRunning);
        };

        match self.platform.write_session(txn.session, data) {
            Ok(()) => {
                txn.bytes_written += data.len() as u32;
                Ok(())
            }
            Err(e) => {
                log_warn!(self.log, MODULE, "flash write failed: {e}");
                Err(UpdateError::Flash(e))
            }
        }
    }

    /// Finish the transaction: verify the written image and commit
    ///
    /// Closes the write session, runs the appendix checks configured via
    /// [`set_magic`](FirmwareUpdater::set_magic) and
    /// [`install_verifier`](FirmwareUpdater::install_verifier), and on
    /// success points the boot selector at the update slot. The next
    /// reboot then runs the new firmware.
    ///
    /// # Errors
    ///
    /// Any failure is terminal for the transaction: the lock is released,
    /// the written image stays in the slot but is never booted, and the
    /// specific kind is returned ([`UpdateError::Malformed`],
    /// [`UpdateError::MagicMismatch`], [`UpdateError::SignatureInvalid`],
    /// [`UpdateError::BootSelectFailed`], [`UpdateError::Flash`]).
    /// [`UpdateError::NotRunning`] if no transaction is active.
    pub fn finish(&mut self) -> Result<(), UpdateError> {
        let Some(txn) = self.txn.take() else {
            return Err(UpdateError::NotRunning);
        };

        self.state = UpdateState::Verifying;
        let outcome = self.verify_and_commit(txn.slot, txn.session, txn.bytes_written);
        if outcome.is_err() {
            self.state = UpdateState::Faulted;
        }
        // Single release point: dropping the transaction frees the lock
        drop(txn);
        self.state = UpdateState::Idle;
        outcome
    }

    /// Abort a running transaction
    ///
    /// Closes the write session (close errors are logged and otherwise
    /// ignored) and releases the lock. The boot selector is never
    /// touched, so the device keeps booting the previously active slot.
    ///
    /// Returns `true` if a transaction was aborted, `false` if none was
    /// running.
    pub fn abort(&mut self) -> bool {
        let Some(txn) = self.txn.take() else {
            return false;
        };

        self.state = UpdateState::Aborting;
        if let Err(e) = self.platform.close_session(txn.session) {
            log_warn!(self.log, MODULE, "close failed during abort: {e}");
        }
        drop(txn);
        self.state = UpdateState::Idle;
        true
    }

    /// Set the magic marker expected in the firmware image
    ///
    /// The bytes are copied into updater-owned storage. An empty slice
    /// disables the check.
    ///
    /// # Errors
    ///
    /// [`UpdateError::Busy`] while a transaction is active;
    /// [`UpdateError::AllocFailure`] beyond
    /// [`MAX_MAGIC_LEN`](ota_common::constants::MAX_MAGIC_LEN) bytes.
    pub fn set_magic(&mut self, magic: &[u8]) -> Result<(), UpdateError> {
        if self.txn.is_some() {
            return Err(UpdateError::Busy);
        }
        if magic.len() > MAX_MAGIC_LEN {
            return Err(UpdateError::AllocFailure);
        }
        self.magic.clear();
        // Infallible after the length check above
        let _ = self.magic.extend_from_slice(magic);
        Ok(())
    }

    /// Install the hasher and signature verifier used by `finish`
    ///
    /// # Errors
    ///
    /// [`UpdateError::Busy`] while a transaction is active.
    pub fn install_verifier(
        &mut self,
        hasher: &'v mut dyn HashAlgorithm,
        verifier: &'v dyn SignatureVerifier,
    ) -> Result<(), UpdateError> {
        if self.txn.is_some() {
            return Err(UpdateError::Busy);
        }
        self.hasher = Some(hasher);
        self.verifier = Some(verifier);
        Ok(())
    }

    /// Advisory snapshot of the shared update lock
    ///
    /// May be stale by the time the caller acts on it.
    #[must_use]
    pub fn is_update_running(&self) -> bool {
        self.lock.is_running()
    }

    /// Current engine state
    #[must_use]
    pub fn state(&self) -> UpdateState {
        self.state
    }

    /// Slot targeted by the active transaction
    #[must_use]
    pub fn update_slot(&self) -> Option<Slot> {
        self.txn.as_ref().map(|txn| txn.slot)
    }

    /// Bytes accepted by the flash target in the active transaction
    #[must_use]
    pub fn bytes_written(&self) -> u32 {
        self.txn.as_ref().map_or(0, |txn| txn.bytes_written)
    }

    /// Diagnostic log of recent engine events
    #[must_use]
    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    /// Shared access to the underlying platform
    #[must_use]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Exclusive access to the underlying platform
    ///
    /// Intended for provisioning and tests; mutating the flash target
    /// under an active transaction is the caller's responsibility.
    #[must_use]
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    fn verify_and_commit(
        &mut self,
        slot: Slot,
        session: SessionHandle,
        bytes_written: u32,
    ) -> Result<(), UpdateError> {
        if let Err(e) = self.platform.close_session(session) {
            log_error!(self.log, MODULE, "close session failed: {e}");
            return Err(UpdateError::Flash(e));
        }

        if bytes_written == 0 {
            log_error!(self.log, MODULE, "empty image, nothing to verify");
            return Err(UpdateError::Malformed);
        }

        let magic = if self.magic.is_empty() {
            None
        } else {
            Some(self.magic.as_slice())
        };
        let result = match (&mut self.hasher, self.verifier) {
            (Some(hasher), Some(verifier)) => appendix::verify_image(
                &self.platform,
                slot,
                bytes_written,
                magic,
                Some((&mut **hasher, verifier)),
            ),
            _ => appendix::verify_image(&self.platform, slot, bytes_written, magic, None),
        };
        if let Err(e) = result {
            log_error!(self.log, MODULE, "firmware check failed: {e}");
            return Err(e);
        }

        self.state = UpdateState::Committing;
        if let Err(e) = self.platform.set_boot_slot(slot) {
            log_error!(self.log, MODULE, "boot selector failed: {e}");
            return Err(UpdateError::BootSelectFailed);
        }

        log_info!(
            self.log,
            MODULE,
            "firmware update finished, image size {bytes_written} bytes"
        );
        Ok(())
    }
}

impl<P> FirmwareWriter for FirmwareUpdater<'_, P>
where
    P: OtaFlash + BootSelector,
{
    fn write_firmware_bytes(&mut self, data: &[u8]) -> Result<(), UpdateError> {
        self.write(data)
    }
}

/// Point the boot selector at the inactive slot without a transaction
///
/// Activates a pre-installed image: acquires the update lock for the
/// duration of the call, resolves the inactive slot and selects it for
/// the next boot. No verification is performed; the caller accepts
/// responsibility for the slot contents.
///
/// # Errors
///
/// - [`UpdateError::Busy`] - an update transaction holds the lock
/// - [`UpdateError::NoSlot`] - no inactive slot available
/// - [`UpdateError::BootSelectFailed`] - the selector rejected the slot
pub fn activate_next_slot<P>(platform: &mut P, lock: &UpdateLock) -> Result<(), UpdateError>
where
    P: OtaFlash + BootSelector,
{
    let _guard = lock.try_lock().ok_or(UpdateError::Busy)?;

    let slot = platform.next_update_slot().ok_or(UpdateError::NoSlot)?;
    platform
        .set_boot_slot(slot)
        .map_err(|_| UpdateError::BootSelectFailed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ota_hal::mem::MemFlash;
    use ota_hal::HalError;

    type TestUpdater<'v> = FirmwareUpdater<'v, MemFlash<1024>>;

    #[test]
    fn test_begin_holds_lock_until_terminal_call() {
        let lock = UpdateLock::new();
        let mut updater = TestUpdater::with_lock(MemFlash::new(), &lock);

        assert!(!updater.is_update_running());
        updater.begin(ImageSize::Unknown, None).unwrap();
        assert!(updater.is_update_running());
        assert_eq!(updater.state(), UpdateState::Writing);
        assert_eq!(updater.update_slot(), Some(Slot::B));

        assert!(updater.abort());
        assert!(!updater.is_update_running());
        assert_eq!(updater.state(), UpdateState::Idle);
    }

    #[test]
    fn test_begin_no_slot_releases_lock() {
        let lock = UpdateLock::new();
        let mut flash = MemFlash::new();
        flash.pretend_single_bank(true);
        let mut updater = TestUpdater::with_lock(flash, &lock);

        assert_eq!(
            updater.begin(ImageSize::Unknown, None),
            Err(UpdateError::NoSlot)
        );
        assert!(!lock.is_running());
    }

    #[test]
    fn test_begin_open_failure_releases_lock() {
        let lock = UpdateLock::new();
        let mut flash = MemFlash::new();
        flash.fail_next_open(HalError::FlashEraseFailed);
        let mut updater = TestUpdater::with_lock(flash, &lock);

        assert_eq!(
            updater.begin(ImageSize::Unknown, None),
            Err(UpdateError::Flash(HalError::FlashEraseFailed))
        );
        assert!(!lock.is_running());
        assert_eq!(updater.state(), UpdateState::Idle);
    }

    #[test]
    fn test_write_without_transaction() {
        let lock = UpdateLock::new();
        let mut updater = TestUpdater::with_lock(MemFlash::new(), &lock);

        assert_eq!(updater.write(&[1, 2, 3]), Err(UpdateError::NotRunning));
        assert_eq!(updater.bytes_written(), 0);
    }

    #[test]
    fn test_write_tracks_accepted_bytes_only() {
        let lock = UpdateLock::new();
        let mut updater = TestUpdater::with_lock(MemFlash::new(), &lock);
        updater.begin(ImageSize::Unknown, None).unwrap();

        updater.write(&[0xAB; 100]).unwrap();
        assert_eq!(updater.bytes_written(), 100);

        updater.platform_mut().fail_next_write(HalError::FlashTimeout);
        assert_eq!(
            updater.write(&[0xAB; 50]),
            Err(UpdateError::Flash(HalError::FlashTimeout))
        );
        // Failed chunk not counted; transaction still writable
        assert_eq!(updater.bytes_written(), 100);
        assert_eq!(updater.state(), UpdateState::Writing);

        updater.write(&[0xAB; 50]).unwrap();
        assert_eq!(updater.bytes_written(), 150);
    }

    #[test]
    fn test_finish_without_transaction() {
        let lock = UpdateLock::new();
        let mut updater = TestUpdater::with_lock(MemFlash::new(), &lock);
        assert_eq!(updater.finish(), Err(UpdateError::NotRunning));
    }

    #[test]
    fn test_finish_empty_image_fails() {
        let lock = UpdateLock::new();
        let mut updater = TestUpdater::with_lock(MemFlash::new(), &lock);
        updater.begin(ImageSize::Unknown, None).unwrap();

        assert_eq!(updater.finish(), Err(UpdateError::Malformed));
        assert!(!lock.is_running());
        assert_eq!(updater.platform().set_boot_calls(), 0);
    }

    #[test]
    fn test_finish_close_failure_releases_lock() {
        let lock = UpdateLock::new();
        let mut updater = TestUpdater::with_lock(MemFlash::new(), &lock);
        updater.begin(ImageSize::Unknown, None).unwrap();
        updater.write(&[0x01; 64]).unwrap();

        updater.platform_mut().fail_next_close(HalError::FlashError);
        assert_eq!(
            updater.finish(),
            Err(UpdateError::Flash(HalError::FlashError))
        );
        assert!(!lock.is_running());
        assert_eq!(updater.platform().set_boot_calls(), 0);
    }

    #[test]
    fn test_config_mutators_rejected_mid_transaction() {
        let lock = UpdateLock::new();
        let mut updater = TestUpdater::with_lock(MemFlash::new(), &lock);
        updater.begin(ImageSize::Unknown, None).unwrap();

        assert_eq!(updater.set_magic(b"IDFIX"), Err(UpdateError::Busy));

        assert!(updater.abort());
        updater.set_magic(b"IDFIX").unwrap();
    }

    #[test]
    fn test_set_magic_bounds() {
        let lock = UpdateLock::new();
        let mut updater = TestUpdater::with_lock(MemFlash::new(), &lock);

        assert_eq!(
            updater.set_magic(&[0u8; MAX_MAGIC_LEN + 1]),
            Err(UpdateError::AllocFailure)
        );
        updater.set_magic(&[0u8; MAX_MAGIC_LEN]).unwrap();
    }

    #[test]
    fn test_explicit_slot_overrides_resolution() {
        let lock = UpdateLock::new();
        let mut updater = TestUpdater::with_lock(MemFlash::new(), &lock);

        updater.begin(ImageSize::Unknown, Some(Slot::A)).unwrap();
        assert_eq!(updater.update_slot(), Some(Slot::A));
        assert!(updater.abort());
    }

    #[test]
    fn test_activate_next_slot() {
        let lock = UpdateLock::new();
        let mut flash = MemFlash::<1024>::new();

        activate_next_slot(&mut flash, &lock).unwrap();
        assert_eq!(flash.boot_slot(), Slot::B);
        assert!(!lock.is_running());
    }

    #[test]
    fn test_activate_next_slot_busy_when_locked() {
        let lock = UpdateLock::new();
        let mut flash = MemFlash::<1024>::new();

        let _guard = lock.try_lock().unwrap();
        assert_eq!(
            activate_next_slot(&mut flash, &lock),
            Err(UpdateError::Busy)
        );
        assert_eq!(flash.set_boot_calls(), 0);
    }

    #[test]
    fn test_activate_next_slot_selector_failure_releases_lock() {
        let lock = UpdateLock::new();
        let mut flash = MemFlash::<1024>::new();
        flash.fail_next_set_boot(HalError::BootSelectFailed);

        assert_eq!(
            activate_next_slot(&mut flash, &lock),
            Err(UpdateError::BootSelectFailed)
        );
        assert!(!lock.is_running());
    }

    #[test]
    fn test_abort_logs_close_failure() {
        let lock = UpdateLock::new();
        let mut updater = TestUpdater::with_lock(MemFlash::new(), &lock);
        updater.begin(ImageSize::Unknown, None).unwrap();
        updater.write(&[1]).unwrap();

        updater.platform_mut().fail_next_close(HalError::FlashError);
        assert!(updater.abort());
        assert!(!lock.is_running());

        let entry = updater.log().last().unwrap();
        assert_eq!(entry.level, ota_common::log::LogLevel::Warn);
    }
}
