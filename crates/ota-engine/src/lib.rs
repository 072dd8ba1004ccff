// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Qbitel FOTA Update Engine
//!
//! Transactional firmware-over-the-air updates for dual-slot devices:
//!
//! - **Update transaction engine**: exclusive acquisition of the update
//!   capability, streamed writes into the inactive slot, verification,
//!   atomic boot-selector commit ([`FirmwareUpdater`])
//! - **Appendix verification**: magic marker and detached signature
//!   parsed from the tail of the written image ([`appendix`])
//! - **Byte sink**: the narrow surface downloaders push bytes through
//!   ([`FirmwareWriter`])
//! - **Mutual exclusion**: a process-wide lock guaranteeing at most one
//!   transaction at any instant ([`UpdateLock`])
//!
//! # Update Flow
//!
//! ```text
//! begin ──▶ write* ──▶ finish ──▶ verify appendix ──▶ set boot slot
//!   │                    │             │                  │
//!   └── busy/no slot     └── close     └── image left     └── next boot
//!       lock released        errors        on flash,          runs the
//!                            fail          never booted        new slot
//! ```
//!
//! The boot selector is only ever touched after the appendix checks pass,
//! so a power cut at any earlier point leaves the previous firmware
//! bootable. That is the whole recovery story; there is no mid-write
//! repair logic.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod appendix;
pub mod error;
pub mod lock;
pub mod updater;
pub mod writer;

pub use appendix::verify_image;
pub use error::UpdateError;
pub use lock::{LockGuard, UpdateLock};
pub use updater::{activate_next_slot, FirmwareUpdater, UpdateState};
pub use writer::FirmwareWriter;
