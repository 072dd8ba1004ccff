// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Image appendix verification
//!
//! A firmware image carries its authenticity data in an appendix at the
//! tail, written by the build pipeline. Walking backward from the end:
//!
//! ```text
//! ┌──────────────────────────┬───────────┬───────────────┬────────────┐
//! │ body                     │ magic     │ signature     │ sig length │
//! │ (hashed, includes magic) │ (M bytes) │ (L bytes)     │ (4, LE)    │
//! └──────────────────────────┴───────────┴───────────────┴────────────┘
//! ```
//!
//! The hashed body spans offsets `0 .. image_len - L - 4`, which includes
//! the magic bytes. Existing signed images are produced this way, so it
//! is kept as a compatibility constraint.
//!
//! Verification only reads the slot; it never writes. Both checks are
//! optional and independently configured - an image with neither magic
//! nor verifier configured passes trivially (the unsigned-update case;
//! operators who care about integrity configure at least one).

use ota_common::constants::{
    HASH_CHUNK_SIZE, MAX_MAGIC_LEN, MAX_SIGNATURE_LEN, SIGNATURE_LEN_FIELD,
};
use ota_crypto::{constant_time_eq, HashAlgorithm, SignatureVerifier};
use ota_hal::{OtaFlash, Slot};

use crate::error::UpdateError;

/// Parsed offsets of an image appendix
///
/// All offsets are logical, relative to the slot base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendixLayout {
    /// Length of the detached signature in bytes
    pub signature_len: u32,
    /// Length of the hashed body; also the offset of the signature
    pub body_len: u32,
    /// Offset of the magic marker
    pub magic_offset: u32,
}

/// Read and bound-check the appendix of a written image
///
/// # Errors
///
/// [`UpdateError::Malformed`] when the image is shorter than the length
/// field or the claimed appendix overflows the image;
/// [`UpdateError::Flash`] on read failure.
pub fn parse_layout<F: OtaFlash>(
    flash: &F,
    slot: Slot,
    image_len: u32,
    magic_len: u32,
) -> Result<AppendixLayout, UpdateError> {
    if image_len < SIGNATURE_LEN_FIELD as u32 {
        return Err(UpdateError::Malformed);
    }

    let mut len_bytes = [0u8; SIGNATURE_LEN_FIELD];
    flash
        .read(slot, image_len - SIGNATURE_LEN_FIELD as u32, &mut len_bytes)
        .map_err(UpdateError::Flash)?;
    let signature_len = u32::from_le_bytes(len_bytes);

    // Widened so a hostile length field cannot wrap the bound check
    let appendix =
        u64::from(signature_len) + u64::from(magic_len) + SIGNATURE_LEN_FIELD as u64;
    if appendix > u64::from(image_len) {
        return Err(UpdateError::Malformed);
    }

    Ok(AppendixLayout {
        signature_len,
        body_len: image_len - signature_len - SIGNATURE_LEN_FIELD as u32,
        magic_offset: (u64::from(image_len) - appendix) as u32,
    })
}

/// Verify the appendix of a completed image
///
/// Runs the configured subset of checks against the written slot:
/// magic marker comparison and/or detached signature verification over
/// the body. With neither configured the image passes without any read.
///
/// # Errors
///
/// - [`UpdateError::Malformed`] - appendix inconsistent with `image_len`
/// - [`UpdateError::MagicMismatch`] - marker absent or different
/// - [`UpdateError::SignatureInvalid`] - hash/signature check failed
/// - [`UpdateError::AllocFailure`] - marker or signature exceeds the
///   fixed read-back buffers
/// - [`UpdateError::Flash`] - read error, driver code verbatim
pub fn verify_image<F: OtaFlash>(
    flash: &F,
    slot: Slot,
    image_len: u32,
    magic: Option<&[u8]>,
    verifier: Option<(&mut dyn HashAlgorithm, &dyn SignatureVerifier)>,
) -> Result<(), UpdateError> {
    if magic.is_none() && verifier.is_none() {
        return Ok(());
    }

    let magic_len = magic.map_or(0, |m| m.len() as u32);
    let layout = parse_layout(flash, slot, image_len, magic_len)?;

    if let Some(expected) = magic {
        check_magic(flash, slot, layout.magic_offset, expected)?;
    }

    if let Some((hasher, signature_verifier)) = verifier {
        check_signature(flash, slot, &layout, hasher, signature_verifier)?;
    }

    Ok(())
}

fn check_magic<F: OtaFlash>(
    flash: &F,
    slot: Slot,
    offset: u32,
    expected: &[u8],
) -> Result<(), UpdateError> {
    if expected.is_empty() || expected.len() > MAX_MAGIC_LEN {
        return Err(UpdateError::AllocFailure);
    }

    let mut buffer = [0u8; MAX_MAGIC_LEN];
    let read_back = &mut buffer[..expected.len()];
    flash.read(slot, offset, read_back).map_err(UpdateError::Flash)?;

    if !constant_time_eq(read_back, expected) {
        return Err(UpdateError::MagicMismatch);
    }
    Ok(())
}

fn check_signature<F: OtaFlash>(
    flash: &F,
    slot: Slot,
    layout: &AppendixLayout,
    hasher: &mut dyn HashAlgorithm,
    verifier: &dyn SignatureVerifier,
) -> Result<(), UpdateError> {
    if layout.signature_len == 0 {
        return Err(UpdateError::SignatureInvalid);
    }
    if layout.signature_len as usize > MAX_SIGNATURE_LEN {
        return Err(UpdateError::AllocFailure);
    }

    hasher.begin();

    let mut chunk = [0u8; HASH_CHUNK_SIZE];
    let mut offset = 0u32;
    let mut remaining = layout.body_len;
    while remaining > 0 {
        let take = remaining.min(HASH_CHUNK_SIZE as u32) as usize;
        if let Err(e) = flash.read(slot, offset, &mut chunk[..take]) {
            // Leave the hasher reusable for the next attempt
            hasher.end();
            return Err(UpdateError::Flash(e));
        }
        hasher.add_data(&chunk[..take]);
        offset += take as u32;
        remaining -= take as u32;
    }

    hasher.end();

    let mut signature: heapless::Vec<u8, MAX_SIGNATURE_LEN> = heapless::Vec::new();
    signature
        .resize(layout.signature_len as usize, 0)
        .map_err(|()| UpdateError::AllocFailure)?;
    flash
        .read(slot, layout.body_len, &mut signature[..])
        .map_err(UpdateError::Flash)?;

    if !verifier.verify(hasher.digest(), &signature[..]) {
        return Err(UpdateError::SignatureInvalid);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ota_hal::mem::MemFlash;
    use ota_hal::{HalError, ImageSize};

    fn load_image(flash: &mut MemFlash<4096>, image: &[u8]) {
        let handle = flash.open_session(Slot::B, ImageSize::Unknown).unwrap();
        flash.write_session(handle, image).unwrap();
        flash.close_session(handle).unwrap();
    }

    #[test]
    fn test_parse_layout() {
        let mut flash = MemFlash::<4096>::new();
        let mut image = heapless::Vec::<u8, 128>::new();
        image.extend_from_slice(&[0xAA; 100]).unwrap(); // body
        image.extend_from_slice(b"MAGIC").unwrap();
        image.extend_from_slice(&[0xBB; 16]).unwrap(); // signature
        image.extend_from_slice(&16u32.to_le_bytes()).unwrap();
        load_image(&mut flash, &image);

        let layout = parse_layout(&flash, Slot::B, image.len() as u32, 5).unwrap();
        assert_eq!(layout.signature_len, 16);
        assert_eq!(layout.body_len, 105); // body + magic
        assert_eq!(layout.magic_offset, 100);
    }

    #[test]
    fn test_parse_rejects_short_image() {
        let mut flash = MemFlash::<4096>::new();
        load_image(&mut flash, &[1, 2, 3]);
        assert_eq!(
            parse_layout(&flash, Slot::B, 3, 0),
            Err(UpdateError::Malformed)
        );
    }

    #[test]
    fn test_parse_rejects_hostile_length() {
        let mut flash = MemFlash::<4096>::new();
        let mut image = [0u8; 10];
        image[6..].copy_from_slice(&1_000_000u32.to_le_bytes());
        load_image(&mut flash, &image);

        assert_eq!(
            parse_layout(&flash, Slot::B, 10, 0),
            Err(UpdateError::Malformed)
        );
    }

    #[test]
    fn test_parse_rejects_max_length_field() {
        let mut flash = MemFlash::<4096>::new();
        let mut image = [0u8; 8];
        image[4..].copy_from_slice(&u32::MAX.to_le_bytes());
        load_image(&mut flash, &image);

        // u32::MAX + magic + 4 must not wrap into acceptance
        assert_eq!(
            parse_layout(&flash, Slot::B, 8, 16),
            Err(UpdateError::Malformed)
        );
    }

    #[test]
    fn test_unconfigured_verification_passes_without_reads() {
        let mut flash = MemFlash::<4096>::new();
        load_image(&mut flash, &[0x5A; 64]);
        flash.fail_next_read(HalError::FlashReadFailed);

        // No magic, no verifier: trivial success, flash never read
        assert_eq!(verify_image(&flash, Slot::B, 64, None, None), Ok(()));
    }

    #[test]
    fn test_magic_match_and_mismatch() {
        let mut flash = MemFlash::<4096>::new();
        let mut image = heapless::Vec::<u8, 64>::new();
        image.extend_from_slice(&[0x11; 20]).unwrap();
        image.extend_from_slice(b"IDFIX").unwrap();
        image.extend_from_slice(&0u32.to_le_bytes()).unwrap();
        load_image(&mut flash, &image);

        let len = image.len() as u32;
        assert_eq!(verify_image(&flash, Slot::B, len, Some(b"IDFIX"), None), Ok(()));
        assert_eq!(
            verify_image(&flash, Slot::B, len, Some(b"WRONG"), None),
            Err(UpdateError::MagicMismatch)
        );
    }

    #[test]
    fn test_read_error_surfaces_verbatim() {
        let mut flash = MemFlash::<4096>::new();
        let mut image = heapless::Vec::<u8, 64>::new();
        image.extend_from_slice(&[0x11; 20]).unwrap();
        image.extend_from_slice(b"IDFIX").unwrap();
        image.extend_from_slice(&0u32.to_le_bytes()).unwrap();
        load_image(&mut flash, &image);

        flash.fail_next_read(HalError::FlashTimeout);
        assert_eq!(
            verify_image(&flash, Slot::B, image.len() as u32, Some(b"IDFIX"), None),
            Err(UpdateError::Flash(HalError::FlashTimeout))
        );
    }

    #[test]
    fn test_oversized_signature_is_alloc_failure() {
        let mut flash = MemFlash::<4096>::new();
        let sig_len = (MAX_SIGNATURE_LEN + 1) as u32;
        let image_len = 2048u32;
        let mut image = heapless::Vec::<u8, 2048>::new();
        image.resize(image_len as usize - 4, 0).unwrap();
        image.extend_from_slice(&sig_len.to_le_bytes()).unwrap();
        load_image(&mut flash, &image);

        struct NeverVerifier;
        impl SignatureVerifier for NeverVerifier {
            fn verify(&self, _digest: &[u8], _signature: &[u8]) -> bool {
                false
            }
        }
        let mut hasher = ota_crypto::Sha3_256Hasher::new();

        assert_eq!(
            verify_image(
                &flash,
                Slot::B,
                image_len,
                None,
                Some((&mut hasher, &NeverVerifier))
            ),
            Err(UpdateError::AllocFailure)
        );
    }

    #[test]
    fn test_zero_signature_length_rejected() {
        let mut flash = MemFlash::<4096>::new();
        let mut image = heapless::Vec::<u8, 64>::new();
        image.extend_from_slice(&[0x22; 32]).unwrap();
        image.extend_from_slice(&0u32.to_le_bytes()).unwrap();
        load_image(&mut flash, &image);

        struct AlwaysVerifier;
        impl SignatureVerifier for AlwaysVerifier {
            fn verify(&self, _digest: &[u8], _signature: &[u8]) -> bool {
                true
            }
        }
        let mut hasher = ota_crypto::Sha3_256Hasher::new();

        assert_eq!(
            verify_image(
                &flash,
                Slot::B,
                image.len() as u32,
                None,
                Some((&mut hasher, &AlwaysVerifier))
            ),
            Err(UpdateError::SignatureInvalid)
        );
    }
}
