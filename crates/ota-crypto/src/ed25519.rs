// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Ed25519 signature verification
//!
//! Wraps ed25519-dalek behind [`SignatureVerifier`]. The signing side
//! lives in the build pipeline; the device only ever holds the public
//! key.

use crate::error::CryptoError;
use crate::traits::SignatureVerifier;
use ed25519_dalek::{Signature, VerifyingKey};

/// Ed25519 public key length in bytes
pub const PUBLIC_KEY_LEN: usize = 32;

/// Ed25519 signature length in bytes
pub const SIGNATURE_LEN: usize = 64;

/// Ed25519 detached signature verifier
pub struct Ed25519Verifier {
    key: VerifyingKey,
}

impl Ed25519Verifier {
    /// Create a verifier from raw public key bytes
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKey`] if the bytes are not a valid
    /// curve point.
    pub fn from_public_key_bytes(bytes: &[u8; PUBLIC_KEY_LEN]) -> Result<Self, CryptoError> {
        let key = VerifyingKey::from_bytes(bytes).map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self { key })
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, digest: &[u8], signature: &[u8]) -> bool {
        let Ok(sig) = Signature::from_slice(signature) else {
            return false;
        };
        self.key.verify_strict(digest, &sig).is_ok()
    }
}
