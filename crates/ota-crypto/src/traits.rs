// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Core cryptographic traits
//!
//! These are the abstract interfaces the update engine consumes. They are
//! deliberately object safe: the engine stores the operator-installed
//! algorithm pair as trait objects, so swapping SHA3-256/Ed25519 for
//! another family is a configuration change, not a type change.

/// Streaming hash algorithm
///
/// One instance is reused per verification:
/// `begin -> add_data* -> end`, then [`HashAlgorithm::digest`] returns the
/// result until the next `begin`.
pub trait HashAlgorithm {
    /// Reset internal state and start a new digest
    fn begin(&mut self);

    /// Feed data into the running digest
    fn add_data(&mut self, data: &[u8]);

    /// Finalize the digest
    fn end(&mut self);

    /// Get the finalized digest
    ///
    /// Only meaningful between [`HashAlgorithm::end`] and the next
    /// [`HashAlgorithm::begin`].
    fn digest(&self) -> &[u8];

    /// Digest length in bytes
    fn digest_len(&self) -> usize;
}

/// Detached signature verifier
///
/// The signature covers the digest bytes produced by the paired
/// [`HashAlgorithm`]. The key is bound at construction time.
pub trait SignatureVerifier {
    /// Check `signature` against `digest`
    ///
    /// Returns `true` only for a well-formed signature that verifies;
    /// malformed input counts as not verified.
    fn verify(&self, digest: &[u8], signature: &[u8]) -> bool;
}

/// Constant-time comparison
///
/// Compares two byte slices in constant time to prevent timing attacks.
/// Length mismatch returns early; the lengths of firmware markers and
/// digests are public.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"IDFIX", b"IDFIX"));
        assert!(!constant_time_eq(b"IDFIX", b"WRONG"));
        assert!(!constant_time_eq(b"IDFIX", b"IDFI"));
        assert!(constant_time_eq(b"", b""));
    }
}
