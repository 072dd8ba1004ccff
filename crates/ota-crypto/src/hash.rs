// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Hash algorithm implementations
//!
//! SHA3 family streaming hashers backed by the sha3 crate. Each hasher
//! owns its output buffer so [`HashAlgorithm::digest`] can hand out a
//! borrow without allocating.

use crate::traits::HashAlgorithm;
use sha3::{Digest, Sha3_256, Sha3_512};

/// SHA3-256 streaming hasher
pub struct Sha3_256Hasher {
    inner: Sha3_256,
    digest: [u8; 32],
}

impl Sha3_256Hasher {
    /// Digest length in bytes
    pub const DIGEST_LEN: usize = 32;

    /// Create a new hasher
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Sha3_256::new(),
            digest: [0u8; Self::DIGEST_LEN],
        }
    }
}

impl Default for Sha3_256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl HashAlgorithm for Sha3_256Hasher {
    fn begin(&mut self) {
        Digest::reset(&mut self.inner);
        self.digest = [0u8; Self::DIGEST_LEN];
    }

    fn add_data(&mut self, data: &[u8]) {
        Digest::update(&mut self.inner, data);
    }

    fn end(&mut self) {
        let result = self.inner.finalize_reset();
        self.digest.copy_from_slice(&result);
    }

    fn digest(&self) -> &[u8] {
        &self.digest
    }

    fn digest_len(&self) -> usize {
        Self::DIGEST_LEN
    }
}

/// SHA3-512 streaming hasher
pub struct Sha3_512Hasher {
    inner: Sha3_512,
    digest: [u8; 64],
}

impl Sha3_512Hasher {
    /// Digest length in bytes
    pub const DIGEST_LEN: usize = 64;

    /// Create a new hasher
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Sha3_512::new(),
            digest: [0u8; Self::DIGEST_LEN],
        }
    }
}

impl Default for Sha3_512Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl HashAlgorithm for Sha3_512Hasher {
    fn begin(&mut self) {
        Digest::reset(&mut self.inner);
        self.digest = [0u8; Self::DIGEST_LEN];
    }

    fn add_data(&mut self, data: &[u8]) {
        Digest::update(&mut self.inner, data);
    }

    fn end(&mut self) {
        let result = self.inner.finalize_reset();
        self.digest.copy_from_slice(&result);
    }

    fn digest(&self) -> &[u8] {
        &self.digest
    }

    fn digest_len(&self) -> usize {
        Self::DIGEST_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha3_256_matches_one_shot() {
        let expected = Sha3_256::digest(b"hello world");

        let mut hasher = Sha3_256Hasher::new();
        hasher.begin();
        hasher.add_data(b"hello ");
        hasher.add_data(b"world");
        hasher.end();

        assert_eq!(hasher.digest(), expected.as_slice());
        assert_eq!(hasher.digest_len(), 32);
    }

    #[test]
    fn test_sha3_256_reusable() {
        let mut hasher = Sha3_256Hasher::new();

        hasher.begin();
        hasher.add_data(b"first");
        hasher.end();
        let mut first = [0u8; 32];
        first.copy_from_slice(hasher.digest());

        hasher.begin();
        hasher.add_data(b"first");
        hasher.end();

        assert_eq!(hasher.digest(), &first);
    }

    #[test]
    fn test_sha3_512_digest_len() {
        let mut hasher = Sha3_512Hasher::new();
        hasher.begin();
        hasher.add_data(b"test");
        hasher.end();

        assert_eq!(hasher.digest_len(), 64);
        assert_eq!(hasher.digest(), Sha3_512::digest(b"test").as_slice());
    }
}
