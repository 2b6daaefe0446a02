//! Bindings of cryptographic hash functions to the digests of an MMR.
//!
//! A verifier must use the same binding that built the MMR: the leaf, node and peak digests are
//! part of the commitment.

use crate::{Digest, DIGEST_LENGTH};
use blake2b_rs::Blake2bBuilder;
use sha2::{Digest as _, Sha256 as ISha256};

/// A trait for computing the various digests of an MMR.
pub trait Hasher {
    /// Computes the digest stored at the position of a leaf with the given value.
    fn leaf_digest(&mut self, leaf: &Digest) -> Digest;

    /// Computes the digest of a node given the digests of its children. Must not be commutative.
    fn node_digest(&mut self, left: &Digest, right: &Digest) -> Digest;

    /// Combines two adjacent peaks (or the bag of every peak to the right of `left`) while
    /// computing the root.
    fn peak_digest(&mut self, right: &Digest, left: &Digest) -> Digest {
        self.node_digest(right, left)
    }
}

/// Personalization of every Blake2b digest computed by [Blake2b].
pub const BLAKE2B_PERSONALIZATION: &[u8; 16] = b"ckb-default-hash";

/// Blake2b-256 with the `ckb-default-hash` personalization.
///
/// Leaves are stored as-is (their values are expected to be digests already), so an MMR holding a
/// single leaf has that leaf as its root.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake2b;

impl Blake2b {
    /// Compute the personalized digest of `data`.
    pub fn digest(data: &[u8]) -> Digest {
        Self::digest_all(&[data])
    }

    fn digest_all(parts: &[&[u8]]) -> Digest {
        let mut hasher = Blake2bBuilder::new(DIGEST_LENGTH)
            .personal(BLAKE2B_PERSONALIZATION)
            .build();
        for part in parts {
            hasher.update(part);
        }
        let mut digest = Digest::default();
        hasher.finalize(digest.as_mut());
        digest
    }
}

impl Hasher for Blake2b {
    fn leaf_digest(&mut self, leaf: &Digest) -> Digest {
        *leaf
    }

    fn node_digest(&mut self, left: &Digest, right: &Digest) -> Digest {
        Self::digest_all(&[&left[..], &right[..]])
    }
}

/// Prefix of every leaf digest computed by [Sha256].
const LEAF_PREFIX: u8 = 0x00;

/// Prefix of every node (and peak) digest computed by [Sha256].
const NODE_PREFIX: u8 = 0x01;

/// SHA-256 with domain separation between leaves and nodes:
///
/// - Leaf: `SHA256(0x00 || leaf)`
/// - Node: `SHA256(0x01 || left || right)`
#[derive(Clone, Default)]
pub struct Sha256 {
    hasher: ISha256,
}

impl Sha256 {
    /// Return a new [Sha256] binding.
    pub fn new() -> Self {
        Self::default()
    }

    fn finalize(&mut self) -> Digest {
        let mut digest = Digest::default();
        digest
            .as_mut()
            .copy_from_slice(&self.hasher.finalize_reset());
        digest
    }
}

impl Hasher for Sha256 {
    fn leaf_digest(&mut self, leaf: &Digest) -> Digest {
        self.hasher.update([LEAF_PREFIX]);
        self.hasher.update(leaf);
        self.finalize()
    }

    fn node_digest(&mut self, left: &Digest, right: &Digest) -> Digest {
        self.hasher.update([NODE_PREFIX]);
        self.hasher.update(left);
        self.hasher.update(right);
        self.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(v: u8) -> Digest {
        Digest::from([v; DIGEST_LENGTH])
    }

    #[test]
    fn test_blake2b_personalized_empty_digest() {
        assert_eq!(
            Blake2b::digest(&[]).to_string(),
            "44f4c69744d5f8c55d642062949dcae49bc4e7ef43d388c5a12f42b5633d163e"
        );
    }

    #[test]
    fn test_blake2b_node_is_digest_of_concatenation() {
        let (left, right) = (digest(1), digest(2));
        let mut concatenated = Vec::new();
        concatenated.extend_from_slice(&left);
        concatenated.extend_from_slice(&right);

        let mut hasher = Blake2b;
        assert_eq!(hasher.leaf_digest(&left), left);
        assert_eq!(
            hasher.node_digest(&left, &right),
            Blake2b::digest(&concatenated)
        );
        assert_eq!(
            hasher.peak_digest(&right, &left),
            hasher.node_digest(&right, &left)
        );
    }

    #[test]
    fn test_sha256_domain_separation() {
        let mut hasher = Sha256::new();
        let (left, right) = (digest(1), digest(2));

        let leaf = hasher.leaf_digest(&left);
        let mut expected = ISha256::new();
        expected.update([0u8]);
        expected.update(left);
        assert_eq!(&leaf[..], &expected.finalize()[..]);

        // Reusing the hasher must not carry state over.
        assert_eq!(hasher.leaf_digest(&left), leaf);

        let node = hasher.node_digest(&left, &right);
        let mut expected = ISha256::new();
        expected.update([1u8]);
        expected.update(left);
        expected.update(right);
        assert_eq!(&node[..], &expected.finalize()[..]);
        assert_ne!(node, leaf);
    }

    #[test]
    fn test_node_digest_is_order_sensitive() {
        let (left, right) = (digest(1), digest(2));
        let mut sha = Sha256::new();
        assert_ne!(sha.node_digest(&left, &right), sha.node_digest(&right, &left));
        let mut blake = Blake2b;
        assert_ne!(
            blake.node_digest(&left, &right),
            blake.node_digest(&right, &left)
        );
    }
}
