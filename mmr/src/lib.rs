//! Verify compact membership proofs against a Merkle Mountain Range (MMR) root.
//!
//! # Terminology
//!
//! An MMR is a list of perfect binary trees (aka "mountains") of strictly decreasing height. The
//! roots of these trees are called the "peaks" of the MMR. Each leaf of a mountain commits to one
//! appended 32-byte value; each non-leaf node stores the digest of its two children.
//!
//! The "size" of an MMR is the total number of nodes summed over all trees. Not every `u64` is a
//! valid size: a size is valid only if it decomposes into mountains of strictly decreasing height.
//!
//! Nodes are ordered by a post-order traversal of the trees, starting from the tallest tree. The
//! "position" of a node is its 0-based index in this ordering. The "height" of a node is 0 for a
//! leaf, 1 for the parent of 2 leaves, and so on.
//!
//! The "root" of an MMR is obtained by "bagging" its peaks from right to left: the right-most peak
//! is combined with its left neighbor, the result with the next neighbor, and so on until a single
//! digest remains.
//!
//! # Example
//!
//! After adding 11 leaves, an MMR has 19 nodes and 3 peaks:
//!
//! ```text
//!    Height
//!      3              14
//!                   /    \
//!                  /      \
//!                 /        \
//!                /          \
//!      2        6            13
//!             /   \        /    \
//!      1     2     5      9     12     17
//!           / \   / \    / \   /  \   /  \
//!      0   0   1 3   4  7   8 10  11 15  16 18
//! ```
//!
//! Its root is `peak(peak(node_18, node_17), node_14)` where `peak(right, left)` is
//! [Hasher::peak_digest].
//!
//! # Proofs
//!
//! A proof is verified from two byte streams, each read through a [ByteCursor]:
//!
//! * The _leaf stream_ is a sequence of 40-byte records: the leaf's position (`u64`,
//!   little-endian) followed by its 32-byte value. Positions must be strictly increasing.
//! * The _proof stream_ is a sequence of 32-byte digests, consumed in the order [verify] needs
//!   them: siblings that cannot be derived from the supplied leaves, the digest of each peak left
//!   of the last peak covering a leaf, and finally a single digest bagging every peak right of it.
//!
//! Both streams must be consumed exactly; trailing proof bytes are rejected.
//!
//! A _raw proof_ lists the same digests in the same order, each prefixed with its length (`u16`,
//! little-endian). It is checked by [verify_raw], which also accepts leaf records in any order.

use thiserror::Error;

mod cursor;
mod digest;
pub mod hasher;
#[cfg(any(test, feature = "builder"))]
pub mod mem;
pub mod position;
pub mod verification;

pub use cursor::ByteCursor;
pub use digest::{Digest, DIGEST_LENGTH};
pub use hasher::{Blake2b, Hasher, Sha256};
pub use verification::{bag_peaks, verify, verify_raw, LEAF_RECORD_LENGTH, RAW_PROOF_ITEM_LENGTH};

/// Errors that can occur when verifying (or, with the `builder` feature, proving) membership in
/// an MMR.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("buffer exhausted: requested {requested} bytes, {remaining} remaining")]
    BufferExhausted { requested: usize, remaining: usize },
    #[error("computed root does not match the expected root")]
    RootMismatch,
    #[error("invalid mmr size: {0}")]
    InvalidMmrSize(u64),
    #[error("no leaves to verify")]
    Empty,
    #[error("extra bytes in proof: {0}")]
    ExtraProofBytes(usize),
    #[error("position {0} is not a leaf")]
    NotALeaf(u64),
    #[error("leaf position {0} is outside an mmr of size {1}")]
    LeafOutOfRange(u64, u64),
    #[error("leaf position {0} does not follow the previous leaf")]
    UnorderedLeaves(u64),
    #[error("proof item has length {0}, expected 32")]
    InvalidProofItem(usize),
    #[error("proof ran out of items")]
    MissingProofItem,
    #[error("extra items in proof: {0}")]
    ExtraProofItems(usize),
}
