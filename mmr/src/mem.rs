//! A basic MMR where all nodes are stored in-memory, able to produce proofs in the order
//! [crate::verify] consumes them.

use crate::{
    position::{family_of, height_of, PeakIterator},
    verification::bag_peaks,
    Digest, Error, Hasher,
};
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::VecDeque;

/// Implementation of `Mmr`.
#[derive(Clone, Debug, Default)]
pub struct Mmr {
    // The nodes of the MMR, laid out according to a post-order traversal of the MMR trees, starting
    // from the tallest tree to shortest.
    nodes: Vec<Digest>,
}

/// The digests proving membership of a set of leaves in an MMR of `size` nodes, in the order they
/// are consumed during verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    pub size: u64,
    pub digests: Vec<Digest>,
}

impl Proof {
    /// Encode the proof stream: every digest, back to back.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.digests.len() * crate::DIGEST_LENGTH);
        for digest in &self.digests {
            buf.put_slice(digest);
        }
        buf.freeze()
    }

    /// Encode the raw proof stream: every digest, prefixed with its length.
    pub fn encode_raw(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.digests.len() * crate::RAW_PROOF_ITEM_LENGTH);
        for digest in &self.digests {
            buf.put_u16_le(crate::DIGEST_LENGTH as u16);
            buf.put_slice(digest);
        }
        buf.freeze()
    }
}

/// Encode the leaf stream for the given `(position, value)` pairs.
pub fn encode_leaves(leaves: &[(u64, Digest)]) -> Bytes {
    let mut buf = BytesMut::with_capacity(leaves.len() * crate::LEAF_RECORD_LENGTH);
    for (pos, value) in leaves {
        buf.put_u64_le(*pos);
        buf.put_slice(value);
    }
    buf.freeze()
}

impl Mmr {
    /// Return a new (empty) `Mmr`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the total number of nodes in the MMR. The next added leaf's position will have this
    /// value.
    pub fn size(&self) -> u64 {
        self.nodes.len() as u64
    }

    /// Return a new iterator over the peaks of the MMR.
    pub fn peak_iterator(&self) -> PeakIterator {
        PeakIterator::new(self.size())
    }

    /// Returns the requested node or None if it is not stored in the MMR.
    pub fn get_node(&self, pos: u64) -> Option<Digest> {
        self.nodes.get(usize::try_from(pos).ok()?).copied()
    }

    /// Returns a node known to exist.
    fn node(&self, pos: u64) -> Digest {
        self.nodes[pos as usize]
    }

    /// Add a leaf to the MMR and return its position in the MMR.
    pub fn add<H: Hasher>(&mut self, hasher: &mut H, leaf: &Digest) -> u64 {
        let leaf_pos = self.size();
        let peaks = nodes_needing_parents(self.peak_iterator());
        let mut digest = hasher.leaf_digest(leaf);
        self.nodes.push(digest);

        // Compute the new parent nodes if any, and insert them into the MMR.
        for sibling_pos in peaks.into_iter().rev() {
            digest = hasher.node_digest(&self.node(sibling_pos), &digest);
            self.nodes.push(digest);
        }

        leaf_pos
    }

    /// Computes the root of the MMR, returning [Error::Empty] if it has no nodes.
    pub fn root<H: Hasher>(&self, hasher: &mut H) -> Result<Digest, Error> {
        let peaks: Vec<Digest> = self
            .peak_iterator()
            .map(|(peak_pos, _)| self.node(peak_pos))
            .collect();
        bag_peaks(hasher, &peaks).ok_or(Error::Empty)
    }

    /// Return a proof of membership for the leaves at `positions`, which must be strictly
    /// increasing.
    ///
    /// Digests appear in the order they are consumed by [crate::verify]: for each peak (tallest
    /// first) covering requested leaves, the siblings that cannot be derived from them; the digest
    /// of each peak covering none of them but left of one that does; and one digest bagging every
    /// peak right of the last requested leaf.
    pub fn proof<H: Hasher>(&self, hasher: &mut H, positions: &[u64]) -> Result<Proof, Error> {
        let size = self.size();
        if positions.is_empty() {
            return Err(Error::Empty);
        }
        let mut last = None;
        for &pos in positions {
            if height_of(pos) != 0 {
                return Err(Error::NotALeaf(pos));
            }
            if pos >= size {
                return Err(Error::LeafOutOfRange(pos, size));
            }
            if matches!(last, Some(last) if pos <= last) {
                return Err(Error::UnorderedLeaves(pos));
            }
            last = Some(pos);
        }

        let peaks: Vec<u64> = self.peak_iterator().map(|(pos, _)| pos).collect();
        let mut digests = Vec::new();
        let mut remaining = positions;
        for (i, &peak_pos) in peaks.iter().enumerate() {
            let covered = remaining.partition_point(|pos| *pos <= peak_pos);
            if covered > 0 {
                self.append_siblings(peak_pos, &remaining[..covered], &mut digests);
                remaining = &remaining[covered..];
                continue;
            }
            if !remaining.is_empty() {
                digests.push(self.node(peak_pos));
                continue;
            }
            let rhs: Vec<Digest> = peaks[i..].iter().map(|pos| self.node(*pos)).collect();
            digests.extend(bag_peaks(hasher, &rhs));
            break;
        }

        Ok(Proof { size, digests })
    }

    /// Return the raw proof stream (see [crate::verify_raw]) for the leaves at `positions`.
    pub fn raw_proof<H: Hasher>(
        &self,
        hasher: &mut H,
        positions: &[u64],
    ) -> Result<Bytes, Error> {
        Ok(self.proof(hasher, positions)?.encode_raw())
    }

    /// Append the digests needed to fold `positions` up to the peak at `peak_pos`, replaying the
    /// queue the verifier folds them with.
    fn append_siblings(&self, peak_pos: u64, positions: &[u64], digests: &mut Vec<Digest>) {
        let mut queue: VecDeque<(u64, u32)> = positions.iter().map(|pos| (*pos, 0)).collect();
        while let Some((pos, height)) = queue.pop_front() {
            if pos == peak_pos {
                break;
            }
            let family = family_of(pos, height);
            if family.is_right {
                digests.push(self.node(family.sibling));
            } else if matches!(queue.front(), Some((front, _)) if *front == family.sibling) {
                queue.pop_front();
            } else {
                digests.push(self.node(family.sibling));
            }
            queue.push_back((family.parent, height + 1));
        }
    }
}

/// Returns the positions of the peaks that become left children once a leaf is added to an MMR
/// with the given peaks, from tallest to shortest.
fn nodes_needing_parents(peak_iterator: PeakIterator) -> Vec<u64> {
    let mut peaks = Vec::new();
    let mut last_height = u32::MAX;

    for (peak_pos, height) in peak_iterator {
        if height != last_height.wrapping_sub(1) {
            peaks.clear();
        }
        peaks.push(peak_pos);
        last_height = height;
    }
    if last_height != 0 {
        // there is no peak that is a leaf
        peaks.clear();
    }
    peaks
}
