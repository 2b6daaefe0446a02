//! Verify that a set of leaves belongs to an MMR with a known size and root.
//!
//! Two proof formats are supported, both listing the same digests in the same order:
//!
//! * [verify] reads bare 32-byte digests from a single forward pass over the proof and the leaves.
//! * [verify_raw] first collects every length-prefixed item of a raw proof, along with every leaf
//!   record (in any order), and then folds them.

use crate::{
    position::{family_of, height_of, is_valid_size, PeakIterator},
    ByteCursor, Digest, Error, Hasher, DIGEST_LENGTH,
};
use std::collections::VecDeque;

/// Length of one leaf record: its position (`u64`, little-endian) followed by its value.
pub const LEAF_RECORD_LENGTH: usize = 8 + DIGEST_LENGTH;

/// Length of one raw proof item: its length (`u16`, little-endian, always [DIGEST_LENGTH]) followed
/// by the digest.
pub const RAW_PROOF_ITEM_LENGTH: usize = 2 + DIGEST_LENGTH;

/// Verify that the leaves read from `leaves` are members of the MMR of `size` nodes with the given
/// `root`, using the digests read from `proof`.
///
/// Both cursors are driven forward only. On success, both have been fully consumed.
///
/// # Errors
///
/// Returns [Error::InvalidMmrSize] if `size` is not the size of a non-empty MMR
/// Returns [Error::Empty] if `leaves` holds no leaf
/// Returns [Error::BufferExhausted] if either stream ends before a required read
/// Returns [Error::NotALeaf], [Error::UnorderedLeaves] or [Error::LeafOutOfRange] if a leaf record
/// does not address the next leaf of the MMR
/// Returns [Error::ExtraProofBytes] if the proof holds more than is required
/// Returns [Error::RootMismatch] if the reconstructed root differs from `root`
pub fn verify<H: Hasher>(
    hasher: &mut H,
    root: &Digest,
    size: u64,
    proof: &mut ByteCursor<'_>,
    leaves: &mut ByteCursor<'_>,
) -> Result<(), Error> {
    check_size(size)?;
    let computed = reconstruct_root(hasher, size, proof, Leaves::new(LeafRecords::new(leaves)))?;
    if computed != *root {
        return Err(Error::RootMismatch);
    }
    Ok(())
}

/// Verify that the leaves read from `leaves` are members of the MMR of `size` nodes with the given
/// `root`, using a raw proof: a sequence of items, each a `u16` little-endian length (which must be
/// [DIGEST_LENGTH]) followed by that many bytes.
///
/// Leaf records may appear in any order; they are sorted by position before folding.
///
/// # Errors
///
/// Returns [Error::InvalidProofItem] if an item has the wrong length
/// Returns [Error::MissingProofItem] if the proof holds too few items
/// Returns [Error::ExtraProofItems] if the proof holds more items than are required
/// Returns every other error [verify] does, save [Error::ExtraProofBytes]
pub fn verify_raw<H: Hasher>(
    hasher: &mut H,
    root: &Digest,
    size: u64,
    proof: &mut ByteCursor<'_>,
    leaves: &mut ByteCursor<'_>,
) -> Result<(), Error> {
    check_size(size)?;
    let mut items = Vec::with_capacity(proof.remaining() / RAW_PROOF_ITEM_LENGTH);
    while !proof.is_empty() {
        let len = proof.read_u16()? as usize;
        if len != DIGEST_LENGTH {
            return Err(Error::InvalidProofItem(len));
        }
        items.push(proof.read_digest()?);
    }
    let mut records = LeafRecords::new(leaves).collect::<Result<Vec<_>, _>>()?;
    records.sort_by_key(|(pos, _)| *pos);

    let leaves = Leaves::new(records.into_iter().map(Ok::<_, Error>));
    let computed = reconstruct_root(hasher, size, &mut items.into_iter(), leaves)?;
    if computed != *root {
        return Err(Error::RootMismatch);
    }
    Ok(())
}

/// Combine peak digests (tallest first) into a root, folding from the right-most peak leftward
/// with [Hasher::peak_digest]. Returns None if there are no peaks.
pub fn bag_peaks<H: Hasher>(hasher: &mut H, peak_digests: &[Digest]) -> Option<Digest> {
    let (last, rest) = peak_digests.split_last()?;
    Some(
        rest.iter()
            .rev()
            .fold(*last, |bag, left| hasher.peak_digest(&bag, left)),
    )
}

fn check_size(size: u64) -> Result<(), Error> {
    if size == 0 || !is_valid_size(size) {
        return Err(Error::InvalidMmrSize(size));
    }
    Ok(())
}

/// Fold every leaf up to its peak and bag the peaks, consuming exactly the items of `proof`.
fn reconstruct_root<H, P, I>(
    hasher: &mut H,
    size: u64,
    proof: &mut P,
    mut leaves: Leaves<I>,
) -> Result<Digest, Error>
where
    H: Hasher,
    P: ProofItems,
    I: Iterator<Item = Result<(u64, Digest), Error>>,
{
    if leaves.peek()?.is_none() {
        return Err(Error::Empty);
    }

    let mut peak_digests = Vec::new();
    for (peak_pos, _) in PeakIterator::new(size) {
        let nodes = leaves.take_through(hasher, peak_pos)?;
        if !nodes.is_empty() {
            peak_digests.push(peak_root(hasher, peak_pos, nodes, proof)?);
            continue;
        }
        // This peak covers none of the leaves, so its digest comes from the proof. Once no leaves
        // remain, the proof carries a single digest bagging this peak and every peak to its right.
        peak_digests.push(proof.next_item()?);
        if leaves.peek()?.is_none() {
            break;
        }
    }

    if let Some((pos, _)) = leaves.peek()? {
        return Err(Error::LeafOutOfRange(pos, size));
    }
    proof.finish()?;

    bag_peaks(hasher, &peak_digests).ok_or(Error::Empty)
}

/// Proof items, consumed front to back.
trait ProofItems {
    fn next_item(&mut self) -> Result<Digest, Error>;

    /// Fail if any item was left unconsumed.
    fn finish(&self) -> Result<(), Error>;
}

impl ProofItems for ByteCursor<'_> {
    fn next_item(&mut self) -> Result<Digest, Error> {
        self.read_digest()
    }

    fn finish(&self) -> Result<(), Error> {
        if !self.is_empty() {
            return Err(Error::ExtraProofBytes(self.remaining()));
        }
        Ok(())
    }
}

impl ProofItems for std::vec::IntoIter<Digest> {
    fn next_item(&mut self) -> Result<Digest, Error> {
        self.next().ok_or(Error::MissingProofItem)
    }

    fn finish(&self) -> Result<(), Error> {
        if self.len() != 0 {
            return Err(Error::ExtraProofItems(self.len()));
        }
        Ok(())
    }
}

/// Reconstruct the digest of the peak at `peak_pos` from the digests of some of its leaves,
/// reading every sibling that cannot be derived from `proof`.
///
/// `nodes` holds `(position, height, digest)` tuples ordered by position. Nodes are merged one
/// level at a time, so a node's left sibling is never still queued when the node is popped, and a
/// queued right sibling is always at the front.
fn peak_root<H: Hasher, P: ProofItems>(
    hasher: &mut H,
    peak_pos: u64,
    mut nodes: VecDeque<(u64, u32, Digest)>,
    proof: &mut P,
) -> Result<Digest, Error> {
    while let Some((pos, height, digest)) = nodes.pop_front() {
        if pos == peak_pos {
            // Every other node has been merged into this one by now.
            debug_assert!(nodes.is_empty());
            return Ok(digest);
        }

        let family = family_of(pos, height);
        let parent_digest = if family.is_right {
            let sibling = proof.next_item()?;
            hasher.node_digest(&sibling, &digest)
        } else {
            let sibling = match nodes.front() {
                Some(&(front, _, sibling)) if front == family.sibling => {
                    nodes.pop_front();
                    sibling
                }
                _ => proof.next_item()?,
            };
            hasher.node_digest(&digest, &sibling)
        };
        nodes.push_back((family.parent, height + 1, parent_digest));
    }

    unreachable!("leaves under a peak always merge into the peak")
}

/// Reads `(position, value)` records from a leaf stream until it is empty.
struct LeafRecords<'a, 'b> {
    cursor: &'b mut ByteCursor<'a>,
}

impl<'a, 'b> LeafRecords<'a, 'b> {
    fn new(cursor: &'b mut ByteCursor<'a>) -> Self {
        Self { cursor }
    }
}

impl Iterator for LeafRecords<'_, '_> {
    type Item = Result<(u64, Digest), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.is_empty() {
            return None;
        }
        let record = self
            .cursor
            .read_u64()
            .and_then(|pos| Ok((pos, self.cursor.read_digest()?)));
        Some(record)
    }
}

/// Lazily pulls leaf records, validating that each addresses a leaf beyond the previous one.
struct Leaves<I> {
    records: I,
    pending: Option<(u64, Digest)>,
    last_pos: Option<u64>,
}

impl<I: Iterator<Item = Result<(u64, Digest), Error>>> Leaves<I> {
    fn new(records: I) -> Self {
        Self {
            records,
            pending: None,
            last_pos: None,
        }
    }

    /// Return the next leaf without consuming it, or None once every record has been consumed.
    fn peek(&mut self) -> Result<Option<(u64, Digest)>, Error> {
        if self.pending.is_none() {
            if let Some(record) = self.records.next() {
                let (pos, value) = record?;
                if height_of(pos) != 0 {
                    return Err(Error::NotALeaf(pos));
                }
                if matches!(self.last_pos, Some(last) if pos <= last) {
                    return Err(Error::UnorderedLeaves(pos));
                }
                self.last_pos = Some(pos);
                self.pending = Some((pos, value));
            }
        }
        Ok(self.pending)
    }

    /// Consume every leaf at or before `peak_pos`, returning the `(position, height, digest)` of
    /// each.
    fn take_through<H: Hasher>(
        &mut self,
        hasher: &mut H,
        peak_pos: u64,
    ) -> Result<VecDeque<(u64, u32, Digest)>, Error> {
        let mut nodes = VecDeque::new();
        while let Some((pos, value)) = self.peek()? {
            if pos > peak_pos {
                break;
            }
            self.pending = None;
            nodes.push_back((pos, 0, hasher.leaf_digest(&value)));
        }
        Ok(nodes)
    }
}
