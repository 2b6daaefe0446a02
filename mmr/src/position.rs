//! Pure functions mapping MMR positions and sizes to structural properties.
//!
//! Every function here treats positions as addresses in an MMR that keeps growing forever, so
//! [sibling_of] and [parent_of] may return positions that do not exist (yet) in an MMR of some
//! particular size.

/// Maximum valid MMR size. Sizes at or beyond `1 << 63` would overflow position arithmetic.
pub const MAX_SIZE: u64 = (1 << 63) - 1;

/// Returns the height of the node at position `pos`.
///
/// Subtracting the size of the largest perfect tree that fits below `pos`, then repeating with
/// each smaller tree, leaves the height of the node.
pub const fn height_of(mut pos: u64) -> u32 {
    if pos == 0 {
        return 0;
    }

    let mut size = u64::MAX >> pos.leading_zeros();
    while size != 0 {
        if pos >= size {
            pos -= size;
        }
        size >>= 1;
    }

    pos as u32
}

/// The sibling and parent of a node, and which side of its parent it is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Family {
    pub sibling: u64,
    pub parent: u64,
    pub is_right: bool,
}

/// Returns the [Family] of the node at `pos`, given its `height`.
#[inline]
pub const fn family_of(pos: u64, height: u32) -> Family {
    let offset = (2 << height) - 1;
    // A right child is immediately followed by its parent. A left child is followed by the
    // left-most leaf of its sibling.
    if height_of(pos + 1) > height {
        Family {
            sibling: pos - offset,
            parent: pos + 1,
            is_right: true,
        }
    } else {
        Family {
            sibling: pos + offset,
            parent: pos + offset + 1,
            is_right: false,
        }
    }
}

/// Returns the position of the node that shares a parent with `pos`.
pub const fn sibling_of(pos: u64) -> u64 {
    family_of(pos, height_of(pos)).sibling
}

/// Returns the position of the parent of `pos`.
pub const fn parent_of(pos: u64) -> u64 {
    family_of(pos, height_of(pos)).parent
}

/// Returns the positions of the peaks of an MMR of the given size, tallest first.
///
/// The result is unspecified if `size` is not valid (see [is_valid_size]).
pub fn peaks_of(size: u64) -> Vec<u64> {
    PeakIterator::new(size).map(|(pos, _)| pos).collect()
}

/// Returns whether `size` is the size of some MMR.
///
/// Verifies that (1) the size won't result in overflow and (2) peaks in the MMR of the given size
/// have strictly decreasing height.
pub const fn is_valid_size(size: u64) -> bool {
    if size == 0 {
        return true;
    }
    if size > MAX_SIZE {
        return false;
    }
    let start = u64::MAX >> size.leading_zeros();
    let mut two_h = 1 << start.trailing_ones();
    let mut node_pos = start - 1;
    while two_h > 1 {
        if node_pos < size {
            if two_h == 2 {
                // If this peak is a leaf yet there are more nodes remaining, then this MMR is
                // invalid.
                return node_pos == size - 1;
            }
            // move to the right sibling
            node_pos += two_h - 1;
            if node_pos < size {
                // If the right sibling is in the MMR, then it is invalid.
                return false;
            }
            continue;
        }
        // descend to the left child
        two_h >>= 1;
        node_pos -= two_h;
    }
    true
}

/// Returns the 0-based insertion index of the leaf at position `pos`, or None if `pos` is not a
/// leaf.
///
/// The result is the `num` for which `2*num - num.count_ones() == pos`. Three applications of the
/// refinement `g(n) = (pos + n.count_ones())/2` starting from `pos/2` land within 1 of it.
#[inline]
pub const fn leaf_pos_to_num(pos: u64) -> Option<u64> {
    let mut num = pos >> 1;
    num = (pos + (num.count_ones() as u64)) >> 1;
    num = (pos + (num.count_ones() as u64)) >> 1;
    num = (pos + (num.count_ones() as u64)) >> 1;

    if pos == (num << 1).wrapping_sub(num.count_ones() as u64) {
        return Some(num);
    }
    if num > 0 {
        let check = num - 1;
        if pos == (check << 1).wrapping_sub(check.count_ones() as u64) {
            return Some(check);
        }
    }
    if num != u64::MAX {
        let check = num + 1;
        if pos == (check << 1).wrapping_sub(check.count_ones() as u64) {
            return Some(check);
        }
    }

    None
}

/// Returns the position of the leaf with insertion index `num`.
///
/// # Panics
///
/// Panics if the position would overflow.
#[inline]
pub fn leaf_num_to_pos(num: u64) -> u64 {
    // This will never underflow since 2*n >= count_ones(n).
    num.checked_mul(2).expect("leaf number overflow") - num.count_ones() as u64
}

/// Yields a `(position, height)` tuple for each peak in an MMR with the given size, in decreasing
/// order of height.
///
/// For an MMR of size 19 this yields `[(14, 3), (17, 1), (18, 0)]`. Nothing is yielded for a size
/// of 0 or a size beyond [MAX_SIZE].
#[derive(Default, Debug, Clone)]
pub struct PeakIterator {
    size: u64,     // number of nodes in the MMR
    node_pos: u64, // position of the current node
    two_h: u64,    // 2^(height+1) of the current node
}

impl PeakIterator {
    /// Return a new PeakIterator over the peaks of an MMR with the given number of nodes.
    pub fn new(size: u64) -> Self {
        if size == 0 || size > MAX_SIZE {
            return Self::default();
        }
        // Start the search from the smallest perfect tree that covers `size` nodes. Its root
        // lies outside the MMR unless the MMR is a single perfect tree, in which case we descend
        // leftward until the first peak is found.
        let start = u64::MAX >> size.leading_zeros();
        Self {
            size,
            node_pos: start - 1,
            two_h: 1 << start.trailing_ones(),
        }
    }
}

impl Iterator for PeakIterator {
    type Item = (u64, u32); // (peak, height)

    fn next(&mut self) -> Option<Self::Item> {
        while self.two_h > 1 {
            if self.node_pos < self.size {
                let peak = (self.node_pos, self.two_h.trailing_zeros() - 1);
                // move to the right sibling
                self.node_pos += self.two_h - 1;
                return Some(peak);
            }
            // descend to the left child
            self.two_h >>= 1;
            self.node_pos -= self.two_h;
        }
        None
    }
}
