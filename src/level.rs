//! The concurrent level hash engine.
//!
//! A level hash table stores fixed-size records in two arrays of buckets. The
//! top level has `2^L` buckets and the bottom level has `2^(L-1)` buckets, so
//! the bottom is always half the top. Every bucket holds `ASSOC_NUM` slots and
//! every slot carries its own lock.
//!
//! A key has two candidate buckets per level. Two hash functions with
//! independent seeds pick them: the first hash selects a bucket in the lower
//! half of the level and the second hash one in the upper half, so the two
//! candidates never coincide. A lookup therefore probes at most four buckets.
//!
//! Inserting tries three tiers before giving up:
//!
//! 1. Claim a free slot in any of the four candidate buckets.
//! 2. Move an occupant of a candidate bucket to its other candidate bucket in
//!    the same level, then take the freed slot.
//! 3. Once the table has been resized at least once, move an occupant of a
//!    bottom-level candidate bucket up to one of its top-level candidates.
//!
//! Every move is a single hop; there are no eviction chains. When all tiers
//! fail, the table asks for a resize.
//!
//! Resizing touches only a third of the items. A new top level twice the size
//! of the current top is allocated and the items of the bottom level are
//! rehashed into it. The current top level is shared, not copied, as the
//! bottom level of the grown table. The grown pair of levels is then published
//! with an atomic pointer swap and the old pair is reclaimed through
//! crossbeam-epoch once no thread can still be reading it. The rehash runs in
//! a barrier round: every registered worker parks at the barrier, the last
//! one to arrive performs the rehash, and then all of them continue.
//!
//! Slot locks are taken one at a time by lookups. A displacement holds the
//! occupant's slot while it waits only briefly for a destination slot, so two
//! displacements can never wait on each other for long. Because the candidate
//! buckets of a key are not locked as a group, a lookup can miss a key that a
//! concurrent displacement is moving between buckets; the key is found again
//! once the move is over.
//!
//! Inserters that look for an existing copy of their key hold a striped key
//! lock, and displacements skip items whose key lock is busy. An item is
//! therefore never in flight while an inserter of the same key searches.
//!
//! The design follows "Write-Optimized and High-Performance Hashing Index
//! Scheme for Persistent Memory" (Zuo et al., OSDI 2018).

pub(crate) mod barrier;
pub(crate) mod bucket;
pub(crate) mod hasher;
pub(crate) mod key_lock;
mod lookup;
mod placement;
pub(crate) mod raw;
mod resize;

use self::bucket::Level;
use crate::common::error::Error;

use std::sync::Arc;

/// Both levels of a table.
///
/// A resize builds a new `Levels` whose bottom level is the top level of the
/// current one, hence the `Arc`s.
pub(crate) struct Levels {
    top: Arc<Level>,
    bottom: Arc<Level>,
    level_size: u32,
}

impl Levels {
    pub(crate) fn new(level_size: u32) -> Result<Self, Error> {
        let capacity = 1usize
            .checked_shl(level_size)
            .ok_or(Error::InvalidLevelSize(level_size))?;

        Ok(Self {
            top: Arc::new(Level::with_capacity(capacity)?),
            bottom: Arc::new(Level::with_capacity(capacity / 2)?),
            level_size,
        })
    }

    #[inline]
    pub(crate) fn level_size(&self) -> u32 {
        self.level_size
    }

    /// The number of top-level buckets.
    #[inline]
    pub(crate) fn addr_capacity(&self) -> usize {
        self.top.capacity()
    }

    /// The number of buckets in both levels.
    #[inline]
    pub(crate) fn total_capacity(&self) -> usize {
        self.top.capacity() + self.bottom.capacity()
    }

    pub(crate) fn occupied(&self) -> (usize, usize) {
        (self.top.occupied(), self.bottom.occupied())
    }

    /// Fills every slot of both levels with copies of one item.
    #[cfg(test)]
    pub(crate) fn flood(&self, key: &crate::common::Key, value: &crate::common::Value) {
        self.top.flood(key, value);
        self.bottom.flood(key, value);
    }

    #[inline]
    fn levels(&self) -> [&Level; 2] {
        [&*self.top, &*self.bottom]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_is_half_the_top() {
        for level_size in 2..12 {
            let levels = Levels::new(level_size).unwrap();
            assert_eq!(levels.addr_capacity(), 1 << level_size);
            assert_eq!(levels.bottom.capacity() * 2, levels.top.capacity());
            assert_eq!(
                levels.total_capacity(),
                (1 << level_size) + (1 << (level_size - 1))
            );
            assert_eq!(levels.occupied(), (0, 0));
        }
    }
}
