use super::hasher::Hashes;

use crossbeam_utils::CachePadded;
use parking_lot::{Mutex, MutexGuard};

const KEY_LOCK_STRIPE_BITS: u32 = 8;
const KEY_LOCK_NUM_STRIPES: usize = 1 << KEY_LOCK_STRIPE_BITS;

/// Per-key locks, striped so that a fixed set of mutexes covers every key.
///
/// An inserter that checks for duplicates holds the lock of its key while it
/// searches and places. A displacement only tries the lock of the item it is
/// about to move and leaves the item alone when the lock is busy. Together
/// this keeps every copy of the key still while an inserter looks for it.
pub(crate) struct KeyLocks {
    stripes: Box<[CachePadded<Mutex<()>>]>,
}

impl Default for KeyLocks {
    fn default() -> Self {
        Self {
            stripes: (0..KEY_LOCK_NUM_STRIPES)
                .map(|_| CachePadded::new(Mutex::new(())))
                .collect(),
        }
    }
}

impl KeyLocks {
    pub(crate) fn lock(&self, hashes: Hashes) -> MutexGuard<'_, ()> {
        self.stripe(hashes).lock()
    }

    pub(crate) fn try_lock(&self, hashes: Hashes) -> Option<MutexGuard<'_, ()>> {
        self.stripe(hashes).try_lock()
    }

    // Bucket indices come from the low bits of the first hash, so the stripe
    // is picked from the high bits.
    #[inline]
    fn stripe(&self, hashes: Hashes) -> &Mutex<()> {
        let index = (hashes.first >> (u64::BITS - KEY_LOCK_STRIPE_BITS)) as usize;
        &self.stripes[index]
    }
}
