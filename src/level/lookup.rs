use super::{bucket::Slot, hasher::Hashes, Levels};
use crate::common::{constants::ASSOC_NUM, Key};

impl Levels {
    /// Finds the slot holding `key` and returns the result of invoking
    /// `with_slot` on it while the slot is locked.
    ///
    /// Probes the top level before the bottom level and, within a level, the
    /// first candidate bucket before the second. Only one slot lock is held at
    /// a time.
    pub(crate) fn find_and<F, T>(&self, key: &Key, hashes: Hashes, with_slot: F) -> Option<T>
    where
        F: FnOnce(&mut Slot) -> T,
    {
        for level in self.levels() {
            let (first, second) = hashes.indices(level.capacity());

            for index in [first, second] {
                let bucket = level.bucket(index);
                for i in 0..ASSOC_NUM {
                    let mut slot = bucket.lock(i);
                    if slot.holds(key) {
                        return Some(with_slot(&mut *slot));
                    }
                }
            }
        }

        None
    }
}
