use crate::common::{constants::ASSOC_NUM, error::Error, Key, Value};

use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

/// A single key-value slot.
///
/// `key` and `value` are meaningful only while `token` is set.
#[derive(Default)]
pub(crate) struct Slot {
    pub(crate) key: Key,
    pub(crate) value: Value,
    pub(crate) token: bool,
}

impl Slot {
    #[inline]
    pub(crate) fn is_occupied(&self) -> bool {
        self.token
    }

    #[inline]
    pub(crate) fn holds(&self, key: &Key) -> bool {
        self.token && &self.key == key
    }

    #[inline]
    pub(crate) fn fill(&mut self, key: &Key, value: &Value) {
        self.key = *key;
        self.value = *value;
        self.token = true;
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.token = false;
    }
}

/// A group of `ASSOC_NUM` slots, each guarded by its own lock.
pub(crate) struct Bucket {
    slots: [Mutex<Slot>; ASSOC_NUM],
}

impl Default for Bucket {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| Mutex::new(Slot::default())),
        }
    }
}

impl Bucket {
    #[inline]
    pub(crate) fn lock(&self, slot: usize) -> MutexGuard<'_, Slot> {
        self.slots[slot].lock()
    }

    #[inline]
    pub(crate) fn try_lock(&self, slot: usize) -> Option<MutexGuard<'_, Slot>> {
        self.slots[slot].try_lock()
    }

    #[inline]
    pub(crate) fn try_lock_for(&self, slot: usize, timeout: Duration) -> Option<MutexGuard<'_, Slot>> {
        self.slots[slot].try_lock_for(timeout)
    }

    /// Returns the slot without locking. Only a level that is not published
    /// yet can be borrowed mutably.
    #[inline]
    pub(crate) fn slot_mut(&mut self, slot: usize) -> &mut Slot {
        self.slots[slot].get_mut()
    }

    pub(crate) fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.lock().is_occupied()).count()
    }
}

/// One level of the table: a fixed array of buckets.
pub(crate) struct Level {
    buckets: Box<[Bucket]>,
}

impl Level {
    /// Allocates a level of `capacity` empty buckets.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self, Error> {
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(capacity)
            .map_err(|_| Error::AllocationFailure { buckets: capacity })?;
        buckets.resize_with(capacity, Bucket::default);

        Ok(Self {
            buckets: buckets.into_boxed_slice(),
        })
    }

    /// The number of buckets in this level.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub(crate) fn bucket(&self, index: usize) -> &Bucket {
        &self.buckets[index]
    }

    #[inline]
    pub(crate) fn bucket_mut(&mut self, index: usize) -> &mut Bucket {
        &mut self.buckets[index]
    }

    pub(crate) fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    /// Counts occupied slots. Each slot is locked only while it is read, so
    /// the count is a snapshot of no particular instant under concurrency.
    pub(crate) fn occupied(&self) -> usize {
        self.buckets.iter().map(Bucket::occupied).sum()
    }

    /// Fills every slot with copies of one item.
    #[cfg(test)]
    pub(crate) fn flood(&self, key: &Key, value: &Value) {
        for bucket in self.buckets() {
            for i in 0..ASSOC_NUM {
                bucket.lock(i).fill(key, value);
            }
        }
    }
}
