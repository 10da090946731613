use super::{
    bucket::{Bucket, Level, Slot},
    hasher::{Hashes, LevelHasher},
    key_lock::KeyLocks,
    Levels,
};
use crate::common::{constants::ASSOC_NUM, Key, Value};

use std::time::Duration;

/// How long a displacement waits for a busy destination slot before it
/// counts the slot as taken.
const MOVE_PATIENCE: Duration = Duration::from_micros(50);

impl Levels {
    /// Stores a new item, trying each placement tier in turn. Returns `false`
    /// when every tier failed and the table needs to grow.
    pub(crate) fn place(
        &self,
        hasher: &LevelHasher,
        key_locks: &KeyLocks,
        key: &Key,
        value: &Value,
        hashes: Hashes,
        bottom_to_top: bool,
    ) -> bool {
        self.place_direct(key, value, hashes)
            || self.try_movement(hasher, key_locks, key, value, hashes)
            || (bottom_to_top && self.bottom_to_top(hasher, key_locks, key, value, hashes))
    }

    /// Claims the first free slot among the candidate buckets. Within a level
    /// the two candidates are scanned slot by slot in turn, which spreads the
    /// items evenly over both.
    fn place_direct(&self, key: &Key, value: &Value, hashes: Hashes) -> bool {
        for level in self.levels() {
            let (first, second) = hashes.indices(level.capacity());

            for i in 0..ASSOC_NUM {
                for index in [first, second] {
                    let mut slot = level.bucket(index).lock(i);
                    if !slot.is_occupied() {
                        slot.fill(key, value);
                        return true;
                    }
                }
            }
        }

        false
    }

    /// Makes room by moving one occupant of a candidate bucket to its other
    /// candidate bucket in the same level.
    fn try_movement(
        &self,
        hasher: &LevelHasher,
        key_locks: &KeyLocks,
        key: &Key,
        value: &Value,
        hashes: Hashes,
    ) -> bool {
        for level in self.levels() {
            let (first, second) = hashes.indices(level.capacity());

            for index in [first, second] {
                if displace_within(level, index, hasher, key_locks, key, value) {
                    return true;
                }
            }
        }

        false
    }

    /// Makes room in a bottom-level candidate bucket by moving one of its
    /// occupants up to one of the occupant's top-level candidates.
    fn bottom_to_top(
        &self,
        hasher: &LevelHasher,
        key_locks: &KeyLocks,
        key: &Key,
        value: &Value,
        hashes: Hashes,
    ) -> bool {
        let (first, second) = hashes.indices(self.bottom.capacity());

        for index in [first, second] {
            let bucket = self.bottom.bucket(index);

            for i in 0..ASSOC_NUM {
                let mut victim = bucket.lock(i);
                if !victim.is_occupied() {
                    victim.fill(key, value);
                    return true;
                }

                let victim_hashes = hasher.hashes(&victim.key);
                let _moving = match key_locks.try_lock(victim_hashes) {
                    Some(guard) => guard,
                    None => continue,
                };
                let (f, s) = victim_hashes.indices(self.top.capacity());
                if move_to([self.top.bucket(f), self.top.bucket(s)], &victim) {
                    victim.fill(key, value);
                    return true;
                }
            }
        }

        false
    }
}

fn displace_within(
    level: &Level,
    index: usize,
    hasher: &LevelHasher,
    key_locks: &KeyLocks,
    key: &Key,
    value: &Value,
) -> bool {
    let bucket = level.bucket(index);

    for i in 0..ASSOC_NUM {
        let mut victim = bucket.lock(i);
        if !victim.is_occupied() {
            // Freed by a concurrent delete since the direct scan.
            victim.fill(key, value);
            return true;
        }

        // An inserter of the same key may be searching for it.
        let victim_hashes = hasher.hashes(&victim.key);
        let _moving = match key_locks.try_lock(victim_hashes) {
            Some(guard) => guard,
            None => continue,
        };
        let (f, s) = victim_hashes.indices(level.capacity());
        let alternate = if f == index { s } else { f };
        if move_to([level.bucket(alternate)], &victim) {
            victim.fill(key, value);
            return true;
        }
    }

    false
}

/// Copies `item` into a free slot of one of `candidates`.
///
/// The caller holds the lock of `item`, so a busy destination slot is waited
/// for at most `MOVE_PATIENCE` before it counts as taken.
fn move_to<const N: usize>(candidates: [&Bucket; N], item: &Slot) -> bool {
    move_with_patience(candidates, item, MOVE_PATIENCE)
}

fn move_with_patience<const N: usize>(
    candidates: [&Bucket; N],
    item: &Slot,
    patience: Duration,
) -> bool {
    let mut saw_busy = false;

    for i in 0..ASSOC_NUM {
        for bucket in candidates {
            match bucket.try_lock(i) {
                Some(mut slot) if !slot.is_occupied() => {
                    slot.fill(&item.key, &item.value);
                    return true;
                }
                Some(_) => (),
                None => saw_busy = true,
            }
        }
    }

    if !saw_busy {
        return false;
    }

    // Busy slots are usually held by a lookup that lets go right away.
    for i in 0..ASSOC_NUM {
        for bucket in candidates {
            if let Some(mut slot) = bucket.try_lock_for(i, patience) {
                if !slot.is_occupied() {
                    slot.fill(&item.key, &item.value);
                    return true;
                }
            }
        }
    }

    false
}
