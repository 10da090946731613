use super::{
    bucket::{Level, Slot},
    hasher::LevelHasher,
    Levels,
};
use crate::common::{constants::ASSOC_NUM, error::Error};

use std::sync::Arc;

impl Levels {
    /// Builds the levels of the table grown by one level, and returns them
    /// together with the number of migrated items.
    ///
    /// A new top level twice the size of the current one is allocated and the
    /// items of the bottom level are rehashed into it. The current top level
    /// becomes the bottom level of the result as is. `self` is only read, so
    /// on error the table is left exactly as it was.
    pub(crate) fn grow(&self, hasher: &LevelHasher) -> Result<(Self, usize), Error> {
        let new_capacity = self
            .top
            .capacity()
            .checked_mul(2)
            .ok_or(Error::AllocationFailure { buckets: usize::MAX })?;
        let mut new_top = Level::with_capacity(new_capacity)?;
        let mut migrated = 0;

        for bucket in self.bottom.buckets() {
            for i in 0..ASSOC_NUM {
                let item = bucket.lock(i);
                if !item.is_occupied() {
                    continue;
                }

                let (first, second) = hasher.hashes(&item.key).indices(new_capacity);
                if !place_exclusive(&mut new_top, first, second, &item) {
                    return Err(Error::RehashInvariantViolation { first, second });
                }
                migrated += 1;
            }
        }

        let grown = Self {
            top: Arc::new(new_top),
            bottom: Arc::clone(&self.top),
            level_size: self.level_size + 1,
        };

        Ok((grown, migrated))
    }
}

// Same slot order as direct placement.
fn place_exclusive(level: &mut Level, first: usize, second: usize, item: &Slot) -> bool {
    for i in 0..ASSOC_NUM {
        for index in [first, second] {
            let slot = level.bucket_mut(index).slot_mut(i);
            if !slot.is_occupied() {
                slot.fill(&item.key, &item.value);
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::{pad_key, pad_value, Key},
        level::key_lock::KeyLocks,
    };

    fn fill(levels: &Levels, hasher: &LevelHasher, n: u32) -> Vec<Key> {
        let key_locks = KeyLocks::default();
        let mut keys = Vec::new();
        for i in 0..n {
            let key = pad_key(format!("item-{i}").as_bytes()).unwrap();
            let value = pad_value(&i.to_le_bytes()).unwrap();
            if levels.place(hasher, &key_locks, &key, &value, hasher.hashes(&key), true) {
                keys.push(key);
            }
        }
        keys
    }

    #[test]
    fn grow_doubles_the_top_and_keeps_every_item() {
        let hasher = LevelHasher::with_seeds(3, 5).unwrap();
        let levels = Levels::new(4).unwrap();
        let keys = fill(&levels, &hasher, 80);

        let (top_before, bottom_before) = levels.occupied();
        assert_eq!(top_before + bottom_before, keys.len());

        let (grown, migrated) = levels.grow(&hasher).unwrap();
        assert_eq!(migrated, bottom_before);
        assert_eq!(grown.level_size(), 5);
        assert_eq!(grown.addr_capacity(), 32);
        assert_eq!(grown.total_capacity(), 48);

        // The old top level is now the bottom level, shared and untouched.
        assert!(Arc::ptr_eq(&grown.bottom, &levels.top));
        assert_eq!(grown.occupied(), (bottom_before, top_before));
        assert_eq!(levels.occupied(), (top_before, bottom_before));

        for key in &keys {
            let found = grown.find_and(key, hasher.hashes(key), |slot| slot.value);
            assert!(found.is_some());
        }
    }

    #[test]
    fn migrated_values_are_preserved() {
        let hasher = LevelHasher::with_seeds(8, 9).unwrap();
        let mut levels = Levels::new(3).unwrap();
        let keys = fill(&levels, &hasher, 40);

        for _ in 0..3 {
            levels = levels.grow(&hasher).unwrap().0;
        }
        assert_eq!(levels.level_size(), 6);

        for key in &keys {
            let found = levels
                .find_and(key, hasher.hashes(key), |slot| slot.value)
                .unwrap();
            let i: u32 = std::str::from_utf8(&key[5..])
                .unwrap()
                .trim_end_matches('\0')
                .parse()
                .unwrap();
            assert_eq!(found, pad_value(&i.to_le_bytes()).unwrap());
        }
    }

    // Copies of one key share both candidate buckets, which makes it easy to
    // build a bottom level that does or does not fit into the new top level.
    #[test]
    fn duplicates_filling_both_candidates_migrate() {
        let hasher = LevelHasher::with_seeds(21, 34).unwrap();
        let key = pad_key(b"crowd").unwrap();

        let levels = Levels::new(2).unwrap();
        levels.bottom.flood(&key, &pad_value(b"v").unwrap());
        assert_eq!(levels.occupied(), (0, ASSOC_NUM * 2));

        let (grown, migrated) = levels.grow(&hasher).unwrap();
        assert_eq!(migrated, ASSOC_NUM * 2);
        assert_eq!(grown.occupied(), (ASSOC_NUM * 2, 0));
    }

    #[test]
    fn failed_migration_leaves_levels_untouched() {
        let hasher = LevelHasher::with_seeds(21, 34).unwrap();
        let key = pad_key(b"crowd").unwrap();

        let levels = Levels::new(3).unwrap();
        levels.bottom.flood(&key, &pad_value(b"v").unwrap());
        assert_eq!(levels.occupied(), (0, ASSOC_NUM * 4));

        let (first, second) = hasher.hashes(&key).indices(16);
        assert_eq!(
            levels.grow(&hasher).err(),
            Some(Error::RehashInvariantViolation { first, second })
        );
        assert_eq!(levels.level_size(), 3);
        assert_eq!(levels.addr_capacity(), 8);
        assert_eq!(levels.occupied(), (0, ASSOC_NUM * 4));
    }
}
