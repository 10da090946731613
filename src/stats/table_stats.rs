use crate::common::constants::ASSOC_NUM;

use std::fmt::{self, Debug};

/// A snapshot of the occupancy of a [`LevelHash`][table-struct].
///
/// The snapshot is taken by walking every slot of both levels. Each slot is
/// locked only while it is read, so under concurrent writes the counts do not
/// correspond to a single instant. They are exact once the table is quiet.
///
/// Capacities come in two units: *buckets* (`addr_capacity`,
/// `total_capacity`) and *slots* (`level0_slots`, `level1_slots`,
/// `slot_capacity`), where a bucket has `ASSOC_NUM` slots.
///
/// [table-struct]: ../struct.LevelHash.html
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TableStats {
    level_size: u32,
    resize_count: u64,
    level0_occupied: u64,
    level1_occupied: u64,
    level0_buckets: u64,
    level1_buckets: u64,
}

impl Debug for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableStats")
            .field("level_size", &self.level_size)
            .field("resize_count", &self.resize_count)
            .field("level0_occupied", &self.level0_occupied)
            .field("level0_slots", &self.level0_slots())
            .field("level1_occupied", &self.level1_occupied)
            .field("level1_slots", &self.level1_slots())
            .field("occupied", &self.occupied())
            .field("total_capacity", &self.total_capacity())
            .field("slot_capacity", &self.slot_capacity())
            .field("load_factor", &self.load_factor())
            .finish()
    }
}

impl TableStats {
    pub(crate) fn set_geometry(
        &mut self,
        level_size: u32,
        level0_buckets: usize,
        level1_buckets: usize,
    ) -> &mut Self {
        self.level_size = level_size;
        self.level0_buckets = level0_buckets as u64;
        self.level1_buckets = level1_buckets as u64;
        self
    }

    pub(crate) fn set_occupied(&mut self, level0: usize, level1: usize) -> &mut Self {
        self.level0_occupied = level0 as u64;
        self.level1_occupied = level1 as u64;
        self
    }

    pub(crate) fn set_resize_count(&mut self, count: u64) -> &mut Self {
        self.resize_count = count;
        self
    }

    /// The level size exponent `L`: the top level has `2^L` buckets.
    pub fn level_size(&self) -> u32 {
        self.level_size
    }

    /// The number of completed resize rounds since the table was created.
    pub fn resize_count(&self) -> u64 {
        self.resize_count
    }

    /// Occupied slots in the top level.
    pub fn level0_occupied(&self) -> u64 {
        self.level0_occupied
    }

    /// Occupied slots in the bottom level.
    pub fn level1_occupied(&self) -> u64 {
        self.level1_occupied
    }

    /// Occupied slots in both levels, which is the number of stored items.
    pub fn occupied(&self) -> u64 {
        self.level0_occupied.saturating_add(self.level1_occupied)
    }

    /// The number of top-level buckets.
    pub fn addr_capacity(&self) -> u64 {
        self.level0_buckets
    }

    /// The number of buckets in both levels.
    pub fn total_capacity(&self) -> u64 {
        self.level0_buckets.saturating_add(self.level1_buckets)
    }

    /// The number of slots in the top level.
    pub fn level0_slots(&self) -> u64 {
        self.level0_buckets.saturating_mul(ASSOC_NUM as u64)
    }

    /// The number of slots in the bottom level.
    pub fn level1_slots(&self) -> u64 {
        self.level1_buckets.saturating_mul(ASSOC_NUM as u64)
    }

    /// The number of slots in both levels.
    pub fn slot_capacity(&self) -> u64 {
        self.total_capacity().saturating_mul(ASSOC_NUM as u64)
    }

    /// Occupied slots divided by all slots.
    pub fn load_factor(&self) -> f64 {
        let capacity = self.slot_capacity();
        if capacity == 0 {
            0.0
        } else {
            self.occupied() as f64 / capacity as f64
        }
    }
}
