use super::{barrier::ResizeBarrier, hasher::LevelHasher, key_lock::KeyLocks, Levels};
use crate::{
    common::{
        constants::{MAX_LEVEL_SIZE, MIN_LEVEL_SIZE},
        error::Error,
        Key, Value,
    },
    stats::TableStats,
};

use std::sync::atomic::{self, AtomicBool, AtomicU64, Ordering};

use crossbeam_epoch::{Atomic, Guard, Owned, Shared};
use crossbeam_utils::CachePadded;

/// The shared state of a level hash table.
///
/// All operations take the id of the calling worker. The id only matters to
/// the resize barrier and to the log.
pub(crate) struct RawTable {
    name: Option<String>,
    hasher: LevelHasher,
    // Swapped only by a resize round, which runs while every worker is parked
    // at the barrier. Readers outside the workers may still hold the old
    // levels, so they are reclaimed through the epoch.
    levels: Atomic<Levels>,
    key_locks: KeyLocks,
    need_resizing: CachePadded<AtomicBool>,
    level_resize: AtomicU64,
    barrier: ResizeBarrier,
    thread_count: usize,
    check_duplicates: bool,
}

impl Drop for RawTable {
    fn drop(&mut self) {
        let guard = unsafe { crossbeam_epoch::unprotected() };
        atomic::fence(Ordering::Acquire);

        let current = self.levels.swap(Shared::null(), Ordering::Relaxed, guard);
        if !current.is_null() {
            // SAFETY: `&mut self` means no other thread can reach the levels,
            // and a retired pair was handed to the epoch, never kept here.
            drop(unsafe { current.into_owned() });
        }
    }
}

impl RawTable {
    pub(crate) fn new(
        name: Option<String>,
        level_size: u32,
        thread_count: usize,
        hasher: LevelHasher,
        check_duplicates: bool,
    ) -> Result<Self, Error> {
        if !(MIN_LEVEL_SIZE..=MAX_LEVEL_SIZE).contains(&level_size) {
            return Err(Error::InvalidLevelSize(level_size));
        }
        if thread_count == 0 {
            return Err(Error::InvalidThreadCount);
        }

        let levels = Levels::new(level_size)?;

        #[cfg(feature = "logging")]
        log::debug!(
            "{}Created a level hash table: {} top-level buckets, {} buckets in total, \
            {} threads",
            name.as_ref()
                .map(|name| format!("[{name}] "))
                .unwrap_or_default(),
            levels.addr_capacity(),
            levels.total_capacity(),
            thread_count
        );

        Ok(Self {
            name,
            hasher,
            levels: Atomic::new(levels),
            key_locks: KeyLocks::default(),
            need_resizing: CachePadded::new(AtomicBool::new(false)),
            level_resize: AtomicU64::new(0),
            barrier: ResizeBarrier::new(thread_count),
            thread_count,
            check_duplicates,
        })
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub(crate) fn registered_workers(&self) -> usize {
        self.barrier.participants()
    }

    pub(crate) fn seeds(&self) -> (u64, u64) {
        self.hasher.seeds()
    }

    pub(crate) fn level_size(&self) -> u32 {
        self.with_levels(Levels::level_size)
    }

    pub(crate) fn addr_capacity(&self) -> usize {
        self.with_levels(Levels::addr_capacity)
    }

    pub(crate) fn total_capacity(&self) -> usize {
        self.with_levels(Levels::total_capacity)
    }

    pub(crate) fn resize_count(&self) -> u64 {
        self.level_resize.load(Ordering::Acquire)
    }

    pub(crate) fn register(&self) -> Result<usize, Error> {
        let id = self.barrier.register()?;
        #[cfg(feature = "logging")]
        log::trace!("{}Worker {id} registered", self.log_prefix());
        Ok(id)
    }

    pub(crate) fn deregister(&self, worker: usize) {
        let _outcome = self.barrier.deregister(worker, || self.resize(worker));
        #[cfg(feature = "logging")]
        {
            log::trace!("{}Worker {worker} left", self.log_prefix());
            if _outcome.is_some() {
                log::debug!(
                    "{}Worker {worker} completed a pending resize round on leaving",
                    self.log_prefix()
                );
            }
        }
    }

    pub(crate) fn query(&self, key: &Key, worker: usize) -> Result<Value, Error> {
        self.sync_resize(worker)?;

        let hashes = self.hasher.hashes(key);
        self.with_levels(|levels| levels.find_and(key, hashes, |slot| slot.value))
            .ok_or(Error::NotFound)
    }

    pub(crate) fn update(&self, key: &Key, value: &Value, worker: usize) -> Result<(), Error> {
        self.sync_resize(worker)?;

        let hashes = self.hasher.hashes(key);
        self.with_levels(|levels| levels.find_and(key, hashes, |slot| slot.value = *value))
            .ok_or(Error::NotFound)
    }

    pub(crate) fn delete(&self, key: &Key, worker: usize) -> Result<(), Error> {
        self.sync_resize(worker)?;

        let hashes = self.hasher.hashes(key);
        self.with_levels(|levels| levels.find_and(key, hashes, |slot| slot.clear()))
            .ok_or(Error::NotFound)
    }

    pub(crate) fn contains_key(&self, key: &Key, worker: usize) -> Result<bool, Error> {
        self.sync_resize(worker)?;

        let hashes = self.hasher.hashes(key);
        Ok(self
            .with_levels(|levels| levels.find_and(key, hashes, |_| ()))
            .is_some())
    }

    /// Inserts an item, resizing the table as often as needed to make room.
    ///
    /// With duplicate checking on, an existing item with the same key has its
    /// value overwritten instead. The key lock is held from the search until
    /// the item is placed, so concurrent inserts of one key never leave two
    /// copies behind. It is released before the worker waits at the barrier.
    pub(crate) fn insert(&self, key: &Key, value: &Value, worker: usize) -> Result<(), Error> {
        let hashes = self.hasher.hashes(key);

        loop {
            self.sync_resize(worker)?;

            let placed = self.with_levels(|levels| {
                let _key_lock = self.check_duplicates.then(|| self.key_locks.lock(hashes));

                if self.check_duplicates
                    && levels
                        .find_and(key, hashes, |slot| slot.value = *value)
                        .is_some()
                {
                    return true;
                }

                let bottom_to_top = self.level_resize.load(Ordering::Acquire) > 0;
                levels.place(&self.hasher, &self.key_locks, key, value, hashes, bottom_to_top)
            });
            if placed {
                return Ok(());
            }

            self.need_resizing.store(true, Ordering::Release);
        }
    }

    /// Forces one resize round.
    pub(crate) fn expand(&self, worker: usize) -> Result<(), Error> {
        self.need_resizing.store(true, Ordering::Release);
        self.sync_resize(worker)
    }

    pub(crate) fn statistics(&self) -> TableStats {
        self.with_levels(|levels| {
            let (level0, level1) = levels.occupied();
            let addr_capacity = levels.addr_capacity();

            let mut stats = TableStats::default();
            stats
                .set_geometry(
                    levels.level_size(),
                    addr_capacity,
                    levels.total_capacity() - addr_capacity,
                )
                .set_occupied(level0, level1)
                .set_resize_count(self.resize_count());
            stats
        })
    }

    fn with_levels<T>(&self, f: impl FnOnce(&Levels) -> T) -> T {
        let guard = &crossbeam_epoch::pin();
        f(self.current_levels(guard))
    }

    #[inline]
    fn current_levels<'g>(&self, guard: &'g Guard) -> &'g Levels {
        let current = self.levels.load(Ordering::Acquire, guard);
        // SAFETY: The pointer is only null once the table is being dropped,
        // and a swapped out pair is destroyed through `guard`'s epoch.
        unsafe { current.deref() }
    }

    #[inline]
    fn sync_resize(&self, worker: usize) -> Result<(), Error> {
        if self.need_resizing.load(Ordering::Acquire) {
            self.barrier.cross(|| self.resize(worker))
        } else {
            Ok(())
        }
    }

    // Runs inside a barrier round, so no worker is in the middle of an
    // operation and nothing else swaps the levels.
    fn resize(&self, _worker: usize) -> Result<(), Error> {
        #[cfg(feature = "logging")]
        let started = std::time::Instant::now();

        let guard = &crossbeam_epoch::pin();
        let current = self.current_levels(guard);
        let result = current.grow(&self.hasher);
        self.need_resizing.store(false, Ordering::Release);

        match result {
            Ok((grown, _migrated)) => {
                #[cfg(feature = "logging")]
                let (_level_size, _addr_capacity, _total_capacity) = (
                    grown.level_size(),
                    grown.addr_capacity(),
                    grown.total_capacity(),
                );

                let old = self.levels.swap(Owned::new(grown), Ordering::AcqRel, guard);
                // SAFETY: `old` is unreachable from the table now, and readers
                // that loaded it before the swap are pinned.
                unsafe { guard.defer_destroy(old) };

                let _rounds = self.level_resize.fetch_add(1, Ordering::AcqRel) + 1;
                #[cfg(feature = "logging")]
                log::info!(
                    "{}Worker {_worker} resized the table (round {_rounds}): level size \
                    {_level_size}, {_addr_capacity} top-level buckets, {_total_capacity} \
                    buckets in total, {_migrated} items migrated in {:?}",
                    self.log_prefix(),
                    started.elapsed()
                );
                Ok(())
            }
            Err(e) => {
                #[cfg(feature = "logging")]
                log::error!(
                    "{}Worker {_worker} failed to resize the table at level size {}: {e}",
                    self.log_prefix(),
                    current.level_size()
                );
                Err(e)
            }
        }
    }

    #[cfg(feature = "logging")]
    fn log_prefix(&self) -> String {
        self.name
            .as_ref()
            .map(|name| format!("[{name}] "))
            .unwrap_or_default()
    }
}
