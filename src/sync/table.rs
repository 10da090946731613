use super::{LevelHashBuilder, Worker};
use crate::{common::error::Error, level::raw::RawTable, stats::TableStats};

use std::fmt::{self, Debug};

/// A thread-safe, resizable hash table for fixed-size keys and values, built
/// on the level hashing scheme.
///
/// Items live in one of two levels of buckets. The top level has `2^L`
/// buckets and the bottom level half as many. Every key has two candidate
/// buckets in each level, chosen by two independent hash functions. When no
/// candidate has room, even after moving an item out of the way, the table
/// grows: a new top level twice the size is allocated, only the bottom
/// level's items are rehashed into it, and the old top level becomes the new
/// bottom level.
///
/// All item operations go through a [`Worker`][worker-struct] obtained from
/// [`register`](#method.register). At most `thread_count` workers may be
/// registered at once.
///
/// # Example
///
/// ```rust
/// use levelhash::sync::LevelHash;
///
/// let table = LevelHash::create(4, 2).unwrap();
///
/// std::thread::scope(|s| {
///     for t in 0..2u8 {
///         let table = &table;
///         s.spawn(move || {
///             let worker = table.register().unwrap();
///             for i in 0..100u8 {
///                 worker.insert(&[t, i], &[i]).unwrap();
///             }
///         });
///     }
/// });
///
/// let worker = table.register().unwrap();
/// assert_eq!(worker.query(&[1, 42]).unwrap()[0], 42);
/// assert_eq!(table.len(), 200);
/// ```
///
/// [worker-struct]: ./struct.Worker.html
pub struct LevelHash {
    inner: RawTable,
}

impl Debug for LevelHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelHash")
            .field("name", &self.name())
            .field("level_size", &self.level_size())
            .field("thread_count", &self.thread_count())
            .field("registered_workers", &self.registered_workers())
            .field("resize_count", &self.resize_count())
            .finish()
    }
}

impl LevelHash {
    /// Creates a table whose top level has `2^level_size` buckets, to be used
    /// by at most `thread_count` threads at a time.
    ///
    /// To set other properties, use [`builder`](#method.builder).
    pub fn create(level_size: u32, thread_count: usize) -> Result<Self, Error> {
        LevelHashBuilder::new(level_size)
            .thread_count(thread_count)
            .build()
    }

    /// Returns a [`LevelHashBuilder`][builder-struct], which can build a
    /// `LevelHash` with various configuration knobs.
    ///
    /// [builder-struct]: ./struct.LevelHashBuilder.html
    pub fn builder() -> LevelHashBuilder {
        LevelHashBuilder::default()
    }

    pub(crate) fn from_raw(inner: RawTable) -> Self {
        Self { inner }
    }

    /// Registers the calling thread and returns its worker.
    ///
    /// # Errors
    ///
    /// Fails with `TooManyWorkers` when `thread_count` workers are already
    /// registered.
    pub fn register(&self) -> Result<Worker<'_>, Error> {
        Worker::new(&self.inner)
    }

    /// Returns the name given with [`LevelHashBuilder::name`], if any.
    ///
    /// [`LevelHashBuilder::name`]: ./struct.LevelHashBuilder.html#method.name
    pub fn name(&self) -> Option<&str> {
        self.inner.name()
    }

    /// Returns the current level size exponent.
    pub fn level_size(&self) -> u32 {
        self.inner.level_size()
    }

    /// Returns the number of top-level buckets.
    pub fn addr_capacity(&self) -> usize {
        self.inner.addr_capacity()
    }

    /// Returns the number of buckets in both levels.
    pub fn total_capacity(&self) -> usize {
        self.inner.total_capacity()
    }

    /// Returns the number of completed resize rounds.
    pub fn resize_count(&self) -> u64 {
        self.inner.resize_count()
    }

    /// Returns the maximum number of workers that can be registered at the
    /// same time.
    pub fn thread_count(&self) -> usize {
        self.inner.thread_count()
    }

    /// Returns the number of workers currently registered. This is the
    /// number of workers every resize round waits for.
    pub fn registered_workers(&self) -> usize {
        self.inner.registered_workers()
    }

    /// Returns the seeds of the two hash functions.
    pub fn seeds(&self) -> (u64, u64) {
        self.inner.seeds()
    }

    /// Takes an occupancy snapshot by visiting every slot.
    pub fn statistics(&self) -> TableStats {
        self.inner.statistics()
    }

    /// Returns the number of stored items. Walks the whole table.
    pub fn len(&self) -> usize {
        self.statistics().occupied() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops the table and all its items.
    ///
    /// Outstanding workers borrow the table, so they are all gone by the time
    /// this can be called.
    pub fn destroy(self) {
        #[cfg(feature = "logging")]
        log::debug!(
            "{}Destroying the table: {} items, level size {}",
            self.name().map(|n| format!("[{n}] ")).unwrap_or_default(),
            self.len(),
            self.level_size()
        );
    }
}
