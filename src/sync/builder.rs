use super::LevelHash;
use crate::{
    common::{
        constants::{DEFAULT_LEVEL_SIZE, DEFAULT_THREAD_COUNT},
        error::Error,
    },
    level::{hasher::LevelHasher, raw::RawTable},
};

/// Builds a [`LevelHash`][table-struct] with various configuration knobs.
///
/// [table-struct]: ./struct.LevelHash.html
///
/// # Examples
///
/// ```rust
/// use levelhash::sync::LevelHashBuilder;
///
/// let table = LevelHashBuilder::new(8) // 256 top-level buckets
///     // Up to four threads will use the table at the same time.
///     .thread_count(4)
///     // Prefix every log line of this table with "[sessions] ".
///     .name("sessions")
///     // Create the table.
///     .build()
///     .unwrap();
///
/// assert_eq!(table.addr_capacity(), 256);
/// assert_eq!(table.total_capacity(), 384);
/// ```
///
#[must_use]
pub struct LevelHashBuilder {
    name: Option<String>,
    level_size: u32,
    thread_count: usize,
    seeds: Option<(u64, u64)>,
    check_duplicates: bool,
}

impl Default for LevelHashBuilder {
    fn default() -> Self {
        Self {
            name: None,
            level_size: DEFAULT_LEVEL_SIZE,
            thread_count: DEFAULT_THREAD_COUNT,
            seeds: None,
            check_duplicates: true,
        }
    }
}

impl LevelHashBuilder {
    /// Construct a new `LevelHashBuilder` for a table whose top level has
    /// `2^level_size` buckets.
    pub fn new(level_size: u32) -> Self {
        Self {
            level_size,
            ..Default::default()
        }
    }

    /// Sets the name of the table. The name shows up in log messages.
    pub fn name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Sets the level size exponent.
    pub fn level_size(self, level_size: u32) -> Self {
        Self { level_size, ..self }
    }

    /// Sets how many workers may be registered at the same time.
    pub fn thread_count(self, thread_count: usize) -> Self {
        Self {
            thread_count,
            ..self
        }
    }

    /// Sets the seeds of the two hash functions instead of drawing them from
    /// the operating system. The seeds must differ.
    ///
    /// Fixed seeds make bucket placement reproducible, which is mostly useful
    /// in tests.
    pub fn seeds(self, first: u64, second: u64) -> Self {
        Self {
            seeds: Some((first, second)),
            ..self
        }
    }

    /// Sets whether `insert` looks for an existing item with the same key
    /// and overwrites its value. Defaults to `true`.
    ///
    /// With `false`, `insert` always stores a new item, so inserting a key
    /// twice leaves two items behind, and lookups see whichever comes first
    /// in probe order.
    pub fn check_duplicates(self, check_duplicates: bool) -> Self {
        Self {
            check_duplicates,
            ..self
        }
    }

    /// Builds a `LevelHash`.
    ///
    /// # Errors
    ///
    /// Fails when the level size is out of range, the thread count is zero,
    /// the given seeds are equal, no seeds could be drawn from the operating
    /// system, or the levels could not be allocated.
    pub fn build(self) -> Result<LevelHash, Error> {
        let hasher = match self.seeds {
            Some((first, second)) => LevelHasher::with_seeds(first, second)?,
            None => LevelHasher::random()?,
        };

        RawTable::new(
            self.name,
            self.level_size,
            self.thread_count,
            hasher,
            self.check_duplicates,
        )
        .map(LevelHash::from_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::LevelHashBuilder;
    use crate::common::{
        constants::{DEFAULT_LEVEL_SIZE, MAX_LEVEL_SIZE},
        error::Error,
    };

    #[test]
    fn build_with_defaults() {
        let table = LevelHashBuilder::default().build().unwrap();
        assert_eq!(table.level_size(), DEFAULT_LEVEL_SIZE);
        assert_eq!(table.thread_count(), 1);
        assert_eq!(table.name(), None);
        let (first, second) = table.seeds();
        assert_ne!(first, second);
    }

    #[test]
    fn build_with_everything() {
        let table = LevelHashBuilder::new(3)
            .name("tiny")
            .thread_count(2)
            .seeds(7, 11)
            .check_duplicates(false)
            .build()
            .unwrap();

        assert_eq!(table.name(), Some("tiny"));
        assert_eq!(table.level_size(), 3);
        assert_eq!(table.addr_capacity(), 8);
        assert_eq!(table.total_capacity(), 12);
        assert_eq!(table.thread_count(), 2);
        assert_eq!(table.seeds(), (7, 11));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let result = LevelHashBuilder::new(MAX_LEVEL_SIZE + 1).build();
        assert!(matches!(result, Err(Error::InvalidLevelSize(_))));

        let result = LevelHashBuilder::new(4).thread_count(0).build();
        assert!(matches!(result, Err(Error::InvalidThreadCount)));

        let result = LevelHashBuilder::new(4).seeds(5, 5).build();
        assert!(matches!(result, Err(Error::InvalidSeeds)));
    }
}
