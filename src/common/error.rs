use crate::common::constants::{KEY_LEN, MAX_LEVEL_SIZE, MIN_LEVEL_SIZE, VALUE_LEN};

/// The error type returned by [`LevelHash`][table-struct] and its
/// [`Worker`][worker-struct]s.
///
/// Only [`NotFound`](#variant.NotFound) is part of normal operation. A full
/// table is never reported here; an insert that runs out of room triggers a
/// resize round and retries.
///
/// [table-struct]: ./sync/struct.LevelHash.html
/// [worker-struct]: ./sync/struct.Worker.html
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No slot in either level holds the given key.
    #[error("key not found")]
    NotFound,

    /// A key longer than the fixed key length was given.
    #[error("key is {0} bytes long, but at most {} bytes are allowed", KEY_LEN)]
    KeyTooLong(usize),

    /// A value longer than the fixed value length was given.
    #[error("value is {0} bytes long, but at most {} bytes are allowed", VALUE_LEN)]
    ValueTooLong(usize),

    /// A level could not be allocated, either at creation time or while
    /// growing the top level in a resize round.
    #[error("failed to allocate a level of {buckets} buckets")]
    AllocationFailure {
        /// The number of buckets requested.
        buckets: usize,
    },

    /// An item migrated out of the bottom level found no free slot in either
    /// of its candidate buckets of the new top level.
    ///
    /// The resize round is abandoned and the table keeps its previous
    /// geometry, so no item is lost.
    #[error(
        "rehash found no free slot for a migrated item \
    in top-level buckets {first} and {second}"
    )]
    RehashInvariantViolation {
        /// The first candidate bucket index in the new top level.
        first: usize,
        /// The second candidate bucket index in the new top level.
        second: usize,
    },

    /// The level size exponent is outside `MIN_LEVEL_SIZE..=MAX_LEVEL_SIZE`.
    #[error(
        "level size must be between {} and {}, but {0} was given",
        MIN_LEVEL_SIZE,
        MAX_LEVEL_SIZE
    )]
    InvalidLevelSize(u32),

    /// The table was configured for zero threads.
    #[error("thread count must be greater than zero")]
    InvalidThreadCount,

    /// The two hash seeds are equal, so the two hash functions would not be
    /// independent.
    #[error("the two hash seeds must differ")]
    InvalidSeeds,

    /// Every worker slot of the table is already taken.
    #[error("all {0} workers of this table are already registered")]
    TooManyWorkers(usize),

    /// The OS entropy source could not provide hash seeds.
    #[error("failed to generate hash seeds: {0}")]
    SeedGeneration(String),
}
