//! Fixed sizes and limits of a level hash table.

/// The length of a key in bytes. Shorter keys are padded with zero bytes.
pub const KEY_LEN: usize = 16;

/// The length of a value in bytes. Shorter values are padded with zero bytes.
pub const VALUE_LEN: usize = 16;

/// The number of slots per bucket.
pub const ASSOC_NUM: usize = 4;

/// The smallest accepted level size exponent. The bottom level needs at
/// least two buckets so that its two candidate halves are non-empty.
pub const MIN_LEVEL_SIZE: u32 = 2;

/// The largest accepted level size exponent. The top level of such a table
/// already has 2^40 buckets, far beyond any realistic memory budget.
pub const MAX_LEVEL_SIZE: u32 = 40;

pub(crate) const DEFAULT_LEVEL_SIZE: u32 = 10;

pub(crate) const DEFAULT_THREAD_COUNT: usize = 1;
