//! Provides a thread-safe level hash table and the workers that operate on it.

mod builder;
mod table;
mod worker;

pub use {builder::LevelHashBuilder, table::LevelHash, worker::Worker};
