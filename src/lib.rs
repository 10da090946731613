#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

//! Levelhash is a concurrent, resizable hash table for Rust, based on the
//! level hashing scheme.
//!
//! The table stores fixed-size records: keys and values of up to
//! [`KEY_LEN`][key-len] and [`VALUE_LEN`][value-len] bytes. It is organized as
//! two levels of buckets, each bucket holding [`ASSOC_NUM`][assoc-num] slots.
//! Every key has two candidate buckets per level. Lookups therefore touch at
//! most four buckets, and a resize only rehashes the items of the smaller
//! bottom level.
//!
//! # Features
//!
//! - Fine-grained locking: every slot has its own lock, so threads working on
//!   different slots never wait for each other.
//! - In-place growth: the table doubles its top level when an insertion finds
//!   no room, and keeps its old top level as the new bottom level.
//! - Coordinated resizing: the registered [`Worker`][worker-struct]s of a
//!   table meet at a barrier, where exactly one of them grows the table while
//!   the others wait.
//! - Optional logging through the [log][log-crate] crate, with the table's
//!   name as a prefix.
//!
//! [key-len]: ./constants/constant.KEY_LEN.html
//! [value-len]: ./constants/constant.VALUE_LEN.html
//! [assoc-num]: ./constants/constant.ASSOC_NUM.html
//! [worker-struct]: ./sync/struct.Worker.html
//! [log-crate]: https://crates.io/crates/log
//!
//! # Example
//!
//! ```rust
//! use levelhash::{sync::LevelHash, Error};
//!
//! let table = LevelHash::builder()
//!     .level_size(4)
//!     .thread_count(2)
//!     .name("users")
//!     .build()?;
//!
//! let worker = table.register()?;
//! worker.insert(b"alice", b"admin")?;
//! assert_eq!(&worker.query(b"alice")?[..5], b"admin");
//!
//! worker.update(b"alice", b"guest")?;
//! worker.delete(b"alice")?;
//! assert_eq!(worker.query(b"alice"), Err(Error::NotFound));
//! # Ok::<(), Error>(())
//! ```
//!
//! # Minimum Supported Rust Versions
//!
//! This crate's minimum supported Rust version (MSRV) is 1.65.

pub(crate) mod common;
pub(crate) mod level;
pub mod stats;
pub mod sync;

pub use common::{constants, error::Error, Key, Value};
pub use stats::TableStats;
pub use sync::{LevelHash, LevelHashBuilder, Worker};
