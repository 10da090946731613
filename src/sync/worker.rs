use crate::{
    common::{error::Error, pad_key, pad_value, Value},
    level::raw::RawTable,
};

use std::{
    cell::Cell,
    fmt::{self, Debug},
    marker::PhantomData,
};

/// A registered handle that performs operations on a
/// [`LevelHash`][table-struct].
///
/// Every thread that uses the table holds its own `Worker`. A worker takes
/// part in the table's resize rounds. When an insertion runs out of room, the
/// table only grows once every live worker has reached the start of an
/// operation, so a worker that stays idle while others are inserting stalls
/// them. Drop workers that are done.
///
/// Keys and values are byte strings of up to [`KEY_LEN`][key-len] and
/// [`VALUE_LEN`][value-len] bytes. Shorter input is padded with zeros, so
/// `b"ab"` and `b"ab\0"` name the same key.
///
/// `Worker` can be sent to another thread but not shared between threads.
///
/// [table-struct]: ./struct.LevelHash.html
/// [key-len]: ../constants/constant.KEY_LEN.html
/// [value-len]: ../constants/constant.VALUE_LEN.html
pub struct Worker<'a> {
    table: &'a RawTable,
    id: usize,
    _not_sync: PhantomData<Cell<()>>,
}

impl Debug for Worker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker").field("id", &self.id).finish()
    }
}

impl Drop for Worker<'_> {
    fn drop(&mut self) {
        self.table.deregister(self.id);
    }
}

impl<'a> Worker<'a> {
    pub(crate) fn new(table: &'a RawTable) -> Result<Self, Error> {
        let id = table.register()?;
        Ok(Self {
            table,
            id,
            _not_sync: PhantomData,
        })
    }

    /// Returns the id of this worker, unique among the live workers of the
    /// table.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Inserts a key-value pair, growing the table as often as needed.
    ///
    /// If the table checks for duplicates (the default), an existing item with
    /// the same key gets the new value instead.
    ///
    /// # Errors
    ///
    /// Fails with `KeyTooLong` or `ValueTooLong` on oversized input, and with
    /// the error of a resize round that could not complete.
    pub fn insert(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        let key = pad_key(key)?;
        let value = pad_value(value)?;
        self.table.insert(&key, &value, self.id)
    }

    /// Returns the value of `key`, padded to `VALUE_LEN` bytes.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` when no item has this key.
    pub fn query(&self, key: &[u8]) -> Result<Value, Error> {
        let key = pad_key(key)?;
        self.table.query(&key, self.id)
    }

    /// Replaces the value of an existing item.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` when no item has this key.
    pub fn update(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        let key = pad_key(key)?;
        let value = pad_value(value)?;
        self.table.update(&key, &value, self.id)
    }

    /// Removes the first item with this key in probe order.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` when no item has this key.
    pub fn delete(&self, key: &[u8]) -> Result<(), Error> {
        let key = pad_key(key)?;
        self.table.delete(&key, self.id)
    }

    /// Returns `true` if the table holds an item with this key.
    ///
    /// Like `query`, this may miss an item that a concurrent insert is moving
    /// between buckets.
    ///
    /// # Errors
    ///
    /// Fails with `KeyTooLong` on an oversized key.
    pub fn contains_key(&self, key: &[u8]) -> Result<bool, Error> {
        let key = pad_key(key)?;
        self.table.contains_key(&key, self.id)
    }

    /// Grows the table by one level right away.
    ///
    /// Like a resize triggered by `insert`, this waits until every live worker
    /// has joined the round.
    pub fn expand(&self) -> Result<(), Error> {
        self.table.expand(self.id)
    }
}

#[cfg(test)]
mod tests {
    use crate::{common::error::Error, sync::LevelHash};

    #[test]
    fn ids_are_reused() {
        let table = LevelHash::create(4, 2).unwrap();

        let a = table.register().unwrap();
        let b = table.register().unwrap();
        assert_eq!((a.id(), b.id()), (0, 1));
        assert_eq!(
            table.register().map(|w| w.id()),
            Err(Error::TooManyWorkers(2))
        );

        drop(a);
        assert_eq!(table.registered_workers(), 1);
        let c = table.register().unwrap();
        assert_eq!(c.id(), 0);
    }

    #[test]
    fn oversized_input_is_rejected() {
        let table = LevelHash::create(4, 1).unwrap();
        let worker = table.register().unwrap();

        assert_eq!(
            worker.insert(&[1; 17], b"v"),
            Err(Error::KeyTooLong(17))
        );
        assert_eq!(
            worker.insert(b"k", &[1; 17]),
            Err(Error::ValueTooLong(17))
        );
        assert_eq!(worker.query(&[0; 20]), Err(Error::KeyTooLong(20)));
        assert!(table.is_empty());
    }

    #[test]
    fn short_keys_are_zero_padded() {
        let table = LevelHash::create(4, 1).unwrap();
        let worker = table.register().unwrap();

        worker.insert(b"ab", b"v").unwrap();
        assert_eq!(worker.contains_key(b"ab\0\0"), Ok(true));
        assert_eq!(&worker.query(b"ab").unwrap()[..2], b"v\0");
    }
}
