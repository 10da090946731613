pub mod constants;
pub(crate) mod error;

use self::{
    constants::{KEY_LEN, VALUE_LEN},
    error::Error,
};

/// A key as stored in a slot.
pub type Key = [u8; KEY_LEN];

/// A value as stored in a slot.
pub type Value = [u8; VALUE_LEN];

/// Copies `key` into a zero-padded fixed-size buffer.
pub(crate) fn pad_key(key: &[u8]) -> Result<Key, Error> {
    if key.len() > KEY_LEN {
        return Err(Error::KeyTooLong(key.len()));
    }
    let mut buf = [0u8; KEY_LEN];
    buf[..key.len()].copy_from_slice(key);
    Ok(buf)
}

/// Copies `value` into a zero-padded fixed-size buffer.
pub(crate) fn pad_value(value: &[u8]) -> Result<Value, Error> {
    if value.len() > VALUE_LEN {
        return Err(Error::ValueTooLong(value.len()));
    }
    let mut buf = [0u8; VALUE_LEN];
    buf[..value.len()].copy_from_slice(value);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_input_with_zeros() {
        let key = pad_key(b"42").unwrap();
        assert_eq!(&key[..2], b"42");
        assert!(key[2..].iter().all(|b| *b == 0));

        let value = pad_value(b"").unwrap();
        assert_eq!(value, [0u8; VALUE_LEN]);
    }

    #[test]
    fn rejects_oversized_input() {
        let long = [b'x'; KEY_LEN + 1];
        assert_eq!(pad_key(&long), Err(Error::KeyTooLong(KEY_LEN + 1)));

        let long = [b'x'; VALUE_LEN + 3];
        assert_eq!(pad_value(&long), Err(Error::ValueTooLong(VALUE_LEN + 3)));

        // Exactly the fixed length is fine.
        assert!(pad_key(&[1u8; KEY_LEN]).is_ok());
    }
}
