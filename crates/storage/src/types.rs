//! Entries returned by range scans.

use bytes::Bytes;

use crate::{error::StorageResult, keys::CompositeKey};

/// One committed entry: an encoded [`CompositeKey`] and the record bytes
/// stored under it.
///
/// # Examples
///
/// ```
/// use beatchain_storage::{CompositeKey, KeyValue};
///
/// let key = CompositeKey::new("BankAccount").with("1");
/// let kv = KeyValue::new(key.encode().into(), r#"{"balance":"0.00"}"#.into());
/// assert_eq!(kv.composite_key().unwrap(), key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// Encoded key bytes.
    pub key: Bytes,
    /// Record bytes.
    pub value: Bytes,
}

impl KeyValue {
    /// Pairs a key with its value.
    pub fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }

    /// Decodes [`key`](Self::key) back into its composite form.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the key was not produced by
    /// [`CompositeKey::encode`].
    pub fn composite_key(&self) -> StorageResult<CompositeKey> {
        CompositeKey::decode(&self.key)
    }
}
