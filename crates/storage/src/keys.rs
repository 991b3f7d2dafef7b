//! Composite key encoding for ledger records.
//!
//! A [`CompositeKey`] is an ordered tuple of a record kind followed by one or
//! more identifying components. Each segment is written as a big-endian `u32`
//! length followed by its UTF-8 bytes, so:
//!
//! - `("Contract", "1", "2")` and `("Contract", "12")` never collide
//! - a partial key is a byte prefix of exactly the keys that extend it
//!
//! Partial keys are scanned with [`CompositeKey::prefix_range`].
//!
//! # Example
//!
//! ```
//! use beatchain_storage::CompositeKey;
//!
//! let key = CompositeKey::new("Contract").with("1").with("2").with("3");
//! let decoded = CompositeKey::decode(&key.encode()).unwrap();
//! assert_eq!(decoded, key);
//! assert_eq!(decoded.to_string(), "Contract~1~2~3");
//! ```

use std::{fmt, ops::Bound};

use crate::error::{StorageError, StorageResult};

const LENGTH_PREFIX: usize = std::mem::size_of::<u32>();

/// An ordered `(kind, components...)` tuple addressing one record or a
/// family of records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    kind: String,
    components: Vec<String>,
}

impl CompositeKey {
    /// Creates a key holding only the record kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), components: Vec::new() }
    }

    /// Appends an identifying component.
    pub fn push(&mut self, component: impl Into<String>) {
        self.components.push(component.into());
    }

    /// Builder-style [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, component: impl Into<String>) -> Self {
        self.push(component);
        self
    }

    /// Returns the record kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the identifying components in order.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Encodes the key as length-prefixed segments.
    pub fn encode(&self) -> Vec<u8> {
        let capacity = std::iter::once(&self.kind)
            .chain(&self.components)
            .map(|s| LENGTH_PREFIX + s.len())
            .sum();
        let mut out = Vec::with_capacity(capacity);
        for segment in std::iter::once(&self.kind).chain(&self.components) {
            // Segments are short identifiers; a 4 GiB segment is not representable.
            out.extend_from_slice(&(segment.len() as u32).to_be_bytes());
            out.extend_from_slice(segment.as_bytes());
        }
        out
    }

    /// Decodes a key produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if the bytes are empty, a
    /// length prefix is truncated or overruns the buffer, or a segment is not
    /// valid UTF-8.
    pub fn decode(bytes: &[u8]) -> StorageResult<Self> {
        let mut segments = Vec::new();
        let mut rest = bytes;
        while !rest.is_empty() {
            let Some((len_bytes, tail)) = rest.split_first_chunk::<LENGTH_PREFIX>() else {
                return Err(StorageError::serialization(format!(
                    "truncated length prefix in composite key {}",
                    hex::encode(bytes)
                )));
            };
            let len = u32::from_be_bytes(*len_bytes) as usize;
            if tail.len() < len {
                return Err(StorageError::serialization(format!(
                    "segment overruns composite key {}",
                    hex::encode(bytes)
                )));
            }
            let (segment, tail) = tail.split_at(len);
            let segment = std::str::from_utf8(segment).map_err(|e| {
                StorageError::serialization_with_source("composite key segment is not UTF-8", e)
            })?;
            segments.push(segment.to_owned());
            rest = tail;
        }

        let mut segments = segments.into_iter();
        let kind = segments
            .next()
            .ok_or_else(|| StorageError::serialization("empty composite key"))?;
        Ok(Self { kind, components: segments.collect() })
    }

    /// Returns the byte range covering this key and every key extending it.
    ///
    /// The start bound is the encoded key itself; the end bound is the
    /// smallest byte string greater than every extension.
    pub fn prefix_range(&self) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
        let start = self.encode();
        let end = match prefix_successor(&start) {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        (Bound::Included(start), end)
    }

    /// Hex rendering of the encoded bytes, used in log fields.
    pub fn to_hex(&self) -> String {
        hex::encode(self.encode())
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind)?;
        for component in &self.components {
            write!(f, "~{component}")?;
        }
        Ok(())
    }
}

/// Smallest byte string strictly greater than every string starting with
/// `prefix`, or `None` when the prefix is all `0xFF`.
fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}
