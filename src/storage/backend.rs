//! Storage backend interface.
//!
//! The host ledger owns persistence; the oracle talks to it through
//! [`StorageBackend`]. [`InMemoryStore`] is the reference implementation
//! used by tests and the CLI. Prefix scans always return entries in
//! ascending key order, which keeps aggregation deterministic across nodes.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// STORAGE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Raw key-value entry
pub type Entry = (Vec<u8>, Vec<u8>);

/// Ordered byte key-value store provided by the host
pub trait StorageBackend: Send + Sync {
    /// Value under `key`
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Insert or replace
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove `key`, returning whether it was present
    fn delete(&self, key: &[u8]) -> Result<bool>;

    /// Every entry whose key starts with `prefix`, ascending by key
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<Entry>>;

    /// Whether `key` is present
    fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// BTreeMap-backed store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> Error {
    Error::Storage(format!("store lock poisoned: {}", e))
}

impl StorageBackend for InMemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        Ok(self.entries.write().map_err(poisoned)?.remove(key).is_some())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<Entry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPED STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Bincode-encoded values over a [`StorageBackend`].
///
/// Scans hand back keys with the scanned prefix already stripped.
pub struct TypedStore<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> TypedStore<B> {
    /// Wrap a backend
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Decode the value under `key`
    pub fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        self.backend
            .get(key)?
            .map(|bytes| decode(key, &bytes))
            .transpose()
    }

    /// Encode and store a value
    pub fn set<T: Serialize>(&self, key: &[u8], value: &T) -> Result<()> {
        let bytes = bincode::serialize(value)
            .map_err(|e| Error::Serialization(format!("{}: {}", show_key(key), e)))?;
        self.backend.set(key, &bytes)
    }

    /// Remove a value
    pub fn delete(&self, key: &[u8]) -> Result<bool> {
        self.backend.delete(key)
    }

    /// Whether a value is stored
    pub fn has(&self, key: &[u8]) -> Result<bool> {
        self.backend.has(key)
    }

    /// Decode every value under `prefix`, paired with its key suffix
    pub fn scan<T: DeserializeOwned>(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, T)>> {
        self.backend
            .scan_prefix(prefix)?
            .into_iter()
            .map(|(key, bytes)| {
                let value = decode(&key, &bytes)?;
                Ok((key[prefix.len()..].to_vec(), value))
            })
            .collect()
    }

    /// Key suffixes under `prefix`, without decoding values
    pub fn keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        Ok(self
            .backend
            .scan_prefix(prefix)?
            .into_iter()
            .map(|(key, _)| key[prefix.len()..].to_vec())
            .collect())
    }

    /// Delete everything under `prefix`, returning how many entries went
    pub fn clear_prefix(&self, prefix: &[u8]) -> Result<usize> {
        let entries = self.backend.scan_prefix(prefix)?;
        for (key, _) in &entries {
            self.backend.delete(key)?;
        }
        Ok(entries.len())
    }
}

fn decode<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes)
        .map_err(|e| Error::Deserialization(format!("{}: {}", show_key(key), e)))
}

/// Printable form of a key: the ASCII prefix followed by the hex suffix
fn show_key(key: &[u8]) -> String {
    match key.iter().position(|b| *b == b':') {
        Some(i) => format!(
            "{}{}",
            String::from_utf8_lossy(&key[..=i]),
            hex::encode(&key[i + 1..])
        ),
        None => hex::encode(key),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY PREFIXES
// ═══════════════════════════════════════════════════════════════════════════════

/// Key prefixes, one per oracle collection
pub mod prefixes {
    /// Feeder delegation by validator
    pub const FEEDER_DELEGATION: &[u8] = b"fdr:";
    /// Aggregate prevote by validator
    pub const PREVOTE: &[u8] = b"pvt:";
    /// Aggregate vote by validator
    pub const VOTE: &[u8] = b"vot:";
    /// Required denom set membership
    pub const REQUIRED_DENOM: &[u8] = b"dnm:";
    /// Published exchange rate by denom
    pub const EXCHANGE_RATE: &[u8] = b"rte:";
    /// Miss counter by validator
    pub const MISS_COUNTER: &[u8] = b"mis:";
    /// Oracle params
    pub const PARAMS: &[u8] = b"prm:";
}

/// `prefix ++ suffix`
pub fn make_key(prefix: &[u8], suffix: &[u8]) -> Vec<u8> {
    [prefix, suffix].concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryStore::new();

        store.set(b"pvt:a", b"1").unwrap();
        assert_eq!(store.get(b"pvt:a").unwrap(), Some(b"1".to_vec()));
        assert!(store.has(b"pvt:a").unwrap());
        assert!(!store.has(b"pvt:b").unwrap());

        assert!(store.delete(b"pvt:a").unwrap());
        assert!(!store.delete(b"pvt:a").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_scan_is_sorted_and_bounded() {
        let store = InMemoryStore::new();

        store.set(b"vot:c", b"3").unwrap();
        store.set(b"vot:a", b"1").unwrap();
        store.set(b"vot:b", b"2").unwrap();
        store.set(b"vou:a", b"x").unwrap();
        store.set(b"pvt:a", b"y").unwrap();

        let keys: Vec<_> = store
            .scan_prefix(b"vot:")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"vot:a".to_vec(), b"vot:b".to_vec(), b"vot:c".to_vec()]);
    }

    #[test]
    fn test_typed_scan_strips_prefix() {
        let store = TypedStore::new(InMemoryStore::new());
        store.set(&make_key(prefixes::MISS_COUNTER, &[2]), &7u64).unwrap();
        store.set(&make_key(prefixes::MISS_COUNTER, &[1]), &3u64).unwrap();
        store.set(&make_key(prefixes::VOTE, &[1]), &9u64).unwrap();

        let counters: Vec<(Vec<u8>, u64)> = store.scan(prefixes::MISS_COUNTER).unwrap();
        assert_eq!(counters, vec![(vec![1], 3), (vec![2], 7)]);
        assert_eq!(store.keys(prefixes::VOTE).unwrap(), vec![vec![1]]);
    }

    #[test]
    fn test_clear_prefix() {
        let store = TypedStore::new(InMemoryStore::new());
        store.set(&make_key(prefixes::VOTE, b"a"), &1u64).unwrap();
        store.set(&make_key(prefixes::VOTE, b"b"), &2u64).unwrap();
        store.set(&make_key(prefixes::PREVOTE, b"a"), &3u64).unwrap();

        assert_eq!(store.clear_prefix(prefixes::VOTE).unwrap(), 2);
        assert!(store.keys(prefixes::VOTE).unwrap().is_empty());
        assert_eq!(store.keys(prefixes::PREVOTE).unwrap().len(), 1);
    }

    #[test]
    fn test_decode_error_names_key() {
        let backend = InMemoryStore::new();
        backend.set(b"prm:", &[1]).unwrap();
        let store = TypedStore::new(backend);

        let err = store.get::<String>(b"prm:").unwrap_err();
        assert!(matches!(err, Error::Deserialization(msg) if msg.starts_with("prm:")));
    }
}
