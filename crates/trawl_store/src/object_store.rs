//! In-memory content-addressed object store.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use trawl_common::ContentHash;

use crate::error::StoreError;

/// Opaque reference to a byte sequence in an [`ObjectStore`].
///
/// Derived from the content hash of the bytes, so equal content always
/// yields an equal reference, across stores and across runs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct ObjectRef(ContentHash);

impl ObjectRef {
    /// Returns the content hash this reference is derived from.
    pub fn hash(self) -> ContentHash {
        self.0
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content-addressed blob store.
///
/// Inserts are idempotent: storing identical bytes twice, from any thread,
/// resolves to the identical [`ObjectRef`]. The map is guarded by a mutex so
/// that independent concurrent scans can safely share one store; content
/// addressing makes insert races harmless.
#[derive(Default)]
pub struct ObjectStore {
    objects: Mutex<HashMap<ContentHash, Vec<u8>>>,
}

impl ObjectStore {
    /// Creates an empty object store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a byte sequence and returns its content-addressed reference.
    pub fn store(&self, bytes: &[u8]) -> ObjectRef {
        let hash = ContentHash::from_bytes(bytes);
        let mut objects = self.objects.lock().unwrap();
        objects.entry(hash).or_insert_with(|| bytes.to_vec());
        ObjectRef(hash)
    }

    /// Returns the bytes for a reference, or `None` if the store has never
    /// seen that content.
    pub fn get(&self, r: ObjectRef) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(&r.0).cloned()
    }

    /// Returns `true` if the store holds content for the given reference.
    pub fn contains(&self, r: ObjectRef) -> bool {
        self.objects.lock().unwrap().contains_key(&r.0)
    }

    /// Returns the number of distinct objects held.
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Returns `true` if the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.lock().unwrap().is_empty()
    }

    /// Encodes a value with bincode and stores the encoding.
    ///
    /// The standard bincode configuration is byte-stable for a given value,
    /// so structurally equal values always produce the same reference.
    pub fn store_node<T: Serialize>(&self, value: &T) -> Result<ObjectRef, StoreError> {
        let bytes = bincode::serde::encode_to_vec(value, bincode::config::standard()).map_err(
            |e| StoreError::Serialization {
                reason: e.to_string(),
            },
        )?;
        Ok(self.store(&bytes))
    }

    /// Loads and decodes a value previously stored with [`store_node`](Self::store_node).
    pub fn load_node<T: DeserializeOwned>(&self, r: ObjectRef) -> Result<T, StoreError> {
        let bytes = self.get(r).ok_or_else(|| StoreError::MissingObject {
            hash: r.hash().to_string(),
        })?;
        let (value, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|e| StoreError::Serialization {
                reason: e.to_string(),
            })?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_is_idempotent() {
        let store = ObjectStore::new();
        let a = store.store(b"#pragma once");
        let b = store.store(b"#pragma once");
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn distinct_content_distinct_refs() {
        let store = ObjectStore::new();
        let a = store.store(b"int x;");
        let b = store.store(b"int y;");
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn get_round_trips() {
        let store = ObjectStore::new();
        let r = store.store(b"header bytes");
        assert_eq!(store.get(r).unwrap(), b"header bytes");
    }

    #[test]
    fn get_unknown_returns_none() {
        let store = ObjectStore::new();
        let other = ObjectStore::new();
        let r = other.store(b"elsewhere");
        assert!(store.get(r).is_none());
        assert!(!store.contains(r));
    }

    #[test]
    fn refs_stable_across_stores() {
        let a = ObjectStore::new();
        let b = ObjectStore::new();
        assert_eq!(a.store(b"same bytes"), b.store(b"same bytes"));
    }

    #[test]
    fn store_node_deterministic() {
        let store = ObjectStore::new();
        let a = store.store_node(&("a.h".to_string(), 42u32)).unwrap();
        let b = store.store_node(&("a.h".to_string(), 42u32)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn node_round_trips() {
        let store = ObjectStore::new();
        let value = (vec!["x".to_string()], 7u64);
        let r = store.store_node(&value).unwrap();
        let back: (Vec<String>, u64) = store.load_node(r).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn load_missing_node_errors() {
        let store = ObjectStore::new();
        let elsewhere = ObjectStore::new();
        let r = elsewhere.store(b"not here");
        let err = store.load_node::<u32>(r).unwrap_err();
        assert!(matches!(err, StoreError::MissingObject { .. }));
    }

    #[test]
    fn concurrent_inserts_converge() {
        use std::sync::Arc;
        let store = Arc::new(ObjectStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.store(b"shared header"))
            })
            .collect();
        let refs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(refs.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.len(), 1);
    }
}
