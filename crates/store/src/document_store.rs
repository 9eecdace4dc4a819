use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value as JsonValue;

use bizpulse_core::{DomainError, DomainResult, ExpectedVersion};

/// A stored collection plus its write counter.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub value: JsonValue,
    /// Number of successful writes to this key (0 = never written).
    pub version: u64,
}

/// Key/value document store abstraction.
///
/// Synchronous, no transactions. The only concurrency control is the
/// per-key version checked on `save`.
pub trait DocumentStore: Send + Sync {
    fn load(&self, key: &str) -> DomainResult<Option<Document>>;

    /// Write `value` under `key` if the current version matches `expected`.
    /// Returns the new version.
    fn save(&self, key: &str, value: JsonValue, expected: ExpectedVersion) -> DomainResult<u64>;

    fn keys(&self) -> DomainResult<Vec<String>>;
}

impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    fn load(&self, key: &str) -> DomainResult<Option<Document>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: JsonValue, expected: ExpectedVersion) -> DomainResult<u64> {
        (**self).save(key, value, expected)
    }

    fn keys(&self) -> DomainResult<Vec<String>> {
        (**self).keys()
    }
}

/// In-memory document store for tests/dev and embedding.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<HashMap<String, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw JSON document (bypasses version checks).
    pub fn insert_raw(&self, key: &str, value: JsonValue) {
        if let Ok(mut map) = self.inner.write() {
            let version = map.get(key).map(|d| d.version).unwrap_or(0) + 1;
            map.insert(key.to_string(), Document { value, version });
        }
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn load(&self, key: &str) -> DomainResult<Option<Document>> {
        let map = self
            .inner
            .read()
            .map_err(|_| DomainError::store("document store lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn save(&self, key: &str, value: JsonValue, expected: ExpectedVersion) -> DomainResult<u64> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::store("document store lock poisoned"))?;
        let current = map.get(key).map(|d| d.version).unwrap_or(0);
        expected.check(current)?;
        let version = current + 1;
        map.insert(key.to_string(), Document { value, version });
        Ok(version)
    }

    fn keys(&self) -> DomainResult<Vec<String>> {
        let map = self
            .inner
            .read()
            .map_err(|_| DomainError::store("document store lock poisoned"))?;
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
