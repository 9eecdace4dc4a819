//! Typed access to JSON collections.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::warn;

use bizpulse_core::{DomainError, DomainResult, ExpectedVersion};

use crate::document_store::DocumentStore;
use crate::keys::quarantine_key;

/// A loaded value plus the collection version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

/// Typed collection accessor over an injected [`DocumentStore`].
///
/// Read-modify-write goes through [`Collections::update_collection`], which
/// writes with `ExpectedVersion::Exact` and retries the closure on conflict,
/// so a concurrent writer is detected instead of silently overwritten.
#[derive(Debug, Clone)]
pub struct Collections<S> {
    store: S,
    max_retries: u32,
}

impl<S> Collections<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_retries: 3,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Strict read: absent → empty at version 0, unparseable → `MalformedCollection`.
    pub fn read_collection<T>(&self, key: &str) -> DomainResult<Versioned<Vec<T>>>
    where
        T: DeserializeOwned,
    {
        let Some(doc) = self.store.load(key)? else {
            return Ok(Versioned {
                value: Vec::new(),
                version: 0,
            });
        };

        let value = serde_json::from_value::<Vec<T>>(doc.value)
            .map_err(|e| DomainError::malformed(key, e.to_string()))?;

        Ok(Versioned {
            value,
            version: doc.version,
        })
    }

    /// Lenient read: returns `fallback` when absent or unreadable.
    ///
    /// An unparseable document is copied to `<key>.quarantine` first, so the
    /// data survives for inspection.
    pub fn get_collection<T>(&self, key: &str, fallback: Vec<T>) -> Vec<T>
    where
        T: DeserializeOwned,
    {
        match self.read_collection::<T>(key) {
            Ok(v) if v.version == 0 => fallback,
            Ok(v) => v.value,
            Err(err) => {
                self.quarantine(key, &err);
                fallback
            }
        }
    }

    /// Overwrite a collection (last-write-wins).
    pub fn set_collection<T>(&self, key: &str, value: &[T]) -> DomainResult<()>
    where
        T: Serialize,
    {
        let json = to_json(key, value)?;
        self.store.save(key, json, ExpectedVersion::Any)?;
        Ok(())
    }

    /// Read-modify-write with optimistic concurrency.
    ///
    /// `f` may run more than once (once per attempt) and must only touch the
    /// vector it is given. If `f` fails nothing is written.
    ///
    /// A malformed collection is quarantined and the write is refused with
    /// `MalformedCollection`; the stored document stays untouched until
    /// [`Collections::reset_collection`] is called.
    pub fn update_collection<T, R, F>(&self, key: &str, mut f: F) -> DomainResult<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(&mut Vec<T>) -> DomainResult<R>,
    {
        let mut attempt = 0;
        loop {
            let (mut items, version) = match self.read_collection::<T>(key) {
                Ok(v) => (v.value, v.version),
                Err(err @ DomainError::MalformedCollection { .. }) => {
                    self.quarantine(key, &err);
                    return Err(err);
                }
                Err(err) => return Err(err),
            };

            let out = f(&mut items)?;
            let json = to_json(key, &items)?;

            match self.store.save(key, json, ExpectedVersion::Exact(version)) {
                Ok(_) => return Ok(out),
                Err(DomainError::Conflict(msg)) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(key, attempt, reason = %msg, "collection write conflict; retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Append one record.
    pub fn append<T>(&self, key: &str, item: T) -> DomainResult<()>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        self.update_collection::<T, (), _>(key, |items| {
            items.push(item.clone());
            Ok(())
        })
    }

    /// Replace a collection with an empty one, keeping the previous raw
    /// document under `<key>.quarantine`. Returns `true` if anything was parked.
    pub fn reset_collection(&self, key: &str) -> DomainResult<bool> {
        let parked = match self.store.load(key)? {
            Some(doc) => {
                self.store
                    .save(&quarantine_key(key), doc.value, ExpectedVersion::Any)?;
                true
            }
            None => false,
        };
        warn!(key, parked, "collection reset to empty");
        self.store
            .save(key, JsonValue::Array(Vec::new()), ExpectedVersion::Any)?;
        Ok(parked)
    }

    fn quarantine(&self, key: &str, err: &DomainError) {
        warn!(key, error = %err, "malformed collection; quarantining raw document");
        let raw = match self.store.load(key) {
            Ok(Some(doc)) => doc.value,
            _ => return,
        };
        if let Err(e) = self
            .store
            .save(&quarantine_key(key), raw, ExpectedVersion::Any)
        {
            warn!(key, error = %e, "failed to quarantine malformed collection");
        }
    }
}

fn to_json<T: Serialize>(key: &str, value: &[T]) -> DomainResult<JsonValue> {
    serde_json::to_value(value)
        .map_err(|e| DomainError::store(format!("failed to serialize `{key}`: {e}")))
}
