//! Document store boundary.
//!
//! The engine never owns persistence: it talks to an injected key → JSON
//! document store. Each key holds one whole collection (a JSON array).

pub mod collections;
pub mod document_store;
pub mod keys;

pub use collections::{Collections, Versioned};
pub use document_store::{Document, DocumentStore, InMemoryDocumentStore};
