//! Entity trait: identity + continuity across state changes.

use crate::id::EntityId;

/// Entity marker + minimal interface.
///
/// Every record kept in a document collection (customers, checks, notifications...)
/// is addressed by an [`EntityId`]; this lets storage helpers look records up
/// generically.
pub trait Entity {
    /// Stable, human-readable entity kind (used in diagnostics, e.g. "customer").
    const KIND: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> &EntityId;
}

/// Find a record by id in a loaded collection.
pub fn find<'a, T: Entity>(records: &'a [T], id: &EntityId) -> Option<&'a T> {
    records.iter().find(|r| r.id() == id)
}

/// Find a record by id in a loaded collection (mutable).
pub fn find_mut<'a, T: Entity>(records: &'a mut [T], id: &EntityId) -> Option<&'a mut T> {
    records.iter_mut().find(|r| r.id() == id)
}
