use crate::Event;

/// Applies an event to whatever state the implementor owns.
///
/// The error type is associated so handlers stay free of storage assumptions.
pub trait EventHandler<E: Event> {
    type Output;
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn handle(&self, event: E) -> Result<Self::Output, Self::Error>;
}
