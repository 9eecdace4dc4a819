//! `bizpulse-core` provides shared building blocks for the business engine.
//!
//! This crate contains **pure** primitives (no storage, no IO): identifiers, the
//! error taxonomy, the optimistic-concurrency token, the clock abstraction and
//! calendar helpers used by every other crate.

pub mod calendar;
pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod version;

pub use calendar::{MonthKey, days_between, months_between};
pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::EntityId;
pub use version::ExpectedVersion;
