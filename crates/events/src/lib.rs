//! Business events fed into the engine by external callers.

pub mod business;
pub mod event;
pub mod handler;

pub use business::BusinessEvent;
pub use event::Event;
pub use handler::EventHandler;
