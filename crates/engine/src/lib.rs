//! `bizpulse-engine`
//!
//! Wires every component over one injected document store and clock, and
//! exposes a single entry point for business events, maintenance and reports.
//!
//! Hosts are expected to install logging (`bizpulse-observability`) before
//! constructing the engine.

pub mod config;
pub mod engine;
pub mod maintenance;

pub use config::EngineConfig;
pub use engine::{BusinessEngine, HandledEvent};
pub use maintenance::{Maintenance, MaintenanceHandle, MaintenanceReport, MaintenanceRunner};
