//! Product stock records.

pub mod product;

pub use product::{Product, StockStatus};
