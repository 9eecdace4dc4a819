//! Sales invoices and the per-customer queries derived from them.
//!
//! Invoices are written by external callers (the sales form); the engine only
//! reads them to recompute customer aggregates and build series.

pub mod invoice;

pub use invoice::{CustomerSalesStats, InvoiceLine, SalesInvoice, customer_stats, in_range, quantity_sold};
