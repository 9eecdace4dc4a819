//! Purchase invoices and per-supplier queries.

pub mod invoice;

pub use invoice::{PurchaseInvoice, PurchaseLine, SupplierPurchaseStats, in_range, supplier_stats};
