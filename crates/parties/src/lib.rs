//! Parties (customers and suppliers) and their denormalized aggregates.
//!
//! The aggregate fields (`total_purchases`, `total_debt`, `risk_level`, ...) are kept
//! consistent by [`AggregateUpdater`] as sales, purchases and payments happen.

pub mod party;
pub mod risk;
pub mod updater;

pub use party::{
    ContactInfo, CustomerAggregate, PaymentRecord, PaymentStatus, RiskLevel, SupplierAggregate,
};
pub use risk::{RiskScorer, RiskSignals, RiskThresholds};
pub use updater::{AggregateUpdater, InstallmentPayment, PurchaseRecord, Rescore, SaleRecord};
