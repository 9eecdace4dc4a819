//! Checks and installments: lifecycle state machines and their links to holders.
//!
//! A transition on a check or installment updates the holder's aggregate (through
//! the parties updater) and appends a cash-ledger row where money moved.

pub mod check;
pub mod employee;
pub mod holder;
pub mod installment;
pub mod linker;
pub mod schedule;
pub mod summary;

pub use check::{Check, CheckStatus, HolderType, NewCheck};
pub use employee::{Employee, EmployeeCheckEntry};
pub use installment::{Installment, InstallmentStatus, NewInstallment, OverdueInstallment};
pub use linker::{CrossEntityLinker, LinkOutcome, OVERDUE_CHECK_DAYS};
pub use summary::{ChecksSummary, InstallmentsSummary, StatusTotals, checks_summary, installments_summary};
