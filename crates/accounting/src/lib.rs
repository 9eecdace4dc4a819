//! Cash ledger (append-only) and expenses.
//!
//! Ledger rows are produced as side effects of sales, purchases, check cashing and
//! installment payments. They are never edited or deleted by the engine.

pub mod cash;
pub mod expense;

pub use cash::{
    CashBalanceSnapshot, CashLedger, CashTransaction, PaymentMethod, TransactionType, balance_of,
    categories, net_flow,
};
pub use expense::Expense;
