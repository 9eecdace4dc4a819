//! Collection names shared with external callers.

pub const CUSTOMERS: &str = "customers";
pub const SUPPLIERS: &str = "suppliers";
pub const EMPLOYEES: &str = "employees";
pub const CHECKS: &str = "checks";
pub const INSTALLMENTS: &str = "installments";
pub const SALES_INVOICES: &str = "sales_invoices";
pub const PURCHASE_INVOICES: &str = "purchase_invoices";
pub const EXPENSES: &str = "expenses";
pub const PRODUCTS: &str = "products";
pub const CASH_TRANSACTIONS: &str = "cash_transactions";
pub const CASH_BALANCE: &str = "cash_balance";
pub const SMART_NOTIFICATIONS: &str = "smart_notifications";
pub const BACKUP_HISTORY: &str = "backup_history";

/// Where an unparseable collection is parked before it is replaced.
pub fn quarantine_key(key: &str) -> String {
    format!("{key}.quarantine")
}
