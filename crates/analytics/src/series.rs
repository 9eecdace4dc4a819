//! Monthly `YYYY-MM` series built from dated records.
//!
//! Sales are zero-filled over a fixed window ending at a given month. Purchases
//! and expenses only contain months that have data. The two shapes are kept
//! apart on purpose: callers rely on each.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizpulse_accounting::Expense;
use bizpulse_core::MonthKey;
use bizpulse_purchasing::PurchaseInvoice;
use bizpulse_sales::SalesInvoice;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub month: MonthKey,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(month: MonthKey, value: f64) -> Self {
        Self { month, value }
    }
}

pub fn values(series: &[SeriesPoint]) -> Vec<f64> {
    series.iter().map(|p| p.value).collect()
}

fn bucket<I>(rows: I) -> BTreeMap<MonthKey, f64>
where
    I: IntoIterator<Item = (NaiveDate, f64)>,
{
    let mut buckets = BTreeMap::new();
    for (date, amount) in rows {
        *buckets.entry(MonthKey::of(date)).or_insert(0.0) += amount;
    }
    buckets
}

/// Sales totals for the `months` months ending at `end`, oldest first, with
/// empty months reported as zero.
pub fn monthly_sales_series(invoices: &[SalesInvoice], end: MonthKey, months: usize) -> Vec<SeriesPoint> {
    let buckets = bucket(invoices.iter().map(|i| (i.date, i.total)));
    end.window_ending(months)
        .into_iter()
        .map(|month| SeriesPoint::new(month, buckets.get(&month).copied().unwrap_or(0.0)))
        .collect()
}

/// Purchase totals for every month that has at least one invoice.
pub fn monthly_purchases_series(invoices: &[PurchaseInvoice]) -> Vec<SeriesPoint> {
    bucket(invoices.iter().map(|i| (i.date, i.total)))
        .into_iter()
        .map(|(month, value)| SeriesPoint::new(month, value))
        .collect()
}

/// Expense totals for every month that has at least one expense.
pub fn monthly_expense_series(expenses: &[Expense]) -> Vec<SeriesPoint> {
    bucket(expenses.iter().map(|e| (e.date, e.amount)))
        .into_iter()
        .map(|(month, value)| SeriesPoint::new(month, value))
        .collect()
}
