use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizpulse_accounting::PaymentMethod;
use bizpulse_core::{Entity, EntityId};

/// Invoice line: product, quantity, unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub product_id: EntityId,
    #[serde(default)]
    pub product_name: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
}

/// Sales invoice as stored in `sales_invoices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesInvoice {
    pub id: EntityId,
    #[serde(default)]
    pub customer_id: Option<EntityId>,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub items: Vec<InvoiceLine>,
    pub total: f64,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

impl SalesInvoice {
    pub fn is_for(&self, customer_id: &EntityId) -> bool {
        self.customer_id.as_ref() == Some(customer_id)
    }
}

impl Entity for SalesInvoice {
    const KIND: &'static str = "sales_invoice";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

/// Sales history summary for one customer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CustomerSalesStats {
    pub count: usize,
    pub total: f64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Recompute a customer's sales summary from the full invoice collection.
pub fn customer_stats(invoices: &[SalesInvoice], customer_id: &EntityId) -> CustomerSalesStats {
    invoices
        .iter()
        .filter(|inv| inv.is_for(customer_id))
        .fold(CustomerSalesStats::default(), |mut acc, inv| {
            acc.count += 1;
            acc.total += inv.total;
            acc.first_date = Some(acc.first_date.map_or(inv.date, |d| d.min(inv.date)));
            acc.last_date = Some(acc.last_date.map_or(inv.date, |d| d.max(inv.date)));
            acc
        })
}

/// Invoices dated within `[start, end]`.
pub fn in_range(invoices: &[SalesInvoice], start: NaiveDate, end: NaiveDate) -> Vec<&SalesInvoice> {
    invoices
        .iter()
        .filter(|inv| inv.date >= start && inv.date <= end)
        .collect()
}

/// Units of `product_id` sold on or after `since`.
pub fn quantity_sold(invoices: &[SalesInvoice], product_id: &EntityId, since: NaiveDate) -> f64 {
    invoices
        .iter()
        .filter(|inv| inv.date >= since)
        .flat_map(|inv| inv.items.iter())
        .filter(|line| &line.product_id == product_id)
        .map(|line| line.quantity)
        .sum()
}
