use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizpulse_accounting::PaymentMethod;
use bizpulse_core::{Entity, EntityId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLine {
    pub product_id: EntityId,
    pub quantity: f64,
    pub unit_cost: f64,
}

/// Purchase invoice as stored in `purchase_invoices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseInvoice {
    pub id: EntityId,
    #[serde(default)]
    pub supplier_id: Option<EntityId>,
    #[serde(default)]
    pub supplier_name: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub items: Vec<PurchaseLine>,
    pub total: f64,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

impl PurchaseInvoice {
    pub fn is_from(&self, supplier_id: &EntityId) -> bool {
        self.supplier_id.as_ref() == Some(supplier_id)
    }
}

impl Entity for PurchaseInvoice {
    const KIND: &'static str = "purchase_invoice";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SupplierPurchaseStats {
    pub count: usize,
    pub total: f64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

pub fn supplier_stats(invoices: &[PurchaseInvoice], supplier_id: &EntityId) -> SupplierPurchaseStats {
    invoices
        .iter()
        .filter(|inv| inv.is_from(supplier_id))
        .fold(SupplierPurchaseStats::default(), |mut acc, inv| {
            acc.count += 1;
            acc.total += inv.total;
            acc.first_date = Some(acc.first_date.map_or(inv.date, |d| d.min(inv.date)));
            acc.last_date = Some(acc.last_date.map_or(inv.date, |d| d.max(inv.date)));
            acc
        })
}

pub fn in_range(invoices: &[PurchaseInvoice], start: NaiveDate, end: NaiveDate) -> Vec<&PurchaseInvoice> {
    invoices
        .iter()
        .filter(|inv| inv.date >= start && inv.date <= end)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplier_stats_ignores_other_suppliers() {
        let d = |m| NaiveDate::from_ymd_opt(2024, m, 1).unwrap();
        let mk = |id: &str, supplier: &str, m, total| PurchaseInvoice {
            id: EntityId::new(id),
            supplier_id: Some(EntityId::new(supplier)),
            supplier_name: None,
            date: d(m),
            items: Vec::new(),
            total,
            payment_method: None,
        };
        let invoices = vec![mk("p1", "s1", 2, 100.0), mk("p2", "s2", 1, 5.0), mk("p3", "s1", 4, 40.0)];

        let stats = supplier_stats(&invoices, &EntityId::new("s1"));
        assert_eq!(stats.count, 2);
        assert_eq!(stats.total, 140.0);
        assert_eq!(stats.first_date, Some(d(2)));
        assert_eq!(stats.last_date, Some(d(4)));
        assert_eq!(in_range(&invoices, d(1), d(2)).len(), 2);
    }
}
