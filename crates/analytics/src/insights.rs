use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizpulse_core::EntityId;
use bizpulse_parties::CustomerAggregate;
use bizpulse_sales::SalesInvoice;

use crate::churn::{ChurnRisk, churn_risk};
use crate::segment::{Segment, segment_for};
use crate::settings::ForecastSettings;

/// Per-customer view combining lifetime value, churn and segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInsight {
    pub customer_id: EntityId,
    pub name: String,
    pub lifetime_value: f64,
    pub purchase_count: usize,
    pub average_order_value: f64,
    pub churn: ChurnRisk,
    pub segment: Segment,
}

/// Lifetime value comes from the aggregate; purchase dates from the invoices.
pub fn customer_insights(
    customers: &[CustomerAggregate],
    sales: &[SalesInvoice],
    today: NaiveDate,
    settings: &ForecastSettings,
) -> Vec<CustomerInsight> {
    customers
        .iter()
        .map(|customer| {
            let dates: Vec<NaiveDate> = sales
                .iter()
                .filter(|inv| inv.is_for(&customer.id))
                .map(|inv| inv.date)
                .collect();
            let count = dates.len();
            let lifetime_value = customer.total_purchases;
            CustomerInsight {
                customer_id: customer.id.clone(),
                name: customer.name.clone(),
                lifetime_value,
                purchase_count: count,
                average_order_value: lifetime_value / (count.max(1) as f64),
                churn: churn_risk(&dates, today, settings),
                segment: segment_for(lifetime_value, count as f64),
            }
        })
        .collect()
}
