use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use bizpulse_analytics::{CustomerInsight, FinancialProjection, Forecast, ProductDemand, Segment};
use bizpulse_core::EntityId;
use bizpulse_payments::{ChecksSummary, InstallmentsSummary};

use crate::assessment::{Opportunity, RiskItem};
use crate::metric::Metric;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// The equally long period ending the day before `start`.
    pub fn previous(&self) -> ReportPeriod {
        let len = self.end - self.start;
        let end = self.start - chrono::Duration::days(1);
        ReportPeriod {
            start: end - len,
            end,
        }
    }
}

/// A party with the amount the report ranks it by.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyBalance {
    pub id: EntityId,
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub revenue: f64,
    pub purchase_costs: f64,
    pub operating_expenses: f64,
    pub gross_profit: f64,
    pub net_profit: f64,
    /// Percent of revenue.
    pub profit_margin: f64,
    pub cash_inflow: f64,
    pub cash_outflow: f64,
    pub net_cash_flow: f64,
    pub cash_balance: f64,
    pub invoice_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAnalysis {
    pub total_customers: usize,
    /// Customers with at least one sale in the period.
    pub active_customers: usize,
    pub top_performers: Vec<CustomerInsight>,
    pub overdue_customers: Vec<PartyBalance>,
    pub total_loyalty_points: u64,
    pub segments: BTreeMap<Segment, usize>,
    pub average_churn_risk: f64,
    /// Customers with churn risk of 75 or more.
    pub at_risk_customers: usize,
    pub high_risk_customers: usize,
    /// Share of the previous period's buyers who bought again, in percent.
    pub retention_rate: Metric<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierAnalysis {
    pub total_suppliers: usize,
    pub active_suppliers: usize,
    pub period_purchases: f64,
    pub top_suppliers: Vec<PartyBalance>,
    pub total_debt: f64,
    pub high_risk_suppliers: Vec<PartyBalance>,
    pub average_rating: Metric<f64>,
    pub on_time_delivery_rate: Metric<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAnalysis {
    pub total_products: usize,
    pub stock_value: f64,
    pub out_of_stock: usize,
    pub low_stock: usize,
    /// Cost of goods sold in the period over current stock value.
    pub turnover_ratio: f64,
    pub fast_movers: Vec<ProductDemand>,
    pub slow_movers: Vec<ProductDemand>,
    pub reorder_suggestions: Vec<ProductDemand>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentsAnalysis {
    pub checks: ChecksSummary,
    pub installments: InstallmentsSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowAnalysis {
    pub inflow_by_category: BTreeMap<String, f64>,
    pub outflow_by_category: BTreeMap<String, f64>,
    /// Net flow per `YYYY-MM` inside the period.
    pub monthly_net: BTreeMap<String, f64>,
    pub total_inflow: f64,
    pub total_outflow: f64,
    pub net: f64,
    pub closing_balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    /// Percent change against the previous, equally long period.
    pub revenue_growth: Metric<f64>,
    pub gross_margin: Metric<f64>,
    pub net_margin: Metric<f64>,
    pub average_order_value: Metric<f64>,
    pub inventory_turnover: Metric<f64>,
    pub installment_collection_rate: Metric<f64>,
    pub check_return_rate: Metric<f64>,
    pub customer_satisfaction: Metric<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Predictions {
    pub next_month_sales: Option<Forecast>,
    pub projection: Option<FinancialProjection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedReport {
    pub generated_at: DateTime<Utc>,
    pub period: ReportPeriod,
    pub financial: FinancialSummary,
    pub customers: CustomerAnalysis,
    pub suppliers: SupplierAnalysis,
    pub inventory: InventoryAnalysis,
    pub payments: PaymentsAnalysis,
    pub cash_flow: CashFlowAnalysis,
    pub kpis: Kpis,
    /// Most severe first.
    pub risks: Vec<RiskItem>,
    /// Largest potential first.
    pub opportunities: Vec<Opportunity>,
    pub predictions: Predictions,
    pub recommendations: Vec<String>,
    /// Sections that fell back to defaults.
    pub degraded_sections: Vec<String>,
}
