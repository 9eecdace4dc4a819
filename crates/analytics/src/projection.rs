use serde::{Deserialize, Serialize};

use crate::series::{SeriesPoint, values};
use crate::stats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProjection {
    pub forecasted_sales: f64,
    /// `(sales - purchases) / max(sales, 1)` over the observed history.
    pub avg_profit_margin: f64,
    pub profit_projection: f64,
    pub avg_monthly_sales: f64,
    /// Average monthly expenses.
    pub break_even_point: f64,
    /// `(avg_monthly_sales - break_even) / max(avg_monthly_sales, 1)`.
    pub margin_of_safety: f64,
}

pub fn financial_projection(
    forecasted_sales: f64,
    sales: &[SeriesPoint],
    purchases: &[SeriesPoint],
    expenses: &[SeriesPoint],
) -> FinancialProjection {
    let total_sales: f64 = sales.iter().map(|p| p.value).sum();
    let total_purchases: f64 = purchases.iter().map(|p| p.value).sum();
    let avg_profit_margin = (total_sales - total_purchases) / total_sales.max(1.0);

    let avg_monthly_sales = stats::mean(&values(sales));
    let break_even_point = stats::mean(&values(expenses));
    let margin_of_safety = (avg_monthly_sales - break_even_point) / avg_monthly_sales.max(1.0);

    FinancialProjection {
        forecasted_sales,
        avg_profit_margin,
        profit_projection: forecasted_sales * avg_profit_margin,
        avg_monthly_sales,
        break_even_point,
        margin_of_safety,
    }
}
