//! Risks, opportunities and recommendations derived from the computed sections.

use std::cmp::Ordering;

use serde::Serialize;

use bizpulse_analytics::{CustomerInsight, Forecast};

use crate::report::{CashFlowAnalysis, CustomerAnalysis, FinancialSummary, InventoryAnalysis, PaymentsAnalysis};

const LOW_CASH: f64 = 5_000.0;
const HIGH_RETURN_RATE: f64 = 10.0;
const WIN_BACK_CHURN: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskItem {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub title: String,
    pub description: String,
    /// Estimated upside, used for ranking.
    pub potential: f64,
}

fn risk(severity: Severity, title: &str, description: String) -> RiskItem {
    RiskItem {
        title: title.to_string(),
        description,
        severity,
    }
}

/// Risk rules over the computed sections. A `None` section failed to load and
/// its rules are skipped, so missing data never reads as a zero balance.
pub(crate) fn identify_risks(
    financial: Option<&FinancialSummary>,
    customers: Option<&CustomerAnalysis>,
    inventory: Option<&InventoryAnalysis>,
    payments: Option<&PaymentsAnalysis>,
    cash_flow: Option<&CashFlowAnalysis>,
) -> Vec<RiskItem> {
    let mut risks = Vec::new();

    if let Some(financial) = financial.filter(|f| f.net_profit < 0.0) {
        risks.push(risk(
            Severity::Critical,
            "Operating at a loss",
            format!("net profit for the period is {:.2}", financial.net_profit),
        ));
    }
    if let Some(cash_flow) = cash_flow {
        if cash_flow.closing_balance < LOW_CASH {
            risks.push(risk(
                Severity::Critical,
                "Low cash reserves",
                format!("cash balance is {:.2}", cash_flow.closing_balance),
            ));
        }
        if cash_flow.net < 0.0 {
            risks.push(risk(
                Severity::High,
                "Negative cash flow",
                format!("outflows exceeded inflows by {:.2}", -cash_flow.net),
            ));
        }
    }
    if let Some(customers) = customers {
        if customers.high_risk_customers > 0 {
            risks.push(risk(
                Severity::High,
                "High-risk customers",
                format!("{} customers are rated high risk", customers.high_risk_customers),
            ));
        }
        if customers.at_risk_customers > 0 {
            risks.push(risk(
                Severity::Medium,
                "Customer churn",
                format!("{} customers show a high churn risk", customers.at_risk_customers),
            ));
        }
    }
    if let Some(payments) = payments {
        if payments.checks.overdue.count > 0 {
            risks.push(risk(
                Severity::High,
                "Overdue checks",
                format!(
                    "{} checks worth {:.2} are pending past their due window",
                    payments.checks.overdue.count, payments.checks.overdue.amount
                ),
            ));
        }
        if payments.installments.overdue.count > 0 {
            risks.push(risk(
                Severity::High,
                "Overdue installments",
                format!(
                    "{} installments worth {:.2} are past due",
                    payments.installments.overdue.count, payments.installments.overdue.amount
                ),
            ));
        }
        if payments.checks.return_rate() > HIGH_RETURN_RATE {
            risks.push(risk(
                Severity::Medium,
                "Returned checks",
                format!("{:.1}% of settled checks bounced", payments.checks.return_rate()),
            ));
        }
    }
    if let Some(inventory) = inventory {
        if inventory.out_of_stock > 0 {
            risks.push(risk(
                Severity::High,
                "Stockouts",
                format!("{} products are out of stock", inventory.out_of_stock),
            ));
        }
        if inventory.low_stock > 0 {
            risks.push(risk(
                Severity::Medium,
                "Low stock",
                format!("{} products are at or below minimum stock", inventory.low_stock),
            ));
        }
    }

    risks.sort_by(|a, b| b.severity.cmp(&a.severity));
    risks
}

pub(crate) fn identify_opportunities(
    insights: &[CustomerInsight],
    inventory: &InventoryAnalysis,
    forecast: Option<&Forecast>,
) -> Vec<Opportunity> {
    let mut opportunities = Vec::new();

    for insight in insights
        .iter()
        .filter(|i| i.churn.risk_score >= WIN_BACK_CHURN && i.purchase_count > 0)
    {
        opportunities.push(Opportunity {
            title: format!("Win back {}", insight.name),
            description: format!(
                "{} has not bought for {} days",
                insight.name,
                insight.churn.days_since_last_purchase.unwrap_or(0)
            ),
            potential: insight.average_order_value,
        });
    }

    for product in &inventory.reorder_suggestions {
        opportunities.push(Opportunity {
            title: format!("Restock {}", product.name),
            description: format!(
                "selling {:.2} units/day; reorder {:.0} units to cover demand",
                product.velocity, product.reorder_quantity
            ),
            potential: product.reorder_value,
        });
    }

    if let Some(f) = forecast.filter(|f| f.trend.slope > 0.0) {
        opportunities.push(Opportunity {
            title: "Growing sales".to_string(),
            description: format!(
                "sales trend up {:.2}/month; next month forecast {:.2}",
                f.trend.slope, f.next_month_prediction
            ),
            potential: f.trend.slope,
        });
    }

    opportunities.sort_by(|a, b| b.potential.partial_cmp(&a.potential).unwrap_or(Ordering::Equal));
    opportunities
}

pub(crate) fn recommendations(risks: &[RiskItem], opportunities: &[Opportunity]) -> Vec<String> {
    let mut out: Vec<String> = risks
        .iter()
        .filter_map(|r| {
            let text = match r.title.as_str() {
                "Operating at a loss" => "Review pricing and cut operating expenses",
                "Low cash reserves" => "Build a cash buffer before committing to new purchases",
                "Negative cash flow" => "Delay non-essential spending and speed up collections",
                "High-risk customers" => "Tighten credit terms for high-risk customers",
                "Overdue checks" => "Follow up on overdue checks with their holders",
                "Overdue installments" => "Contact customers with overdue installments",
                "Returned checks" => "Require alternative payment from customers with bounced checks",
                "Stockouts" => "Restock out-of-stock products",
                "Low stock" => "Plan replenishment for low-stock products",
                "Customer churn" => "Run a retention campaign for inactive customers",
                _ => return None,
            };
            Some(text.to_string())
        })
        .collect();

    if let Some(best) = opportunities.first() {
        out.push(format!("Prioritise: {}", best.title));
    }
    if out.is_empty() {
        out.push("No action needed; keep monitoring".to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizpulse_payments::StatusTotals;

    #[test]
    fn risks_are_sorted_by_severity() {
        let financial = FinancialSummary {
            net_profit: -10.0,
            ..FinancialSummary::default()
        };
        let inventory = InventoryAnalysis {
            low_stock: 2,
            ..InventoryAnalysis::default()
        };
        let mut payments = PaymentsAnalysis::default();
        payments.checks.overdue = StatusTotals {
            count: 1,
            amount: 5_000.0,
        };
        let cash_flow = CashFlowAnalysis {
            closing_balance: 50_000.0,
            ..CashFlowAnalysis::default()
        };

        let risks = identify_risks(
            Some(&financial),
            Some(&CustomerAnalysis::default()),
            Some(&inventory),
            Some(&payments),
            Some(&cash_flow),
        );
        let severities: Vec<Severity> = risks.iter().map(|r| r.severity).collect();
        assert_eq!(severities, vec![Severity::Critical, Severity::High, Severity::Medium]);

        let recs = recommendations(&risks, &[]);
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0], "Review pricing and cut operating expenses");
    }

    fn demand(name: &str, reorder_quantity: f64, sale_price: f64) -> bizpulse_analytics::ProductDemand {
        bizpulse_analytics::ProductDemand {
            product_id: bizpulse_core::EntityId::new(name),
            name: name.to_string(),
            stock: 0.0,
            velocity: 1.0,
            days_until_empty: 0.0,
            reorder_quantity,
            reorder_value: reorder_quantity * sale_price,
        }
    }

    #[test]
    fn restock_potential_is_money_not_units() {
        let inventory = InventoryAnalysis {
            reorder_suggestions: vec![demand("bolts", 500.0, 0.25), demand("drills", 4.0, 120.0)],
            ..InventoryAnalysis::default()
        };

        let opportunities = identify_opportunities(&[], &inventory, None);
        let titles: Vec<&str> = opportunities.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["Restock drills", "Restock bolts"]);
        assert_eq!(opportunities[0].potential, 480.0);
        assert_eq!(opportunities[1].potential, 125.0);
    }

    #[test]
    fn missing_cash_flow_raises_no_cash_risk() {
        let risks = identify_risks(None, None, None, None, None);
        assert!(risks.is_empty());

        let risks = identify_risks(None, None, None, None, Some(&CashFlowAnalysis::default()));
        let titles: Vec<&str> = risks.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Low cash reserves"]);
    }

    #[test]
    fn quiet_business_gets_default_recommendation() {
        let recs = recommendations(&[], &[]);
        assert_eq!(recs, vec!["No action needed; keep monitoring".to_string()]);
    }
}
