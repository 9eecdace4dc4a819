//! Pure builders for each report section.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use bizpulse_accounting::{CashTransaction, Expense, TransactionType, balance_of};
use bizpulse_analytics::{CustomerInsight, ProductDemand};
use bizpulse_core::{EntityId, MonthKey};
use bizpulse_inventory::{Product, StockStatus};
use bizpulse_parties::{CustomerAggregate, RiskLevel, SupplierAggregate};
use bizpulse_purchasing::PurchaseInvoice;
use bizpulse_sales::SalesInvoice;

use crate::metric::Metric;
use crate::report::{
    CashFlowAnalysis, CustomerAnalysis, FinancialSummary, InventoryAnalysis, Kpis, PartyBalance,
    PaymentsAnalysis, ReportPeriod, SupplierAnalysis,
};

const TOP_N: usize = 5;
const AT_RISK_CHURN: f64 = 75.0;

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub fn financial_summary(
    period: ReportPeriod,
    sales: &[SalesInvoice],
    purchases: &[PurchaseInvoice],
    expenses: &[Expense],
    cash: &[CashTransaction],
) -> FinancialSummary {
    let period_sales: Vec<&SalesInvoice> = sales.iter().filter(|s| period.contains(s.date)).collect();
    let revenue: f64 = period_sales.iter().map(|s| s.total).sum();
    let purchase_costs: f64 = purchases
        .iter()
        .filter(|p| period.contains(p.date))
        .map(|p| p.total)
        .sum();
    let operating_expenses =
        bizpulse_accounting::expense::total_in_range(expenses, period.start, period.end);

    let (mut cash_inflow, mut cash_outflow) = (0.0, 0.0);
    for tx in cash.iter().filter(|t| period.contains(t.date)) {
        match tx.kind {
            TransactionType::Income => cash_inflow += tx.amount,
            TransactionType::Expense => cash_outflow += tx.amount,
        }
    }

    let gross_profit = revenue - purchase_costs;
    let net_profit = gross_profit - operating_expenses;
    FinancialSummary {
        revenue,
        purchase_costs,
        operating_expenses,
        gross_profit,
        net_profit,
        profit_margin: net_profit / revenue.max(1.0) * 100.0,
        cash_inflow,
        cash_outflow,
        net_cash_flow: cash_inflow - cash_outflow,
        cash_balance: balance_of(cash),
        invoice_count: period_sales.len(),
    }
}

fn buyers(sales: &[SalesInvoice], period: ReportPeriod) -> HashSet<&EntityId> {
    sales
        .iter()
        .filter(|s| period.contains(s.date))
        .filter_map(|s| s.customer_id.as_ref())
        .collect()
}

pub fn customer_analysis(
    period: ReportPeriod,
    customers: &[CustomerAggregate],
    insights: &[CustomerInsight],
    sales: &[SalesInvoice],
) -> CustomerAnalysis {
    let current = buyers(sales, period);
    let previous = buyers(sales, period.previous());
    let retention_rate = if previous.is_empty() {
        Metric::not_computed("no customers bought in the previous period")
    } else {
        let retained = previous.iter().filter(|id| current.contains(*id)).count();
        Metric::computed(retained as f64 / previous.len() as f64 * 100.0)
    };

    let mut top_performers = insights.to_vec();
    top_performers.sort_by(|a, b| desc(a.lifetime_value, b.lifetime_value));
    top_performers.truncate(TOP_N);

    let mut overdue_customers: Vec<PartyBalance> = customers
        .iter()
        .filter(|c| c.overdue_installments_amount > 0.0)
        .map(|c| PartyBalance {
            id: c.id.clone(),
            name: c.name.clone(),
            amount: c.overdue_installments_amount,
        })
        .collect();
    overdue_customers.sort_by(|a, b| desc(a.amount, b.amount));

    let mut segments = BTreeMap::new();
    for insight in insights {
        *segments.entry(insight.segment).or_insert(0) += 1;
    }

    let average_churn_risk = if insights.is_empty() {
        0.0
    } else {
        insights.iter().map(|i| i.churn.risk_score).sum::<f64>() / insights.len() as f64
    };

    CustomerAnalysis {
        total_customers: customers.len(),
        active_customers: current.len(),
        top_performers,
        overdue_customers,
        total_loyalty_points: customers.iter().map(|c| c.loyalty_points).sum(),
        segments,
        average_churn_risk,
        at_risk_customers: insights.iter().filter(|i| i.churn.risk_score >= AT_RISK_CHURN).count(),
        high_risk_customers: customers.iter().filter(|c| c.risk_level == RiskLevel::High).count(),
        retention_rate,
    }
}

pub fn supplier_analysis(
    period: ReportPeriod,
    suppliers: &[SupplierAggregate],
    purchases: &[PurchaseInvoice],
) -> SupplierAnalysis {
    let mut totals: HashMap<&EntityId, f64> = HashMap::new();
    let mut period_purchases = 0.0;
    for p in purchases.iter().filter(|p| period.contains(p.date)) {
        period_purchases += p.total;
        if let Some(id) = &p.supplier_id {
            *totals.entry(id).or_insert(0.0) += p.total;
        }
    }

    let mut top_suppliers: Vec<PartyBalance> = suppliers
        .iter()
        .filter_map(|s| {
            totals.get(&s.id).map(|amount| PartyBalance {
                id: s.id.clone(),
                name: s.name.clone(),
                amount: *amount,
            })
        })
        .collect();
    top_suppliers.sort_by(|a, b| desc(a.amount, b.amount));
    top_suppliers.truncate(TOP_N);

    let high_risk_suppliers = suppliers
        .iter()
        .filter(|s| s.risk_level == RiskLevel::High)
        .map(|s| PartyBalance {
            id: s.id.clone(),
            name: s.name.clone(),
            amount: s.total_debt,
        })
        .collect();

    let ratings: Vec<f64> = suppliers.iter().filter_map(|s| s.average_rating).collect();
    let average_rating = if ratings.is_empty() {
        Metric::not_computed("no supplier has been rated")
    } else {
        Metric::computed(ratings.iter().sum::<f64>() / ratings.len() as f64)
    };

    SupplierAnalysis {
        total_suppliers: suppliers.len(),
        active_suppliers: totals.len(),
        period_purchases,
        top_suppliers,
        total_debt: suppliers.iter().map(|s| s.total_debt).sum(),
        high_risk_suppliers,
        average_rating,
        on_time_delivery_rate: Metric::not_computed("deliveries are not tracked"),
    }
}

pub fn inventory_analysis(
    period: ReportPeriod,
    products: &[Product],
    demand: &[ProductDemand],
    sales: &[SalesInvoice],
) -> InventoryAnalysis {
    let cost_of: HashMap<&EntityId, f64> = products.iter().map(|p| (&p.id, p.cost_price)).collect();
    let cost_of_goods_sold: f64 = sales
        .iter()
        .filter(|s| period.contains(s.date))
        .flat_map(|s| s.items.iter())
        .map(|line| line.quantity * cost_of.get(&line.product_id).copied().unwrap_or(0.0))
        .sum();
    let stock_value: f64 = products.iter().map(Product::stock_value).sum();

    let mut fast_movers: Vec<ProductDemand> =
        demand.iter().filter(|d| d.is_fast_mover()).cloned().collect();
    fast_movers.sort_by(|a, b| desc(a.velocity, b.velocity));
    fast_movers.truncate(TOP_N);

    let mut slow_movers: Vec<ProductDemand> =
        demand.iter().filter(|d| d.is_slow_mover()).cloned().collect();
    slow_movers.sort_by(|a, b| desc(a.stock, b.stock));
    slow_movers.truncate(TOP_N);

    let mut reorder_suggestions: Vec<ProductDemand> = demand
        .iter()
        .filter(|d| d.reorder_quantity > 0.0)
        .cloned()
        .collect();
    reorder_suggestions.sort_by(|a, b| desc(a.reorder_quantity, b.reorder_quantity));

    InventoryAnalysis {
        total_products: products.len(),
        stock_value,
        out_of_stock: products
            .iter()
            .filter(|p| p.stock_status() == StockStatus::OutOfStock)
            .count(),
        low_stock: products
            .iter()
            .filter(|p| p.stock_status() == StockStatus::Low)
            .count(),
        turnover_ratio: cost_of_goods_sold / stock_value.max(1.0),
        fast_movers,
        slow_movers,
        reorder_suggestions,
    }
}

pub fn cash_flow_analysis(period: ReportPeriod, cash: &[CashTransaction]) -> CashFlowAnalysis {
    let mut analysis = CashFlowAnalysis {
        closing_balance: balance_of(cash),
        ..CashFlowAnalysis::default()
    };
    for tx in cash.iter().filter(|t| period.contains(t.date)) {
        let by_category = match tx.kind {
            TransactionType::Income => {
                analysis.total_inflow += tx.amount;
                &mut analysis.inflow_by_category
            }
            TransactionType::Expense => {
                analysis.total_outflow += tx.amount;
                &mut analysis.outflow_by_category
            }
        };
        *by_category.entry(tx.category.clone()).or_insert(0.0) += tx.amount;
        *analysis
            .monthly_net
            .entry(MonthKey::of(tx.date).to_string())
            .or_insert(0.0) += tx.signed_amount();
    }
    analysis.net = analysis.total_inflow - analysis.total_outflow;
    analysis
}

/// KPI block. `None` marks an input section that failed to load; every KPI
/// derived from it is reported as not computed instead of as zero.
pub fn kpis(
    financial: Option<&FinancialSummary>,
    previous_revenue: Option<f64>,
    inventory: Option<&InventoryAnalysis>,
    payments: Option<&PaymentsAnalysis>,
) -> Kpis {
    let revenue_growth = match (financial, previous_revenue) {
        (Some(f), Some(previous)) if previous > 0.0 => {
            Metric::computed((f.revenue - previous) / previous * 100.0)
        }
        (Some(_), Some(_)) => Metric::not_computed("no revenue in the previous period"),
        _ => Metric::default(),
    };

    Kpis {
        revenue_growth,
        gross_margin: derived(financial, |f| f.gross_profit / f.revenue.max(1.0) * 100.0),
        net_margin: derived(financial, |f| f.profit_margin),
        average_order_value: derived(financial, |f| f.revenue / (f.invoice_count.max(1) as f64)),
        inventory_turnover: derived(inventory, |i| i.turnover_ratio),
        installment_collection_rate: derived(payments, |p| p.installments.collection_rate()),
        check_return_rate: derived(payments, |p| p.checks.return_rate()),
        customer_satisfaction: Metric::not_computed("no customer feedback is recorded"),
    }
}

fn derived<T>(input: Option<&T>, f: impl FnOnce(&T) -> f64) -> Metric<f64> {
    input.map_or_else(Metric::default, |v| Metric::computed(f(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizpulse_accounting::categories;
    use bizpulse_sales::InvoiceLine;
    use chrono::NaiveDate;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn march() -> ReportPeriod {
        ReportPeriod {
            start: d(3, 1),
            end: d(3, 31),
        }
    }

    fn sale(customer: &str, date: NaiveDate, total: f64, quantity: f64) -> SalesInvoice {
        SalesInvoice {
            id: EntityId::generate(),
            customer_id: Some(EntityId::new(customer)),
            customer_name: Some(customer.into()),
            date,
            items: vec![InvoiceLine {
                product_id: EntityId::new("p1"),
                product_name: None,
                quantity,
                unit_price: total / quantity,
            }],
            total,
            payment_method: None,
        }
    }

    fn purchase(supplier: &str, date: NaiveDate, total: f64) -> PurchaseInvoice {
        PurchaseInvoice {
            id: EntityId::generate(),
            supplier_id: Some(EntityId::new(supplier)),
            supplier_name: Some(supplier.into()),
            date,
            items: Vec::new(),
            total,
            payment_method: None,
        }
    }

    #[test]
    fn financial_summary_filters_by_period() {
        let sales = vec![sale("c1", d(3, 5), 1_000.0, 10.0), sale("c1", d(4, 5), 9_999.0, 1.0)];
        let purchases = vec![purchase("s1", d(3, 6), 400.0)];
        let expenses = vec![Expense {
            id: EntityId::generate(),
            date: d(3, 7),
            amount: 100.0,
            category: "rent".into(),
            description: String::new(),
        }];
        let cash = vec![
            CashTransaction::income(1_000.0, categories::SALES, d(3, 5)),
            CashTransaction::expense(400.0, categories::PURCHASES, d(3, 6)),
            CashTransaction::income(50.0, categories::OTHER, d(2, 1)),
        ];

        let f = financial_summary(march(), &sales, &purchases, &expenses, &cash);
        assert_eq!(f.revenue, 1_000.0);
        assert_eq!(f.gross_profit, 600.0);
        assert_eq!(f.net_profit, 500.0);
        assert_eq!(f.profit_margin, 50.0);
        assert_eq!(f.net_cash_flow, 600.0);
        assert_eq!(f.cash_balance, 650.0);
        assert_eq!(f.invoice_count, 1);
    }

    #[test]
    fn retention_compares_with_previous_period() {
        let sales = vec![
            sale("c1", d(2, 10), 10.0, 1.0),
            sale("c2", d(2, 11), 10.0, 1.0),
            sale("c1", d(3, 10), 10.0, 1.0),
        ];
        let a = customer_analysis(march(), &[], &[], &sales);
        assert_eq!(a.active_customers, 1);
        assert_eq!(a.retention_rate, Metric::computed(50.0));

        let a = customer_analysis(march(), &[], &[], &sales[2..]);
        assert!(!a.retention_rate.is_computed());
    }

    #[test]
    fn supplier_placeholders_are_not_computed() {
        let suppliers = vec![SupplierAggregate::new(EntityId::new("s1"), "Parts")];
        let a = supplier_analysis(march(), &suppliers, &[purchase("s1", d(3, 2), 300.0)]);

        assert_eq!(a.active_suppliers, 1);
        assert_eq!(a.top_suppliers[0].amount, 300.0);
        assert!(!a.average_rating.is_computed());
        assert!(!a.on_time_delivery_rate.is_computed());
    }

    #[test]
    fn cash_flow_groups_by_category_and_month() {
        let cash = vec![
            CashTransaction::income(100.0, categories::SALES, d(3, 1)),
            CashTransaction::income(50.0, categories::SALES, d(3, 2)),
            CashTransaction::expense(30.0, categories::PURCHASES, d(3, 3)),
        ];
        let a = cash_flow_analysis(march(), &cash);

        assert_eq!(a.inflow_by_category.get(categories::SALES), Some(&150.0));
        assert_eq!(a.outflow_by_category.get(categories::PURCHASES), Some(&30.0));
        assert_eq!(a.monthly_net.get("2024-03"), Some(&120.0));
        assert_eq!(a.net, 120.0);
    }

    #[test]
    fn revenue_growth_needs_previous_revenue() {
        let financial = FinancialSummary {
            revenue: 150.0,
            ..FinancialSummary::default()
        };
        let inv = InventoryAnalysis::default();
        let pay = PaymentsAnalysis::default();

        let k = kpis(Some(&financial), Some(100.0), Some(&inv), Some(&pay));
        assert_eq!(k.revenue_growth, Metric::computed(50.0));
        assert_eq!(k.average_order_value, Metric::computed(150.0));
        assert!(!kpis(Some(&financial), Some(0.0), Some(&inv), Some(&pay)).revenue_growth.is_computed());
        assert!(!k.customer_satisfaction.is_computed());
    }

    #[test]
    fn kpis_from_missing_sections_are_not_computed() {
        let financial = FinancialSummary {
            revenue: 150.0,
            ..FinancialSummary::default()
        };
        let inv = InventoryAnalysis::default();

        let k = kpis(Some(&financial), Some(100.0), Some(&inv), None);
        assert!(k.gross_margin.is_computed());
        assert!(k.inventory_turnover.is_computed());
        assert!(!k.check_return_rate.is_computed());
        assert!(!k.installment_collection_rate.is_computed());

        let k = kpis(None, Some(100.0), Some(&inv), None);
        assert!(!k.revenue_growth.is_computed());
        assert!(!k.net_margin.is_computed());
    }
}
