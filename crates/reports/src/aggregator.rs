use serde::de::DeserializeOwned;
use tracing::{info, warn};

use bizpulse_accounting::{CashTransaction, Expense};
use bizpulse_analytics::{
    CustomerInsight, ForecastSettings, customer_insights, financial_projection, forecast,
    monthly_expense_series, monthly_purchases_series, monthly_sales_series, product_demand,
};
use bizpulse_core::{Clock, DomainResult, MonthKey};
use bizpulse_inventory::Product;
use bizpulse_parties::{CustomerAggregate, SupplierAggregate};
use bizpulse_payments::{Check, Installment, OVERDUE_CHECK_DAYS, checks_summary, installments_summary};
use bizpulse_purchasing::PurchaseInvoice;
use bizpulse_sales::SalesInvoice;
use bizpulse_store::{Collections, DocumentStore, keys};

use chrono::NaiveDate;

use crate::assessment::{identify_opportunities, identify_risks, recommendations};
use crate::report::{PaymentsAnalysis, Predictions, ReportPeriod, UnifiedReport};
use crate::sections;

/// Composes every component's output into one [`UnifiedReport`].
///
/// Inputs are read strictly: a malformed collection fails only the sections
/// that need it.
#[derive(Debug, Clone)]
pub struct UnifiedReportAggregator<S, C> {
    collections: Collections<S>,
    clock: C,
    forecast: ForecastSettings,
    overdue_check_days: i64,
}

impl<S, C> UnifiedReportAggregator<S, C>
where
    S: DocumentStore,
    C: Clock,
{
    pub fn new(collections: Collections<S>, clock: C) -> Self {
        Self {
            collections,
            clock,
            forecast: ForecastSettings::default(),
            overdue_check_days: OVERDUE_CHECK_DAYS,
        }
    }

    pub fn with_forecast_settings(mut self, settings: ForecastSettings) -> Self {
        self.forecast = settings;
        self
    }

    pub fn with_overdue_check_days(mut self, days: i64) -> Self {
        self.overdue_check_days = days;
        self
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> DomainResult<Vec<T>> {
        self.collections.read_collection(key).map(|v| v.value)
    }

    fn section<T, F>(&self, name: &str, degraded: &mut Vec<String>, build: F) -> T
    where
        T: Default,
        F: FnOnce() -> DomainResult<T>,
    {
        match build() {
            Ok(value) => value,
            Err(err) => {
                warn!(section = name, error = %err, "report section degraded");
                degraded.push(name.to_string());
                T::default()
            }
        }
    }

    pub fn generate(&self, start: NaiveDate, end: NaiveDate) -> UnifiedReport {
        let period = ReportPeriod { start, end };
        let today = self.clock.today();
        let mut degraded = Vec::new();

        let financial = self.section("financial", &mut degraded, || {
            Ok(sections::financial_summary(
                period,
                &self.load::<SalesInvoice>(keys::SALES_INVOICES)?,
                &self.load::<PurchaseInvoice>(keys::PURCHASE_INVOICES)?,
                &self.load::<Expense>(keys::EXPENSES)?,
                &self.load::<CashTransaction>(keys::CASH_TRANSACTIONS)?,
            ))
        });

        let insights: Vec<CustomerInsight> = self.section("customer_insights", &mut degraded, || {
            Ok(customer_insights(
                &self.load::<CustomerAggregate>(keys::CUSTOMERS)?,
                &self.load::<SalesInvoice>(keys::SALES_INVOICES)?,
                today,
                &self.forecast,
            ))
        });

        let customers = self.section("customers", &mut degraded, || {
            Ok(sections::customer_analysis(
                period,
                &self.load::<CustomerAggregate>(keys::CUSTOMERS)?,
                &insights,
                &self.load::<SalesInvoice>(keys::SALES_INVOICES)?,
            ))
        });

        let suppliers = self.section("suppliers", &mut degraded, || {
            Ok(sections::supplier_analysis(
                period,
                &self.load::<SupplierAggregate>(keys::SUPPLIERS)?,
                &self.load::<PurchaseInvoice>(keys::PURCHASE_INVOICES)?,
            ))
        });

        let inventory = self.section("inventory", &mut degraded, || {
            let products = self.load::<Product>(keys::PRODUCTS)?;
            let sales = self.load::<SalesInvoice>(keys::SALES_INVOICES)?;
            let demand: Vec<_> = products
                .iter()
                .map(|p| product_demand(p, &sales, today, &self.forecast))
                .collect();
            Ok(sections::inventory_analysis(period, &products, &demand, &sales))
        });

        let payments = self.section("payments", &mut degraded, || {
            Ok(PaymentsAnalysis {
                checks: checks_summary(&self.load::<Check>(keys::CHECKS)?, today, self.overdue_check_days),
                installments: installments_summary(&self.load::<Installment>(keys::INSTALLMENTS)?, today),
            })
        });

        let cash_flow = self.section("cash_flow", &mut degraded, || {
            Ok(sections::cash_flow_analysis(
                period,
                &self.load::<CashTransaction>(keys::CASH_TRANSACTIONS)?,
            ))
        });

        let previous_revenue: f64 = self.section("kpis", &mut degraded, || {
            let previous = period.previous();
            Ok(self
                .load::<SalesInvoice>(keys::SALES_INVOICES)?
                .iter()
                .filter(|s| previous.contains(s.date))
                .map(|s| s.total)
                .sum())
        });
        let ok = |name: &str| !degraded.iter().any(|d| d == name);
        let kpis = sections::kpis(
            ok("financial").then_some(&financial),
            ok("kpis").then_some(previous_revenue),
            ok("inventory").then_some(&inventory),
            ok("payments").then_some(&payments),
        );

        let predictions = self.section("predictions", &mut degraded, || {
            let current = MonthKey::of(today);
            let sales_series = monthly_sales_series(
                &self.load::<SalesInvoice>(keys::SALES_INVOICES)?,
                current,
                self.forecast.history_months,
            );
            let purchases_series =
                monthly_purchases_series(&self.load::<PurchaseInvoice>(keys::PURCHASE_INVOICES)?);
            let expense_series = monthly_expense_series(&self.load::<Expense>(keys::EXPENSES)?);
            let next = forecast(&sales_series, current, &self.forecast);
            let projection = financial_projection(
                next.next_month_prediction,
                &sales_series,
                &purchases_series,
                &expense_series,
            );
            Ok(Predictions {
                next_month_sales: Some(next),
                projection: Some(projection),
            })
        });

        let ok = |name: &str| !degraded.iter().any(|d| d == name);
        let risks = identify_risks(
            ok("financial").then_some(&financial),
            ok("customers").then_some(&customers),
            ok("inventory").then_some(&inventory),
            ok("payments").then_some(&payments),
            ok("cash_flow").then_some(&cash_flow),
        );
        let opportunities =
            identify_opportunities(&insights, &inventory, predictions.next_month_sales.as_ref());
        let recommendations = recommendations(&risks, &opportunities);

        info!(
            start = %start,
            end = %end,
            risks = risks.len(),
            degraded = degraded.len(),
            "unified report generated"
        );

        UnifiedReport {
            generated_at: self.clock.now(),
            period,
            financial,
            customers,
            suppliers,
            inventory,
            payments,
            cash_flow,
            kpis,
            risks,
            opportunities,
            predictions,
            recommendations,
            degraded_sections: degraded,
        }
    }
}
