//! Store-backed entry point for every analytics computation.

use std::cmp::Ordering;

use tracing::debug;

use bizpulse_accounting::Expense;
use bizpulse_core::{Clock, MonthKey};
use bizpulse_inventory::Product;
use bizpulse_parties::CustomerAggregate;
use bizpulse_purchasing::PurchaseInvoice;
use bizpulse_sales::SalesInvoice;
use bizpulse_store::{Collections, DocumentStore, keys};

use crate::demand::{ProductDemand, product_demand};
use crate::forecast::{Forecast, forecast};
use crate::insights::{CustomerInsight, customer_insights};
use crate::projection::{FinancialProjection, financial_projection};
use crate::seasonal::SeasonalPattern;
use crate::series::{SeriesPoint, monthly_expense_series, monthly_purchases_series, monthly_sales_series};
use crate::settings::ForecastSettings;

#[derive(Debug, Clone)]
pub struct AnalyticsEngine<S, C> {
    collections: Collections<S>,
    clock: C,
    settings: ForecastSettings,
}

impl<S, C> AnalyticsEngine<S, C>
where
    S: DocumentStore,
    C: Clock,
{
    pub fn new(collections: Collections<S>, clock: C) -> Self {
        Self {
            collections,
            clock,
            settings: ForecastSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ForecastSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    fn current_month(&self) -> MonthKey {
        MonthKey::of(self.clock.today())
    }

    fn sales(&self) -> Vec<SalesInvoice> {
        self.collections.get_collection(keys::SALES_INVOICES, Vec::new())
    }

    /// Zero-filled window of `history_months` ending this month.
    pub fn sales_series(&self) -> Vec<SeriesPoint> {
        monthly_sales_series(&self.sales(), self.current_month(), self.settings.history_months)
    }

    /// Months with purchases only.
    pub fn purchases_series(&self) -> Vec<SeriesPoint> {
        let invoices: Vec<PurchaseInvoice> =
            self.collections.get_collection(keys::PURCHASE_INVOICES, Vec::new());
        monthly_purchases_series(&invoices)
    }

    pub fn expense_series(&self) -> Vec<SeriesPoint> {
        let expenses: Vec<Expense> = self.collections.get_collection(keys::EXPENSES, Vec::new());
        monthly_expense_series(&expenses)
    }

    pub fn sales_seasonality(&self) -> SeasonalPattern {
        SeasonalPattern::from_series(&self.sales_series())
    }

    pub fn sales_forecast(&self) -> Forecast {
        let result = forecast(&self.sales_series(), self.current_month(), &self.settings);
        debug!(
            prediction = result.next_month_prediction,
            confidence = result.confidence,
            "sales forecast computed"
        );
        result
    }

    pub fn purchases_forecast(&self) -> Forecast {
        forecast(&self.purchases_series(), self.current_month(), &self.settings)
    }

    /// Every product, soonest to run out first.
    pub fn product_demand(&self) -> Vec<ProductDemand> {
        let products: Vec<Product> = self.collections.get_collection(keys::PRODUCTS, Vec::new());
        let sales = self.sales();
        let today = self.clock.today();
        let mut demand: Vec<ProductDemand> = products
            .iter()
            .map(|p| product_demand(p, &sales, today, &self.settings))
            .collect();
        demand.sort_by(|a, b| {
            a.days_until_empty
                .partial_cmp(&b.days_until_empty)
                .unwrap_or(Ordering::Equal)
        });
        demand
    }

    pub fn customer_insights(&self) -> Vec<CustomerInsight> {
        let customers: Vec<CustomerAggregate> =
            self.collections.get_collection(keys::CUSTOMERS, Vec::new());
        customer_insights(&customers, &self.sales(), self.clock.today(), &self.settings)
    }

    /// The `n` customers with the highest lifetime value.
    pub fn top_customers(&self, n: usize) -> Vec<CustomerInsight> {
        let mut insights = self.customer_insights();
        insights.sort_by(|a, b| {
            b.lifetime_value
                .partial_cmp(&a.lifetime_value)
                .unwrap_or(Ordering::Equal)
        });
        insights.truncate(n);
        insights
    }

    pub fn financial_projection(&self) -> FinancialProjection {
        financial_projection(
            self.sales_forecast().next_month_prediction,
            &self.sales_series(),
            &self.purchases_series(),
            &self.expense_series(),
        )
    }
}
