//! `bizpulse-analytics`
//!
//! Derived insights over transaction history: monthly series, trend,
//! seasonality, forecasts, product demand, churn, segmentation and financial
//! projections.
//!
//! Nothing here mutates stored state. Results are plain values that callers
//! persist or render.

pub mod churn;
pub mod demand;
pub mod engine;
pub mod forecast;
pub mod insights;
pub mod projection;
pub mod seasonal;
pub mod segment;
pub mod series;
pub mod settings;
pub mod stats;
pub mod trend;

pub use churn::{ChurnRisk, churn_risk};
pub use demand::{NO_DEPLETION_DAYS, ProductDemand, product_demand};
pub use engine::AnalyticsEngine;
pub use forecast::{Forecast, confidence, forecast};
pub use insights::{CustomerInsight, customer_insights};
pub use projection::{FinancialProjection, financial_projection};
pub use seasonal::{SeasonalBucket, SeasonalPattern};
pub use segment::{Segment, segment_for};
pub use series::{SeriesPoint, monthly_expense_series, monthly_purchases_series, monthly_sales_series};
pub use settings::ForecastSettings;
pub use trend::{Trend, linear_trend};
