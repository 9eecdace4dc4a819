use serde::{Deserialize, Serialize};

/// Tunables for forecasting, demand and churn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// Share of the current month's seasonal mean added to a forecast.
    pub seasonal_factor: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    /// Below this many observations confidence is fixed at `min_confidence`.
    pub min_points_for_confidence: usize,
    /// Months in the zero-filled sales window.
    pub history_months: usize,
    /// Trailing window for product velocity.
    pub velocity_window_days: i64,
    /// Horizon a reorder suggestion should cover.
    pub reorder_horizon_days: i64,
    /// Inter-purchase gap assumed for customers with fewer than two purchases.
    pub default_purchase_interval_days: f64,
    pub churn_floor_days: i64,
    pub churn_floor_score: f64,
    pub churn_certain_days: i64,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            seasonal_factor: 0.10,
            min_confidence: 50.0,
            max_confidence: 95.0,
            min_points_for_confidence: 3,
            history_months: 12,
            velocity_window_days: 30,
            reorder_horizon_days: 30,
            default_purchase_interval_days: 30.0,
            churn_floor_days: 90,
            churn_floor_score: 75.0,
            churn_certain_days: 180,
        }
    }
}
