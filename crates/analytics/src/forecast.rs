//! Next-month forecast: last value, plus trend slope, plus a share of the
//! current calendar month's seasonal mean.

use serde::{Deserialize, Serialize};

use bizpulse_core::MonthKey;

use crate::seasonal::SeasonalPattern;
use crate::series::{SeriesPoint, values};
use crate::settings::ForecastSettings;
use crate::stats;
use crate::trend::{Trend, linear_trend};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub next_month_prediction: f64,
    pub last_observed: f64,
    pub trend: Trend,
    pub seasonal_adjustment: f64,
    /// Percent, within the configured bounds.
    pub confidence: f64,
    pub observations: usize,
}

/// `clamp(100 - CoV * 50, min, max)`; fixed at `min` below the point threshold.
pub fn confidence(values: &[f64], settings: &ForecastSettings) -> f64 {
    if values.len() < settings.min_points_for_confidence {
        return settings.min_confidence;
    }
    let raw = 100.0 - stats::coefficient_of_variation(values) * 50.0;
    raw.clamp(settings.min_confidence, settings.max_confidence)
}

pub fn forecast(series: &[SeriesPoint], current_month: MonthKey, settings: &ForecastSettings) -> Forecast {
    let observed = values(series);
    let trend = linear_trend(&observed);
    let last_observed = observed.last().copied().unwrap_or(0.0);

    let pattern = SeasonalPattern::from_series(series);
    let seasonal_adjustment = pattern
        .bucket(current_month.month_index())
        .map(|b| b.mean * settings.seasonal_factor)
        .unwrap_or(0.0);

    Forecast {
        next_month_prediction: last_observed + trend.slope + seasonal_adjustment,
        last_observed,
        trend,
        seasonal_adjustment,
        confidence: confidence(&observed, settings),
        observations: observed.len(),
    }
}
