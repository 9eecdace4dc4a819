use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizpulse_core::days_between;

use crate::settings::ForecastSettings;
use crate::stats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnRisk {
    /// 0..=100.
    pub risk_score: f64,
    /// `None` when the customer never purchased.
    pub days_since_last_purchase: Option<i64>,
    pub avg_inter_purchase_days: f64,
}

/// Recency versus the customer's own purchase cadence.
///
/// `risk = min(100, days_since / max(avg_gap, 1) * 25)`, raised to the floor
/// score past `churn_floor_days` and to 100 past `churn_certain_days`.
pub fn churn_risk(purchase_dates: &[NaiveDate], today: NaiveDate, settings: &ForecastSettings) -> ChurnRisk {
    let mut dates = purchase_dates.to_vec();
    dates.sort();

    let Some(last) = dates.last().copied() else {
        return ChurnRisk {
            risk_score: 100.0,
            days_since_last_purchase: None,
            avg_inter_purchase_days: settings.default_purchase_interval_days,
        };
    };

    let gaps: Vec<f64> = dates
        .windows(2)
        .map(|w| days_between(w[0], w[1]) as f64)
        .collect();
    let avg_gap = if gaps.is_empty() {
        settings.default_purchase_interval_days
    } else {
        stats::mean(&gaps)
    };

    let days_since = days_between(last, today).max(0);
    let mut risk = (days_since as f64 / avg_gap.max(1.0) * 25.0).min(100.0);
    if days_since > settings.churn_certain_days {
        risk = 100.0;
    } else if days_since > settings.churn_floor_days {
        risk = risk.max(settings.churn_floor_score);
    }

    ChurnRisk {
        risk_score: risk,
        days_since_last_purchase: Some(days_since),
        avg_inter_purchase_days: avg_gap,
    }
}
