//! Risk scoring (pure, no IO).

use serde::{Deserialize, Serialize};

use crate::party::{CustomerAggregate, RiskLevel, SupplierAggregate};

/// Inputs the scorer looks at, taken from a fully-populated aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RiskSignals {
    pub total_debt: f64,
    pub total_purchases: f64,
    pub pending_checks_amount: f64,
    pub overdue_installments_amount: f64,
    pub purchase_frequency: f64,
    /// Supplier rating (1–5); `None` for customers and unrated suppliers.
    pub average_rating: Option<f64>,
}

impl From<&CustomerAggregate> for RiskSignals {
    fn from(c: &CustomerAggregate) -> Self {
        Self {
            total_debt: c.total_debt,
            total_purchases: c.total_purchases,
            pending_checks_amount: c.pending_checks_amount,
            overdue_installments_amount: c.overdue_installments_amount,
            purchase_frequency: c.purchase_frequency,
            average_rating: None,
        }
    }
}

impl From<&SupplierAggregate> for RiskSignals {
    fn from(s: &SupplierAggregate) -> Self {
        Self {
            total_debt: s.total_debt,
            total_purchases: s.total_purchases,
            pending_checks_amount: s.pending_checks_amount,
            overdue_installments_amount: s.overdue_installments_amount,
            purchase_frequency: s.purchase_frequency,
            average_rating: s.average_rating,
        }
    }
}

/// Threshold table. `(high, low)` pairs: above `high` adds the larger weight,
/// above `low` the smaller one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub debt_ratio: (f64, f64),
    pub pending_checks: (f64, f64),
    pub overdue_installments: (f64, f64),
    /// Orders/month under which a low-frequency point is added (`None` disables).
    pub min_frequency: Option<f64>,
    /// Ratings under `(high, low)` add 2 / 1 points (`None` disables).
    pub rating: Option<(f64, f64)>,
}

impl RiskThresholds {
    pub fn customer() -> Self {
        Self {
            debt_ratio: (0.5, 0.2),
            pending_checks: (10_000.0, 5_000.0),
            overdue_installments: (5_000.0, 2_000.0),
            min_frequency: Some(1.0),
            rating: None,
        }
    }

    pub fn supplier() -> Self {
        Self {
            debt_ratio: (0.3, 0.1),
            pending_checks: (20_000.0, 10_000.0),
            overdue_installments: (5_000.0, 2_000.0),
            min_frequency: None,
            rating: Some((3.0, 4.0)),
        }
    }
}

/// Maps aggregate signals to a [`RiskLevel`].
///
/// Score buckets: `>= 4` high, `>= 2` medium, otherwise low.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScorer {
    customer: RiskThresholds,
    supplier: RiskThresholds,
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self {
            customer: RiskThresholds::customer(),
            supplier: RiskThresholds::supplier(),
        }
    }
}

impl RiskScorer {
    pub fn new(customer: RiskThresholds, supplier: RiskThresholds) -> Self {
        Self { customer, supplier }
    }

    pub fn score(thresholds: &RiskThresholds, s: &RiskSignals) -> u32 {
        let mut score = 0;

        let debt_ratio = s.total_debt / s.total_purchases.max(1.0);
        if debt_ratio > thresholds.debt_ratio.0 {
            score += 3;
        } else if debt_ratio > thresholds.debt_ratio.1 {
            score += 1;
        }

        if s.pending_checks_amount > thresholds.pending_checks.0 {
            score += 2;
        } else if s.pending_checks_amount > thresholds.pending_checks.1 {
            score += 1;
        }

        if s.overdue_installments_amount > thresholds.overdue_installments.0 {
            score += 2;
        } else if s.overdue_installments_amount > thresholds.overdue_installments.1 {
            score += 1;
        }

        if let Some(min) = thresholds.min_frequency {
            if s.purchase_frequency < min {
                score += 1;
            }
        }

        if let (Some((bad, fair)), Some(rating)) = (thresholds.rating, s.average_rating) {
            if rating < bad {
                score += 2;
            } else if rating < fair {
                score += 1;
            }
        }

        score
    }

    pub fn level_for(score: u32) -> RiskLevel {
        if score >= 4 {
            RiskLevel::High
        } else if score >= 2 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn customer_risk(&self, customer: &CustomerAggregate) -> RiskLevel {
        Self::level_for(Self::score(&self.customer, &RiskSignals::from(customer)))
    }

    pub fn supplier_risk(&self, supplier: &SupplierAggregate) -> RiskLevel {
        Self::level_for(Self::score(&self.supplier, &RiskSignals::from(supplier)))
    }
}
