//! Month-of-year pattern across every year in a series.
//!
//! With fewer than twelve observed months some buckets hold a single sample
//! (variance 0) and others are absent. No interpolation is applied.

use serde::{Deserialize, Serialize};

use crate::series::SeriesPoint;
use crate::stats;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalBucket {
    pub mean: f64,
    pub variance: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPattern {
    buckets: [Option<SeasonalBucket>; 12],
}

impl SeasonalPattern {
    pub fn from_series(series: &[SeriesPoint]) -> Self {
        let mut grouped: [Vec<f64>; 12] = Default::default();
        for point in series {
            grouped[point.month.month_index()].push(point.value);
        }

        let mut buckets = [None; 12];
        for (idx, values) in grouped.iter().enumerate() {
            if !values.is_empty() {
                buckets[idx] = Some(SeasonalBucket {
                    mean: stats::mean(values),
                    variance: stats::variance(values),
                    samples: values.len(),
                });
            }
        }
        Self { buckets }
    }

    /// Bucket for month-of-year `index` (0 = January).
    pub fn bucket(&self, index: usize) -> Option<&SeasonalBucket> {
        self.buckets.get(index).and_then(Option::as_ref)
    }

    pub fn observed_months(&self) -> usize {
        self.buckets.iter().flatten().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizpulse_core::MonthKey;

    #[test]
    fn groups_by_calendar_month_across_years() {
        let series = vec![
            SeriesPoint::new(MonthKey::new(2022, 12), 100.0),
            SeriesPoint::new(MonthKey::new(2023, 12), 300.0),
            SeriesPoint::new(MonthKey::new(2024, 1), 50.0),
        ];
        let pattern = SeasonalPattern::from_series(&series);

        let dec = pattern.bucket(11).unwrap();
        assert_eq!(dec.mean, 200.0);
        assert_eq!(dec.variance, 10_000.0);
        assert_eq!(dec.samples, 2);

        let jan = pattern.bucket(0).unwrap();
        assert_eq!(jan.variance, 0.0);
        assert!(pattern.bucket(5).is_none());
        assert_eq!(pattern.observed_months(), 2);
    }
}
