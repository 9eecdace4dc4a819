use serde::{Deserialize, Serialize};

/// Least-squares line of value against bucket index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
}

/// Ordinary least squares over `(i, values[i])`. Fewer than two points give a
/// flat line through the single value (or zero).
pub fn linear_trend(values: &[f64]) -> Trend {
    let n = values.len();
    if n < 2 {
        return Trend {
            slope: 0.0,
            intercept: values.first().copied().unwrap_or(0.0),
        };
    }

    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n_f;

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxy += dx * (y - mean_y);
        sxx += dx * dx;
    }

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    Trend {
        slope,
        intercept: mean_y - slope * mean_x,
    }
}
