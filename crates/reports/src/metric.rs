use serde::{Deserialize, Serialize};

/// A report figure that is either derived from data or explicitly absent.
///
/// Figures with no data source behind them are reported as `NotComputed`
/// instead of a made-up constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Metric<T> {
    Computed { value: T },
    NotComputed { reason: String },
}

impl<T> Metric<T> {
    pub fn computed(value: T) -> Self {
        Metric::Computed { value }
    }

    pub fn not_computed(reason: impl Into<String>) -> Self {
        Metric::NotComputed {
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Metric::Computed { value } => Some(value),
            Metric::NotComputed { .. } => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Metric::Computed { .. })
    }
}

impl<T> Default for Metric<T> {
    fn default() -> Self {
        Metric::not_computed("section unavailable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape() {
        let json = serde_json::to_value(Metric::computed(12.5)).unwrap();
        assert_eq!(json["status"], "computed");
        assert_eq!(json["value"], 12.5);

        let json = serde_json::to_value(Metric::<f64>::not_computed("no data")).unwrap();
        assert_eq!(json["status"], "notComputed");
        assert_eq!(json["reason"], "no data");
    }

    #[test]
    fn default_is_not_computed() {
        let m: Metric<u32> = Metric::default();
        assert!(!m.is_computed());
        assert_eq!(m.value(), None);
    }
}
