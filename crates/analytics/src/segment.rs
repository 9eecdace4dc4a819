use serde::{Deserialize, Serialize};

/// Rule-based customer value tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Segment {
    HighValue,
    MediumValue,
    LowValue,
}

/// `frequency` is the customer's order count.
pub fn segment_for(total_spent: f64, frequency: f64) -> Segment {
    if total_spent > 10_000.0 && frequency > 5.0 {
        Segment::HighValue
    } else if total_spent > 5_000.0 || frequency > 3.0 {
        Segment::MediumValue
    } else {
        Segment::LowValue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers() {
        assert_eq!(segment_for(10_001.0, 6.0), Segment::HighValue);
        assert_eq!(segment_for(10_001.0, 5.0), Segment::MediumValue);
        assert_eq!(segment_for(5_000.0, 4.0), Segment::MediumValue);
        assert_eq!(segment_for(5_000.0, 3.0), Segment::LowValue);
        assert_eq!(segment_for(0.0, 0.0), Segment::LowValue);
    }
}
