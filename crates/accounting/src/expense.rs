use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizpulse_core::{Entity, EntityId};

/// Operating expense entered outside the engine (rent, salaries, utilities...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: EntityId,
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

impl Entity for Expense {
    const KIND: &'static str = "expense";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

/// Sum of expenses dated within `[start, end]`.
pub fn total_in_range(expenses: &[Expense], start: NaiveDate, end: NaiveDate) -> f64 {
    expenses
        .iter()
        .filter(|e| e.date >= start && e.date <= end)
        .map(|e| e.amount)
        .sum()
}
