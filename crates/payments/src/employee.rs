use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizpulse_core::{Entity, EntityId};

use crate::check::CheckStatus;

/// Check handed to/received from an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCheckEntry {
    pub check_id: EntityId,
    pub check_number: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub status: CheckStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub checks_history: Vec<EmployeeCheckEntry>,
}

impl Employee {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            checks_history: Vec::new(),
        }
    }
}

impl Entity for Employee {
    const KIND: &'static str = "employee";

    fn id(&self) -> &EntityId {
        &self.id
    }
}
