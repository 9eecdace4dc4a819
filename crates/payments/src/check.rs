use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizpulse_core::{DomainError, DomainResult, Entity, EntityId, days_between};

/// Check lifecycle: `pending → {cashed, returned, cancelled}`; all three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pending,
    Cashed,
    Returned,
    Cancelled,
}

impl CheckStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, CheckStatus::Pending)
    }
}

impl core::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            CheckStatus::Pending => "pending",
            CheckStatus::Cashed => "cashed",
            CheckStatus::Returned => "returned",
            CheckStatus::Cancelled => "cancelled",
        })
    }
}

/// Who a check belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolderType {
    Customer,
    Supplier,
    Employee,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    pub id: EntityId,
    pub check_number: String,
    pub amount: f64,
    pub date_received: NaiveDate,
    pub date_issued: NaiveDate,
    #[serde(default)]
    pub bank_name: String,
    pub status: CheckStatus,
    pub holder_type: HolderType,
    #[serde(default)]
    pub holder_id: Option<EntityId>,
    #[serde(default)]
    pub holder_name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub cashing_date: Option<NaiveDate>,
    #[serde(default)]
    pub return_reason: Option<String>,
}

impl Check {
    /// Move to `to`, rejecting anything but a transition out of `pending`.
    pub(crate) fn transition(&mut self, to: CheckStatus) -> DomainResult<()> {
        if self.status.is_terminal() || to == CheckStatus::Pending {
            return Err(DomainError::invalid_transition(
                Self::KIND,
                &self.id,
                self.status,
                to,
            ));
        }
        self.status = to;
        Ok(())
    }

    /// Days since the check was received (negative if post-dated).
    pub fn days_pending(&self, today: NaiveDate) -> i64 {
        days_between(self.date_received, today)
    }

    pub fn is_overdue(&self, today: NaiveDate, after_days: i64) -> bool {
        self.status == CheckStatus::Pending && self.days_pending(today) > after_days
    }
}

impl Entity for Check {
    const KIND: &'static str = "check";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

/// Input for registering a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCheck {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub check_number: String,
    pub amount: f64,
    pub date_received: NaiveDate,
    pub date_issued: NaiveDate,
    #[serde(default)]
    pub bank_name: String,
    pub holder_type: HolderType,
    #[serde(default)]
    pub holder_id: Option<EntityId>,
    #[serde(default)]
    pub holder_name: String,
    #[serde(default)]
    pub notes: String,
}

impl NewCheck {
    pub(crate) fn validate(&self) -> DomainResult<()> {
        if self.check_number.trim().is_empty() {
            return Err(DomainError::validation("check number cannot be empty"));
        }
        if !(self.amount.is_finite() && self.amount > 0.0) {
            return Err(DomainError::validation("check amount must be positive"));
        }
        if self.holder_type != HolderType::Other && self.holder_id.is_none() {
            return Err(DomainError::validation(
                "holder id is required unless holder type is `other`",
            ));
        }
        Ok(())
    }

    pub(crate) fn into_check(self) -> Check {
        Check {
            id: self.id.unwrap_or_else(EntityId::generate),
            check_number: self.check_number,
            amount: self.amount,
            date_received: self.date_received,
            date_issued: self.date_issued,
            bank_name: self.bank_name,
            status: CheckStatus::Pending,
            holder_type: self.holder_type,
            holder_id: self.holder_id,
            holder_name: self.holder_name,
            notes: self.notes,
            cashing_date: None,
            return_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn test_new_check() -> NewCheck {
        NewCheck {
            id: Some(EntityId::new("1001")),
            check_number: "1001".into(),
            amount: 5_000.0,
            date_received: d(1),
            date_issued: d(1),
            bank_name: "First Bank".into(),
            holder_type: HolderType::Customer,
            holder_id: Some(EntityId::new("c1")),
            holder_name: "Acme".into(),
            notes: String::new(),
        }
    }

    #[test]
    fn terminal_states_reject_further_transitions() {
        for terminal in [CheckStatus::Cashed, CheckStatus::Returned, CheckStatus::Cancelled] {
            let mut check = test_new_check().into_check();
            check.transition(terminal).unwrap();

            for next in [CheckStatus::Cashed, CheckStatus::Returned, CheckStatus::Cancelled] {
                let err = check.transition(next).unwrap_err();
                match err {
                    DomainError::InvalidTransition { .. } => {}
                    _ => panic!("Expected InvalidTransition"),
                }
                assert_eq!(check.status, terminal);
            }
        }
    }

    #[test]
    fn pending_cannot_transition_to_pending() {
        let mut check = test_new_check().into_check();
        assert!(check.transition(CheckStatus::Pending).is_err());
    }

    #[test]
    fn overdue_is_strictly_after_threshold() {
        let check = test_new_check().into_check();
        assert!(!check.is_overdue(d(31), 30));
        let feb_1 = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(check.is_overdue(feb_1, 30));
    }

    #[test]
    fn validation_rules() {
        let mut c = test_new_check();
        c.amount = 0.0;
        assert!(c.validate().is_err());

        let mut c = test_new_check();
        c.holder_id = None;
        assert!(c.validate().is_err());
        c.holder_type = HolderType::Other;
        assert!(c.validate().is_ok());
    }
}
