use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizpulse_core::{DomainError, DomainResult, Entity, EntityId, days_between};

/// Installment lifecycle: `pending → {paid, defaulted}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Defaulted,
}

impl core::fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            InstallmentStatus::Pending => "pending",
            InstallmentStatus::Paid => "paid",
            InstallmentStatus::Defaulted => "defaulted",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub id: EntityId,
    /// Customer that owes this installment.
    pub holder_id: EntityId,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
}

impl Installment {
    pub(crate) fn transition(&mut self, to: InstallmentStatus) -> DomainResult<()> {
        if self.status != InstallmentStatus::Pending || to == InstallmentStatus::Pending {
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

    /// Days past the due date (0 or negative when not yet due).
    pub fn days_past_due(&self, today: NaiveDate) -> i64 {
        days_between(self.due_date, today)
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == InstallmentStatus::Pending && self.days_past_due(today) > 0
    }

    /// Counts toward the holder's `overdue_installments_amount`.
    pub fn counts_as_overdue(&self, today: NaiveDate) -> bool {
        self.is_overdue(today) || self.status == InstallmentStatus::Defaulted
    }
}

impl Entity for Installment {
    const KIND: &'static str = "installment";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstallment {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub holder_id: EntityId,
    pub amount: f64,
    pub due_date: NaiveDate,
}

impl NewInstallment {
    pub(crate) fn into_installment(self) -> DomainResult<Installment> {
        if !(self.amount.is_finite() && self.amount > 0.0) {
            return Err(DomainError::validation("installment amount must be positive"));
        }
        Ok(Installment {
            id: self.id.unwrap_or_else(EntityId::generate),
            holder_id: self.holder_id,
            amount: self.amount,
            due_date: self.due_date,
            status: InstallmentStatus::Pending,
            paid_date: None,
        })
    }
}

/// A pending installment past its due date.
#[derive(Debug, Clone, PartialEq)]
pub struct OverdueInstallment {
    pub installment: Installment,
    pub days_past_due: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn test_installment() -> Installment {
        NewInstallment {
            id: Some(EntityId::new("i1")),
            holder_id: EntityId::new("c1"),
            amount: 300.0,
            due_date: d(3, 1),
        }
        .into_installment()
        .unwrap()
    }

    #[test]
    fn paid_installment_is_terminal() {
        let mut i = test_installment();
        i.transition(InstallmentStatus::Paid).unwrap();
        assert!(i.transition(InstallmentStatus::Defaulted).is_err());
        assert!(i.transition(InstallmentStatus::Paid).is_err());
    }

    #[test]
    fn overdue_and_default_accounting() {
        let mut i = test_installment();
        assert!(!i.is_overdue(d(3, 1)));
        assert!(i.is_overdue(d(3, 2)));
        assert_eq!(i.days_past_due(d(3, 11)), 10);

        i.transition(InstallmentStatus::Defaulted).unwrap();
        assert!(!i.is_overdue(d(4, 1)));
        assert!(i.counts_as_overdue(d(4, 1)));
    }
}
