//! Read-only rollups over checks and installments.

use chrono::NaiveDate;
use serde::Serialize;

use crate::check::{Check, CheckStatus};
use crate::installment::{Installment, InstallmentStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTotals {
    pub count: usize,
    pub amount: f64,
}

impl StatusTotals {
    fn add(&mut self, amount: f64) {
        self.count += 1;
        self.amount += amount;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecksSummary {
    pub pending: StatusTotals,
    pub cashed: StatusTotals,
    pub returned: StatusTotals,
    pub cancelled: StatusTotals,
    /// Subset of `pending`.
    pub overdue: StatusTotals,
}

impl ChecksSummary {
    /// Share of settled checks (cashed or returned) that bounced, in percent.
    pub fn return_rate(&self) -> f64 {
        let settled = self.cashed.count + self.returned.count;
        if settled == 0 {
            return 0.0;
        }
        self.returned.count as f64 / settled as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentsSummary {
    pub pending: StatusTotals,
    pub paid: StatusTotals,
    pub defaulted: StatusTotals,
    /// Subset of `pending`.
    pub overdue: StatusTotals,
    /// Pending installments due in the next 30 days.
    pub due_soon: StatusTotals,
}

impl InstallmentsSummary {
    /// Paid share of everything no longer pending, in percent.
    pub fn collection_rate(&self) -> f64 {
        let closed = self.paid.amount + self.defaulted.amount;
        if closed <= 0.0 {
            return 0.0;
        }
        self.paid.amount / closed * 100.0
    }
}

pub fn checks_summary(checks: &[Check], today: NaiveDate, overdue_after_days: i64) -> ChecksSummary {
    let mut summary = ChecksSummary::default();
    for check in checks {
        match check.status {
            CheckStatus::Pending => {
                summary.pending.add(check.amount);
                if check.is_overdue(today, overdue_after_days) {
                    summary.overdue.add(check.amount);
                }
            }
            CheckStatus::Cashed => summary.cashed.add(check.amount),
            CheckStatus::Returned => summary.returned.add(check.amount),
            CheckStatus::Cancelled => summary.cancelled.add(check.amount),
        }
    }
    summary
}

const DUE_SOON_DAYS: i64 = 30;

pub fn installments_summary(installments: &[Installment], today: NaiveDate) -> InstallmentsSummary {
    let mut summary = InstallmentsSummary::default();
    for installment in installments {
        match installment.status {
            InstallmentStatus::Pending => {
                summary.pending.add(installment.amount);
                let past_due = installment.days_past_due(today);
                if past_due > 0 {
                    summary.overdue.add(installment.amount);
                } else if -past_due <= DUE_SOON_DAYS {
                    summary.due_soon.add(installment.amount);
                }
            }
            InstallmentStatus::Paid => summary.paid.add(installment.amount),
            InstallmentStatus::Defaulted => summary.defaulted.add(installment.amount),
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::HolderType;
    use bizpulse_core::EntityId;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn check(amount: f64, status: CheckStatus, days_ago: i64) -> Check {
        Check {
            id: EntityId::generate(),
            check_number: "n".into(),
            amount,
            date_received: today() - Duration::days(days_ago),
            date_issued: today() - Duration::days(days_ago),
            bank_name: String::new(),
            status,
            holder_type: HolderType::Other,
            holder_id: None,
            holder_name: String::new(),
            notes: String::new(),
            cashing_date: None,
            return_reason: None,
        }
    }

    fn installment(amount: f64, status: InstallmentStatus, due_in: i64) -> Installment {
        Installment {
            id: EntityId::generate(),
            holder_id: EntityId::new("c1"),
            amount,
            due_date: today() + Duration::days(due_in),
            status,
            paid_date: None,
        }
    }

    #[test]
    fn check_rollup() {
        let checks = vec![
            check(100.0, CheckStatus::Pending, 45),
            check(200.0, CheckStatus::Pending, 2),
            check(300.0, CheckStatus::Cashed, 60),
            check(400.0, CheckStatus::Returned, 60),
            check(500.0, CheckStatus::Cancelled, 60),
        ];
        let s = checks_summary(&checks, today(), 30);

        assert_eq!(s.pending, StatusTotals { count: 2, amount: 300.0 });
        assert_eq!(s.overdue, StatusTotals { count: 1, amount: 100.0 });
        assert_eq!(s.cashed.amount, 300.0);
        assert_eq!(s.cancelled.count, 1);
        assert_eq!(s.return_rate(), 50.0);
    }

    #[test]
    fn installment_rollup() {
        let rows = vec![
            installment(100.0, InstallmentStatus::Pending, -1),
            installment(200.0, InstallmentStatus::Pending, 10),
            installment(300.0, InstallmentStatus::Pending, 90),
            installment(300.0, InstallmentStatus::Paid, -10),
            installment(100.0, InstallmentStatus::Defaulted, -40),
        ];
        let s = installments_summary(&rows, today());

        assert_eq!(s.pending.count, 3);
        assert_eq!(s.overdue.amount, 100.0);
        assert_eq!(s.due_soon.amount, 200.0);
        assert_eq!(s.collection_rate(), 75.0);
    }

    #[test]
    fn empty_rollups_have_zero_rates() {
        assert_eq!(checks_summary(&[], today(), 30).return_rate(), 0.0);
        assert_eq!(installments_summary(&[], today()).collection_rate(), 0.0);
    }
}
