//! Per-holder-type effects of check transitions.
//!
//! Each holder type owns one handler per lifecycle event; `other` has none.

use tracing::warn;

use bizpulse_accounting::PaymentMethod;
use bizpulse_core::entity::find_mut;
use bizpulse_core::{Clock, DomainError, DomainResult, Entity, EntityId};
use bizpulse_parties::{PaymentRecord, PaymentStatus, Rescore, RiskLevel};
use bizpulse_store::{DocumentStore, keys};

use crate::check::{Check, CheckStatus, HolderType};
use crate::employee::{Employee, EmployeeCheckEntry};
use crate::linker::CrossEntityLinker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckEvent {
    Received,
    Cashed,
    Returned,
    Cancelled,
}

type LinkFn<S, C> = fn(&CrossEntityLinker<S, C>, &Check, &EntityId) -> DomainResult<()>;

struct HolderHandlers<S, C> {
    received: LinkFn<S, C>,
    cashed: LinkFn<S, C>,
    returned: LinkFn<S, C>,
    cancelled: LinkFn<S, C>,
}

impl<S, C> HolderHandlers<S, C> {
    fn for_event(&self, event: CheckEvent) -> LinkFn<S, C> {
        match event {
            CheckEvent::Received => self.received,
            CheckEvent::Cashed => self.cashed,
            CheckEvent::Returned => self.returned,
            CheckEvent::Cancelled => self.cancelled,
        }
    }
}

impl<S, C> CrossEntityLinker<S, C>
where
    S: DocumentStore + Clone,
    C: Clock + Clone,
{
    fn handlers(holder_type: HolderType) -> Option<HolderHandlers<S, C>> {
        match holder_type {
            HolderType::Customer => Some(HolderHandlers {
                received: Self::customer_received,
                cashed: Self::customer_cashed,
                returned: Self::customer_returned,
                cancelled: Self::customer_cancelled,
            }),
            HolderType::Supplier => Some(HolderHandlers {
                received: Self::supplier_received,
                cashed: Self::supplier_cashed,
                returned: Self::supplier_returned,
                cancelled: Self::supplier_cancelled,
            }),
            HolderType::Employee => Some(HolderHandlers {
                received: Self::employee_received,
                cashed: Self::employee_status,
                returned: Self::employee_status,
                cancelled: Self::employee_status,
            }),
            HolderType::Other => None,
        }
    }

    /// Apply the holder-side effect of `event`. Failures are logged and returned,
    /// never propagated: the check record is already written.
    pub(crate) fn link(&self, check: &Check, event: CheckEvent) -> Option<DomainError> {
        let handlers = Self::handlers(check.holder_type)?;
        let Some(holder_id) = &check.holder_id else {
            return Some(DomainError::validation(format!(
                "check {} has no holder id",
                check.id
            )));
        };

        let handler = handlers.for_event(event);
        match handler(self, check, holder_id) {
            Ok(()) => None,
            Err(err) => {
                warn!(
                    check_id = %check.id,
                    holder_id = %holder_id,
                    event = ?event,
                    error = %err,
                    "holder not updated for check"
                );
                Some(err)
            }
        }
    }

    fn pending_row(check: &Check) -> PaymentRecord {
        PaymentRecord::new(
            check.date_received,
            check.amount,
            PaymentMethod::Check,
            PaymentStatus::Pending,
        )
        .with_reference(check.id.clone())
    }

    fn customer_received(&self, check: &Check, holder_id: &EntityId) -> DomainResult<()> {
        self.parties
            .modify_customer(holder_id, Rescore::Derive, |c| {
                c.pending_checks_amount += check.amount;
                c.payment_history.push(Self::pending_row(check));
            })
            .map(|_| ())
    }

    fn customer_cashed(&self, check: &Check, holder_id: &EntityId) -> DomainResult<()> {
        self.parties
            .modify_customer(holder_id, Rescore::Derive, |c| {
                c.pending_checks_amount = (c.pending_checks_amount - check.amount).max(0.0);
                c.settle_history(&check.id, PaymentMethod::Check, check.amount, PaymentStatus::Paid);
            })
            .map(|_| ())
    }

    /// A bounced check marks the customer high-risk regardless of score.
    fn customer_returned(&self, check: &Check, holder_id: &EntityId) -> DomainResult<()> {
        self.parties
            .modify_customer(holder_id, Rescore::Keep, |c| {
                c.pending_checks_amount = (c.pending_checks_amount - check.amount).max(0.0);
                c.risk_level = RiskLevel::High;
                c.settle_history(&check.id, PaymentMethod::Check, check.amount, PaymentStatus::Overdue);
            })
            .map(|_| ())
    }

    fn customer_cancelled(&self, check: &Check, holder_id: &EntityId) -> DomainResult<()> {
        self.parties
            .modify_customer(holder_id, Rescore::Derive, |c| {
                c.pending_checks_amount = (c.pending_checks_amount - check.amount).max(0.0);
                drop_pending_row(&mut c.payment_history, &check.id);
            })
            .map(|_| ())
    }

    fn supplier_received(&self, check: &Check, holder_id: &EntityId) -> DomainResult<()> {
        self.parties
            .modify_supplier(holder_id, Rescore::Derive, |s| {
                s.pending_checks_amount += check.amount;
                s.payment_history.push(Self::pending_row(check));
            })
            .map(|_| ())
    }

    fn supplier_cashed(&self, check: &Check, holder_id: &EntityId) -> DomainResult<()> {
        self.parties
            .modify_supplier(holder_id, Rescore::Derive, |s| {
                s.pending_checks_amount = (s.pending_checks_amount - check.amount).max(0.0);
                s.settle_history(&check.id, PaymentMethod::Check, check.amount, PaymentStatus::Paid);
            })
            .map(|_| ())
    }

    fn supplier_returned(&self, check: &Check, holder_id: &EntityId) -> DomainResult<()> {
        self.parties
            .modify_supplier(holder_id, Rescore::Derive, |s| {
                s.pending_checks_amount = (s.pending_checks_amount - check.amount).max(0.0);
                s.settle_history(&check.id, PaymentMethod::Check, check.amount, PaymentStatus::Overdue);
            })
            .map(|_| ())
    }

    fn supplier_cancelled(&self, check: &Check, holder_id: &EntityId) -> DomainResult<()> {
        self.parties
            .modify_supplier(holder_id, Rescore::Derive, |s| {
                s.pending_checks_amount = (s.pending_checks_amount - check.amount).max(0.0);
                drop_pending_row(&mut s.payment_history, &check.id);
            })
            .map(|_| ())
    }

    fn employee_received(&self, check: &Check, holder_id: &EntityId) -> DomainResult<()> {
        self.modify_employee(holder_id, |e| {
            e.checks_history.push(EmployeeCheckEntry {
                check_id: check.id.clone(),
                check_number: check.check_number.clone(),
                amount: check.amount,
                date: check.date_received,
                status: CheckStatus::Pending,
            });
        })
    }

    fn employee_status(&self, check: &Check, holder_id: &EntityId) -> DomainResult<()> {
        self.modify_employee(holder_id, |e| {
            if let Some(entry) = e.checks_history.iter_mut().find(|x| x.check_id == check.id) {
                entry.status = check.status;
            }
        })
    }

    fn modify_employee<F>(&self, employee_id: &EntityId, mut f: F) -> DomainResult<()>
    where
        F: FnMut(&mut Employee),
    {
        self.collections
            .update_collection::<Employee, (), _>(keys::EMPLOYEES, |rows| {
                let employee = find_mut(rows, employee_id)
                    .ok_or_else(|| DomainError::not_found(Employee::KIND, employee_id))?;
                f(employee);
                Ok(())
            })
    }
}

fn drop_pending_row(history: &mut Vec<PaymentRecord>, check_id: &EntityId) {
    history.retain(|r| {
        !(r.status == PaymentStatus::Pending && r.reference_id.as_ref() == Some(check_id))
    });
}
