//! Installment lifecycle on top of the linker.

use std::collections::HashMap;

use tracing::{info, warn};

use bizpulse_accounting::PaymentMethod;
use bizpulse_core::entity::find_mut;
use bizpulse_core::{Clock, DomainError, DomainResult, Entity, EntityId};
use bizpulse_parties::{CustomerAggregate, InstallmentPayment, PaymentRecord, PaymentStatus, Rescore};
use bizpulse_store::{DocumentStore, keys};

use crate::installment::{Installment, InstallmentStatus, NewInstallment, OverdueInstallment};
use crate::linker::{CrossEntityLinker, LinkOutcome, paid_installment_income};

impl<S, C> CrossEntityLinker<S, C>
where
    S: DocumentStore + Clone,
    C: Clock + Clone,
{
    pub fn installments(&self) -> Vec<Installment> {
        self.collections.get_collection(keys::INSTALLMENTS, Vec::new())
    }

    pub fn installment(&self, id: &EntityId) -> Option<Installment> {
        self.installments().into_iter().find(|i| &i.id == id)
    }

    /// Schedule an installment. The customer's debt grows by its amount.
    pub fn add_installment(&self, data: NewInstallment) -> DomainResult<LinkOutcome<Installment>> {
        let installment = data.into_installment()?;

        self.collections
            .update_collection::<Installment, (), _>(keys::INSTALLMENTS, |rows| {
                if rows.iter().any(|i| i.id == installment.id) {
                    return Err(DomainError::conflict(format!(
                        "installment {} already exists",
                        installment.id
                    )));
                }
                rows.push(installment.clone());
                Ok(())
            })?;
        info!(installment_id = %installment.id, amount = installment.amount, "installment scheduled");

        let holder_error = self
            .parties
            .modify_customer(&installment.holder_id, Rescore::Derive, |c| {
                c.total_debt += installment.amount;
                c.payment_history.push(
                    PaymentRecord::new(
                        installment.due_date,
                        installment.amount,
                        PaymentMethod::Installment,
                        PaymentStatus::Pending,
                    )
                    .with_reference(installment.id.clone()),
                );
            })
            .err();
        if let Some(err) = &holder_error {
            warn!(installment_id = %installment.id, error = %err, "holder not updated for installment");
        }
        Ok(LinkOutcome::new(installment, holder_error))
    }

    /// `pending → paid`: records the income and reduces the holder's debt.
    pub fn pay_installment(&self, id: &EntityId) -> DomainResult<LinkOutcome<Installment>> {
        let today = self.clock.today();
        let installment = self.transition_installment(id, InstallmentStatus::Paid, |i| {
            i.paid_date = Some(today);
        })?;

        let ledger_error =
            self.record_income(paid_installment_income(&installment, today), &installment.id);

        let payment = InstallmentPayment {
            installment_id: installment.id.clone(),
            amount: installment.amount,
            date: today,
        };
        let holder_error = self
            .parties
            .update_customer_on_installment_payment(&installment.holder_id, &payment)
            .err()
            .or_else(|| self.refresh_holder_overdue(&installment.holder_id).err());

        Ok(LinkOutcome::new(installment, holder_error).with_ledger_error(ledger_error))
    }

    /// `pending → defaulted`. The amount keeps counting as overdue.
    pub fn mark_installment_defaulted(&self, id: &EntityId) -> DomainResult<LinkOutcome<Installment>> {
        let installment = self.transition_installment(id, InstallmentStatus::Defaulted, |_| {})?;
        let holder_error = self
            .parties
            .settle_customer_payment(
                &installment.holder_id,
                &installment.id,
                PaymentMethod::Installment,
                installment.amount,
                PaymentStatus::Overdue,
            )
            .err()
            .or_else(|| self.refresh_holder_overdue(&installment.holder_id).err());
        if let Some(err) = &holder_error {
            warn!(installment_id = %id, error = %err, "holder not updated for defaulted installment");
        }
        Ok(LinkOutcome::new(installment, holder_error))
    }

    /// Pending installments past due, most overdue first.
    pub fn get_overdue_installments(&self) -> Vec<OverdueInstallment> {
        let today = self.clock.today();
        let mut overdue: Vec<OverdueInstallment> = self
            .installments()
            .into_iter()
            .filter(|i| i.is_overdue(today))
            .map(|installment| OverdueInstallment {
                days_past_due: installment.days_past_due(today),
                installment,
            })
            .collect();
        overdue.sort_by(|a, b| b.days_past_due.cmp(&a.days_past_due));
        overdue
    }

    /// Recompute every customer's `overdue_installments_amount` as of today.
    /// Returns how many customers changed.
    pub fn refresh_overdue_installments(&self) -> DomainResult<usize> {
        let totals = self.overdue_totals();
        let scorer = self.parties.scorer();

        let changed = self
            .collections
            .update_collection::<CustomerAggregate, usize, _>(keys::CUSTOMERS, |rows| {
                let mut changed = 0;
                for customer in rows.iter_mut() {
                    let expected = totals.get(&customer.id).copied().unwrap_or(0.0);
                    if (customer.overdue_installments_amount - expected).abs() > f64::EPSILON {
                        customer.overdue_installments_amount = expected;
                        customer.risk_level = scorer.customer_risk(customer);
                        changed += 1;
                    }
                }
                Ok(changed)
            })?;

        if changed > 0 {
            info!(changed, "overdue installment amounts refreshed");
        }
        Ok(changed)
    }

    fn refresh_holder_overdue(&self, holder_id: &EntityId) -> DomainResult<()> {
        let expected = self.overdue_totals().get(holder_id).copied().unwrap_or(0.0);
        self.parties
            .modify_customer(holder_id, Rescore::Derive, |c| {
                c.overdue_installments_amount = expected;
            })
            .map(|_| ())
    }

    fn overdue_totals(&self) -> HashMap<EntityId, f64> {
        let today = self.clock.today();
        let mut totals: HashMap<EntityId, f64> = HashMap::new();
        for installment in self.installments() {
            if installment.counts_as_overdue(today) {
                *totals.entry(installment.holder_id.clone()).or_default() += installment.amount;
            }
        }
        totals
    }

    fn transition_installment<F>(
        &self,
        id: &EntityId,
        to: InstallmentStatus,
        mut f: F,
    ) -> DomainResult<Installment>
    where
        F: FnMut(&mut Installment),
    {
        let result = self
            .collections
            .update_collection::<Installment, Installment, _>(keys::INSTALLMENTS, |rows| {
                let installment = find_mut(rows, id)
                    .ok_or_else(|| DomainError::not_found(Installment::KIND, id))?;
                installment.transition(to)?;
                f(installment);
                Ok(installment.clone())
            });

        if let Err(err) = &result {
            warn!(installment_id = %id, to = %to, error = %err, "installment transition rejected");
        }
        result
    }
}
