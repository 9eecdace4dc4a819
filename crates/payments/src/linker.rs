//! Check lifecycle and the cross-entity effects of each transition.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{info, warn};

use bizpulse_accounting::{CashLedger, CashTransaction, PaymentMethod, categories};
use bizpulse_core::entity::find_mut;
use bizpulse_core::{Clock, DomainError, DomainResult, Entity, EntityId};
use bizpulse_parties::{AggregateUpdater, Rescore};
use bizpulse_store::{Collections, DocumentStore, keys};

use crate::check::{Check, CheckStatus, HolderType, NewCheck};
use crate::holder::CheckEvent;
use crate::installment::{Installment, InstallmentStatus};

/// A pending check older than this many days is overdue.
pub const OVERDUE_CHECK_DAYS: i64 = 30;

/// Result of an operation whose primary record was written, plus the outcome
/// of its follow-ups (holder update, ledger row).
///
/// A follow-up never undoes or blocks the primary write; its failure is
/// reported here instead. Missing ledger rows are written later by
/// [`CrossEntityLinker::repair_missing_ledger_rows`].
#[derive(Debug, Clone, PartialEq)]
pub struct LinkOutcome<T> {
    pub value: T,
    pub holder_error: Option<DomainError>,
    pub ledger_error: Option<DomainError>,
}

impl<T> LinkOutcome<T> {
    pub fn new(value: T, holder_error: Option<DomainError>) -> Self {
        Self {
            value,
            holder_error,
            ledger_error: None,
        }
    }

    pub fn with_ledger_error(mut self, ledger_error: Option<DomainError>) -> Self {
        self.ledger_error = ledger_error;
        self
    }

    pub fn is_fully_linked(&self) -> bool {
        self.holder_error.is_none() && self.ledger_error.is_none()
    }
}

/// Owns the check/installment state machines and propagates transitions to
/// customers, suppliers, employees and the cash ledger.
#[derive(Debug, Clone)]
pub struct CrossEntityLinker<S, C> {
    pub(crate) collections: Collections<S>,
    pub(crate) parties: AggregateUpdater<S, C>,
    pub(crate) ledger: CashLedger<S>,
    pub(crate) clock: C,
    overdue_after_days: i64,
}

impl<S, C> CrossEntityLinker<S, C>
where
    S: DocumentStore + Clone,
    C: Clock + Clone,
{
    pub fn new(collections: Collections<S>, parties: AggregateUpdater<S, C>, clock: C) -> Self {
        Self {
            ledger: CashLedger::new(collections.clone()),
            collections,
            parties,
            clock,
            overdue_after_days: OVERDUE_CHECK_DAYS,
        }
    }

    pub fn with_overdue_after_days(mut self, days: i64) -> Self {
        self.overdue_after_days = days;
        self
    }

    pub fn overdue_after_days(&self) -> i64 {
        self.overdue_after_days
    }

    pub fn parties(&self) -> &AggregateUpdater<S, C> {
        &self.parties
    }

    pub fn checks(&self) -> Vec<Check> {
        self.collections.get_collection(keys::CHECKS, Vec::new())
    }

    pub fn check(&self, id: &EntityId) -> Option<Check> {
        self.checks().into_iter().find(|c| &c.id == id)
    }

    /// Register a check and link it to its holder.
    pub fn add_check_with_holder(&self, data: NewCheck) -> DomainResult<LinkOutcome<Check>> {
        data.validate()?;
        let check = data.into_check();

        self.collections
            .update_collection::<Check, (), _>(keys::CHECKS, |rows| {
                if rows.iter().any(|c| c.id == check.id) {
                    return Err(DomainError::conflict(format!("check {} already exists", check.id)));
                }
                rows.push(check.clone());
                Ok(())
            })?;

        info!(check_id = %check.id, amount = check.amount, holder = ?check.holder_type, "check registered");
        let holder_error = self.link(&check, CheckEvent::Received);
        Ok(LinkOutcome::new(check, holder_error))
    }

    /// `pending → cashed`: records the income and settles the holder's pending amount.
    pub fn cash_check(&self, id: &EntityId) -> DomainResult<LinkOutcome<Check>> {
        let today = self.clock.today();
        let check = self.transition_check(id, CheckStatus::Cashed, |c| {
            c.cashing_date = Some(today);
        })?;

        let ledger_error = self.record_income(cashed_check_income(&check, today), &check.id);
        let holder_error = self.link(&check, CheckEvent::Cashed);
        Ok(LinkOutcome::new(check, holder_error).with_ledger_error(ledger_error))
    }

    /// `pending → returned` (bounced). A customer holder is forced to high risk.
    pub fn return_check(&self, id: &EntityId, reason: &str) -> DomainResult<LinkOutcome<Check>> {
        if reason.trim().is_empty() {
            return Err(DomainError::validation("a return reason is required"));
        }
        let check = self.transition_check(id, CheckStatus::Returned, |c| {
            c.return_reason = Some(reason.to_string());
        })?;

        let holder_error = self.link(&check, CheckEvent::Returned);
        Ok(LinkOutcome::new(check, holder_error))
    }

    /// `pending → cancelled` (administrative).
    pub fn cancel_check(&self, id: &EntityId) -> DomainResult<LinkOutcome<Check>> {
        let check = self.transition_check(id, CheckStatus::Cancelled, |_| {})?;
        let holder_error = self.link(&check, CheckEvent::Cancelled);
        Ok(LinkOutcome::new(check, holder_error))
    }

    /// Pending checks received more than `overdue_after_days` ago.
    pub fn get_overdue_checks(&self) -> Vec<Check> {
        let today = self.clock.today();
        self.checks()
            .into_iter()
            .filter(|c| c.is_overdue(today, self.overdue_after_days))
            .collect()
    }

    /// Recompute every customer's and supplier's `pending_checks_amount` from
    /// the checks collection. Returns how many records changed.
    pub fn reconcile_pending_checks(&self) -> DomainResult<usize> {
        let checks = self.checks();
        let pending_for = |holder_type: HolderType, id: &EntityId| -> f64 {
            checks
                .iter()
                .filter(|c| {
                    c.status == CheckStatus::Pending
                        && c.holder_type == holder_type
                        && c.holder_id.as_ref() == Some(id)
                })
                .map(|c| c.amount)
                .sum()
        };

        let mut changed = 0;
        for customer in self.parties.customers() {
            let expected = pending_for(HolderType::Customer, &customer.id);
            if (customer.pending_checks_amount - expected).abs() > f64::EPSILON {
                self.parties.modify_customer(&customer.id, Rescore::Derive, |c| {
                    c.pending_checks_amount = expected;
                })?;
                changed += 1;
            }
        }
        for supplier in self.parties.suppliers() {
            let expected = pending_for(HolderType::Supplier, &supplier.id);
            if (supplier.pending_checks_amount - expected).abs() > f64::EPSILON {
                self.parties.modify_supplier(&supplier.id, Rescore::Derive, |s| {
                    s.pending_checks_amount = expected;
                })?;
                changed += 1;
            }
        }

        if changed > 0 {
            info!(changed, "pending check amounts reconciled");
        }
        Ok(changed)
    }

    /// Write the income row for every cashed check and paid installment that
    /// has none (matched by `reference_id`). Returns how many rows were written.
    pub fn repair_missing_ledger_rows(&self) -> DomainResult<usize> {
        let today = self.clock.today();
        let missing: Vec<(EntityId, CashTransaction)> = {
            let booked: HashSet<EntityId> = self
                .ledger
                .transactions()
                .into_iter()
                .filter_map(|t| t.reference_id)
                .collect();
            let checks = self
                .checks()
                .into_iter()
                .filter(|c| c.status == CheckStatus::Cashed && !booked.contains(&c.id))
                .map(|c| {
                    let tx = cashed_check_income(&c, c.cashing_date.unwrap_or(today));
                    (c.id, tx)
                });
            let installments = self
                .installments()
                .into_iter()
                .filter(|i| i.status == InstallmentStatus::Paid && !booked.contains(&i.id))
                .map(|i| {
                    let tx = paid_installment_income(&i, i.paid_date.unwrap_or(today));
                    (i.id, tx)
                });
            checks.chain(installments).collect()
        };

        let mut written = 0;
        for (reference, tx) in missing {
            self.ledger.record(tx, self.clock.now())?;
            warn!(reference_id = %reference, "missing ledger row written");
            written += 1;
        }
        Ok(written)
    }

    /// Append `tx`; a failure is logged and handed back for the outcome.
    pub(crate) fn record_income(&self, tx: CashTransaction, reference: &EntityId) -> Option<DomainError> {
        match self.ledger.record(tx, self.clock.now()) {
            Ok(_) => None,
            Err(err) => {
                warn!(reference_id = %reference, error = %err, "ledger row not written");
                Some(err)
            }
        }
    }

    fn transition_check<F>(&self, id: &EntityId, to: CheckStatus, mut f: F) -> DomainResult<Check>
    where
        F: FnMut(&mut Check),
    {
        let result = self
            .collections
            .update_collection::<Check, Check, _>(keys::CHECKS, |rows| {
                let check =
                    find_mut(rows, id).ok_or_else(|| DomainError::not_found(Check::KIND, id))?;
                check.transition(to)?;
                f(check);
                Ok(check.clone())
            });

        match &result {
            Ok(check) => info!(check_id = %id, status = %check.status, "check transitioned"),
            Err(err) => warn!(check_id = %id, to = %to, error = %err, "check transition rejected"),
        }
        result
    }
}

fn cashed_check_income(check: &Check, date: NaiveDate) -> CashTransaction {
    CashTransaction::income(check.amount, categories::OTHER, date)
        .with_payment_method(PaymentMethod::Check)
        .with_reference(check.id.clone())
        .with_description(format!("check {} cashed", check.check_number))
}

pub(crate) fn paid_installment_income(installment: &Installment, date: NaiveDate) -> CashTransaction {
    CashTransaction::income(installment.amount, categories::INSTALLMENTS, date)
        .with_payment_method(PaymentMethod::Installment)
        .with_reference(installment.id.clone())
        .with_description("installment payment")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizpulse_accounting::TransactionType;
    use bizpulse_core::FixedClock;
    use bizpulse_parties::{CustomerAggregate, PaymentStatus, RiskLevel, SupplierAggregate};
    use bizpulse_core::ExpectedVersion;
    use bizpulse_store::{Document, InMemoryDocumentStore};
    use chrono::{Duration, NaiveDate};
    use serde_json::Value as JsonValue;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::employee::Employee;
    use crate::installment::NewInstallment;

    type TestLinker = CrossEntityLinker<Arc<InMemoryDocumentStore>, FixedClock>;

    /// Rejects writes to the cash ledger while `down` is set.
    #[derive(Debug, Default)]
    struct LedgerOutage {
        inner: InMemoryDocumentStore,
        down: AtomicBool,
    }

    impl DocumentStore for LedgerOutage {
        fn load(&self, key: &str) -> DomainResult<Option<Document>> {
            self.inner.load(key)
        }

        fn save(&self, key: &str, value: JsonValue, expected: ExpectedVersion) -> DomainResult<u64> {
            if key == keys::CASH_TRANSACTIONS && self.down.load(Ordering::SeqCst) {
                return Err(DomainError::store("ledger down"));
            }
            self.inner.save(key, value, expected)
        }

        fn keys(&self) -> DomainResult<Vec<String>> {
            self.inner.keys()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn setup() -> TestLinker {
        setup_on(Arc::new(InMemoryDocumentStore::new()))
    }

    fn setup_on<S: DocumentStore + Clone>(store: S) -> CrossEntityLinker<S, FixedClock> {
        let collections = Collections::new(store);
        let clock = FixedClock::on(today());
        let parties = AggregateUpdater::new(collections.clone(), clock);
        let mut customer = CustomerAggregate::new(EntityId::new("c1"), "Acme");
        customer.total_purchases = 50_000.0;
        customer.purchase_frequency = 3.0;
        parties.register_customer(customer).unwrap();
        parties
            .register_supplier(SupplierAggregate::new(EntityId::new("s1"), "Parts Co"))
            .unwrap();
        CrossEntityLinker::new(collections, parties, clock)
    }

    fn new_check(id: &str, holder_type: HolderType, holder: Option<&str>, days_ago: i64) -> NewCheck {
        NewCheck {
            id: Some(EntityId::new(id)),
            check_number: id.to_string(),
            amount: 5_000.0,
            date_received: today() - Duration::days(days_ago),
            date_issued: today() - Duration::days(days_ago),
            bank_name: "First Bank".into(),
            holder_type,
            holder_id: holder.map(EntityId::new),
            holder_name: String::new(),
            notes: String::new(),
        }
    }

    fn customer(linker: &TestLinker) -> CustomerAggregate {
        linker.parties().customer(&EntityId::new("c1")).unwrap()
    }

    fn ledger(linker: &TestLinker) -> Vec<CashTransaction> {
        linker.ledger.transactions()
    }

    #[test]
    fn overdue_check_scenario() {
        let linker = setup();
        let id = EntityId::new("1001");
        linker
            .add_check_with_holder(new_check("1001", HolderType::Customer, Some("c1"), 40))
            .unwrap();

        let overdue = linker.get_overdue_checks();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, id);

        let outcome = linker.cash_check(&id).unwrap();
        assert!(outcome.is_fully_linked());
        assert_eq!(outcome.value.status, CheckStatus::Cashed);
        assert_eq!(outcome.value.cashing_date, Some(today()));

        let rows = ledger(&linker);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, TransactionType::Income);
        assert_eq!(rows[0].amount, 5_000.0);
        assert_eq!(rows[0].category, categories::OTHER);

        assert!(linker.get_overdue_checks().is_empty());
    }

    #[test]
    fn customer_link_tracks_pending_amount_and_history() {
        let linker = setup();
        linker
            .add_check_with_holder(new_check("1001", HolderType::Customer, Some("c1"), 1))
            .unwrap();

        let c = customer(&linker);
        assert_eq!(c.pending_checks_amount, 5_000.0);
        assert_eq!(c.payment_history.len(), 1);
        assert_eq!(c.payment_history[0].status, PaymentStatus::Pending);

        linker.cash_check(&EntityId::new("1001")).unwrap();
        let c = customer(&linker);
        assert_eq!(c.pending_checks_amount, 0.0);
        assert_eq!(c.payment_history[0].status, PaymentStatus::Paid);
    }

    #[test]
    fn cashing_twice_is_rejected_without_side_effects() {
        let linker = setup();
        let id = EntityId::new("1001");
        linker
            .add_check_with_holder(new_check("1001", HolderType::Customer, Some("c1"), 1))
            .unwrap();
        linker.cash_check(&id).unwrap();
        let before = customer(&linker);

        let err = linker.cash_check(&id).unwrap_err();
        match err {
            DomainError::InvalidTransition { from, to, .. } => {
                assert_eq!(from, "cashed");
                assert_eq!(to, "cashed");
            }
            _ => panic!("Expected InvalidTransition"),
        }
        assert!(linker.return_check(&id, "insufficient funds").is_err());

        assert_eq!(ledger(&linker).len(), 1);
        assert_eq!(customer(&linker), before);
        assert_eq!(linker.check(&id).unwrap().status, CheckStatus::Cashed);
    }

    #[test]
    fn returned_check_forces_high_risk_and_marks_history_overdue() {
        let linker = setup();
        let id = EntityId::new("1001");
        linker
            .add_check_with_holder(new_check("1001", HolderType::Customer, Some("c1"), 1))
            .unwrap();
        assert_eq!(customer(&linker).risk_level, RiskLevel::Low);

        let outcome = linker.return_check(&id, "insufficient funds").unwrap();
        assert_eq!(outcome.value.return_reason.as_deref(), Some("insufficient funds"));

        let c = customer(&linker);
        assert_eq!(c.risk_level, RiskLevel::High);
        assert_eq!(c.payment_history[0].status, PaymentStatus::Overdue);
        assert!(ledger(&linker).is_empty());

        // Returned is terminal; cashing afterwards adds nothing.
        assert!(linker.cash_check(&id).is_err());
        assert!(ledger(&linker).is_empty());
    }

    #[test]
    fn return_requires_reason() {
        let linker = setup();
        linker
            .add_check_with_holder(new_check("1001", HolderType::Customer, Some("c1"), 1))
            .unwrap();
        match linker.return_check(&EntityId::new("1001"), "  ") {
            Err(DomainError::Validation(_)) => {}
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn missing_holder_is_reported_but_check_is_kept() {
        let linker = setup();
        let outcome = linker
            .add_check_with_holder(new_check("2002", HolderType::Customer, Some("ghost"), 1))
            .unwrap();

        assert!(!outcome.is_fully_linked());
        assert!(outcome.holder_error.unwrap().is_not_found());
        assert!(linker.check(&EntityId::new("2002")).is_some());
    }

    #[test]
    fn supplier_and_employee_links() {
        let linker = setup();
        linker
            .collections
            .set_collection(keys::EMPLOYEES, &[Employee::new(EntityId::new("e1"), "Sam")])
            .unwrap();

        linker
            .add_check_with_holder(new_check("3001", HolderType::Supplier, Some("s1"), 1))
            .unwrap();
        linker
            .add_check_with_holder(new_check("3002", HolderType::Employee, Some("e1"), 1))
            .unwrap();
        linker
            .add_check_with_holder(new_check("3003", HolderType::Other, None, 1))
            .unwrap();

        let s = linker.parties().supplier(&EntityId::new("s1")).unwrap();
        assert_eq!(s.pending_checks_amount, 5_000.0);

        linker.cash_check(&EntityId::new("3002")).unwrap();
        let employees: Vec<Employee> = linker.collections.get_collection(keys::EMPLOYEES, Vec::new());
        assert_eq!(employees[0].checks_history.len(), 1);
        assert_eq!(employees[0].checks_history[0].status, CheckStatus::Cashed);

        let outcome = linker.cancel_check(&EntityId::new("3001")).unwrap();
        assert!(outcome.is_fully_linked());
        let s = linker.parties().supplier(&EntityId::new("s1")).unwrap();
        assert_eq!(s.pending_checks_amount, 0.0);
        assert!(s.payment_history.is_empty());
    }

    #[test]
    fn duplicate_check_id_is_a_conflict() {
        let linker = setup();
        linker
            .add_check_with_holder(new_check("1001", HolderType::Other, None, 1))
            .unwrap();
        match linker.add_check_with_holder(new_check("1001", HolderType::Other, None, 1)) {
            Err(DomainError::Conflict(_)) => {}
            other => panic!("Expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn reconcile_restores_pending_amount_invariant() {
        let linker = setup();
        linker
            .add_check_with_holder(new_check("1001", HolderType::Customer, Some("c1"), 1))
            .unwrap();
        linker
            .parties()
            .modify_customer(&EntityId::new("c1"), Rescore::Keep, |c| {
                c.pending_checks_amount = 123.0;
            })
            .unwrap();

        assert_eq!(linker.reconcile_pending_checks().unwrap(), 1);
        assert_eq!(customer(&linker).pending_checks_amount, 5_000.0);
        assert_eq!(linker.reconcile_pending_checks().unwrap(), 0);
    }

    #[test]
    fn ledger_outage_keeps_transition_and_is_repaired_later() {
        let store = Arc::new(LedgerOutage::default());
        let linker = setup_on(store.clone());
        let check_id = EntityId::new("1001");
        let installment_id = EntityId::new("i1");
        linker
            .add_check_with_holder(new_check("1001", HolderType::Customer, Some("c1"), 40))
            .unwrap();
        linker
            .add_installment(NewInstallment {
                id: Some(installment_id.clone()),
                holder_id: EntityId::new("c1"),
                amount: 800.0,
                due_date: today(),
            })
            .unwrap();

        store.down.store(true, Ordering::SeqCst);
        let cashed = linker.cash_check(&check_id).unwrap();
        assert_eq!(cashed.value.status, CheckStatus::Cashed);
        assert!(cashed.holder_error.is_none());
        assert!(matches!(cashed.ledger_error, Some(DomainError::Store(_))));
        assert!(!cashed.is_fully_linked());
        assert_eq!(linker.parties().customer(&EntityId::new("c1")).unwrap().pending_checks_amount, 0.0);

        let paid = linker.pay_installment(&installment_id).unwrap();
        assert!(paid.ledger_error.is_some());
        assert!(linker.repair_missing_ledger_rows().is_err());

        store.down.store(false, Ordering::SeqCst);
        assert_eq!(linker.repair_missing_ledger_rows().unwrap(), 2);
        let rows = linker.ledger.transactions();
        assert_eq!(rows.len(), 2);
        let check_row = rows
            .iter()
            .find(|t| t.reference_id.as_ref() == Some(&check_id))
            .unwrap();
        assert_eq!(check_row.amount, 5_000.0);
        assert_eq!(check_row.date, today());
        assert_eq!(check_row.category, categories::OTHER);

        assert_eq!(linker.repair_missing_ledger_rows().unwrap(), 0);
        assert_eq!(linker.ledger.balance(), 5_800.0);
    }
}
