use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use bizpulse_accounting::{CashLedger, CashTransaction, PaymentMethod, categories};
use bizpulse_analytics::AnalyticsEngine;
use bizpulse_core::{Clock, DomainError, DomainResult, Entity};
use bizpulse_events::{BusinessEvent, Event, EventHandler};
use bizpulse_notifications::NotificationEngine;
use bizpulse_parties::{AggregateUpdater, PurchaseRecord, SaleRecord};
use bizpulse_payments::{Check, CrossEntityLinker, Installment, LinkOutcome};
use bizpulse_purchasing::PurchaseInvoice;
use bizpulse_reports::{UnifiedReport, UnifiedReportAggregator};
use bizpulse_sales::SalesInvoice;
use bizpulse_store::{Collections, DocumentStore, keys};

use crate::config::EngineConfig;
use crate::maintenance::{Maintenance, MaintenanceReport};

/// Result of applying one [`BusinessEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum HandledEvent {
    Sale(LinkOutcome<SalesInvoice>),
    Purchase(LinkOutcome<PurchaseInvoice>),
    Check(LinkOutcome<Check>),
    Installment(LinkOutcome<Installment>),
}

impl HandledEvent {
    /// The aggregate update that was skipped, if any. The primary write succeeded.
    pub fn holder_error(&self) -> Option<&DomainError> {
        match self {
            HandledEvent::Sale(o) => o.holder_error.as_ref(),
            HandledEvent::Purchase(o) => o.holder_error.as_ref(),
            HandledEvent::Check(o) => o.holder_error.as_ref(),
            HandledEvent::Installment(o) => o.holder_error.as_ref(),
        }
    }

    /// The cash-ledger row that could not be written, if any. Maintenance writes it later.
    pub fn ledger_error(&self) -> Option<&DomainError> {
        match self {
            HandledEvent::Sale(o) => o.ledger_error.as_ref(),
            HandledEvent::Purchase(o) => o.ledger_error.as_ref(),
            HandledEvent::Check(o) => o.ledger_error.as_ref(),
            HandledEvent::Installment(o) => o.ledger_error.as_ref(),
        }
    }
}

/// Facade over every component, sharing one store and one clock.
#[derive(Debug, Clone)]
pub struct BusinessEngine<S, C> {
    collections: Collections<S>,
    ledger: CashLedger<S>,
    linker: CrossEntityLinker<S, C>,
    notifications: NotificationEngine<S, C>,
    analytics: AnalyticsEngine<S, C>,
    reports: UnifiedReportAggregator<S, C>,
    clock: C,
    config: EngineConfig,
}

impl<S, C> BusinessEngine<S, C>
where
    S: DocumentStore + Clone,
    C: Clock + Clone,
{
    pub fn new(store: S, clock: C, config: EngineConfig) -> Self {
        let collections = Collections::new(store).with_max_retries(config.store_max_retries);
        let parties = AggregateUpdater::new(collections.clone(), clock.clone());
        let linker = CrossEntityLinker::new(collections.clone(), parties, clock.clone())
            .with_overdue_after_days(config.notifications.overdue_check_days);
        let notifications = NotificationEngine::new(collections.clone(), clock.clone())
            .with_settings(config.notifications.clone());
        let analytics = AnalyticsEngine::new(collections.clone(), clock.clone())
            .with_settings(config.forecast.clone());
        let reports = UnifiedReportAggregator::new(collections.clone(), clock.clone())
            .with_forecast_settings(config.forecast.clone())
            .with_overdue_check_days(config.notifications.overdue_check_days);

        Self {
            ledger: CashLedger::new(collections.clone()),
            collections,
            linker,
            notifications,
            analytics,
            reports,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn collections(&self) -> &Collections<S> {
        &self.collections
    }

    pub fn ledger(&self) -> &CashLedger<S> {
        &self.ledger
    }

    pub fn parties(&self) -> &AggregateUpdater<S, C> {
        self.linker.parties()
    }

    pub fn payments(&self) -> &CrossEntityLinker<S, C> {
        &self.linker
    }

    pub fn notifications(&self) -> &NotificationEngine<S, C> {
        &self.notifications
    }

    pub fn analytics(&self) -> &AnalyticsEngine<S, C> {
        &self.analytics
    }

    /// Store the invoice, then fold it into the customer aggregate.
    ///
    /// Anonymous sales (no customer id) only produce the ledger row.
    pub fn record_sale(&self, invoice: SalesInvoice) -> DomainResult<LinkOutcome<SalesInvoice>> {
        ensure_positive(invoice.total, "sale total")?;
        self.insert_unique(keys::SALES_INVOICES, &invoice)?;

        let sale = SaleRecord {
            invoice_id: Some(invoice.id.clone()),
            total: invoice.total,
            date: invoice.date,
            payment_method: invoice.payment_method,
        };

        let holder_error = match &invoice.customer_id {
            Some(customer_id) => self
                .parties()
                .update_customer_on_sale(customer_id, &sale)
                .err(),
            None => {
                let tx = CashTransaction::income(sale.total, categories::SALES, sale.date)
                    .with_payment_method(sale.payment_method.unwrap_or(PaymentMethod::Cash))
                    .with_description(describe("sale to", invoice.customer_name.as_deref()))
                    .with_reference(invoice.id.clone());
                self.ledger.record(tx, self.clock.now())?;
                None
            }
        };

        info!(invoice_id = %invoice.id, total = invoice.total, "sale recorded");
        Ok(LinkOutcome::new(invoice, holder_error))
    }

    /// Store the invoice, then fold it into the supplier aggregate.
    pub fn record_purchase(
        &self,
        invoice: PurchaseInvoice,
    ) -> DomainResult<LinkOutcome<PurchaseInvoice>> {
        ensure_positive(invoice.total, "purchase total")?;
        self.insert_unique(keys::PURCHASE_INVOICES, &invoice)?;

        let purchase = PurchaseRecord {
            invoice_id: Some(invoice.id.clone()),
            total: invoice.total,
            date: invoice.date,
            payment_method: invoice.payment_method,
        };

        let holder_error = match &invoice.supplier_id {
            Some(supplier_id) => self
                .parties()
                .update_supplier_on_purchase(supplier_id, &purchase)
                .err(),
            None => {
                let tx =
                    CashTransaction::expense(purchase.total, categories::PURCHASES, purchase.date)
                        .with_payment_method(purchase.payment_method.unwrap_or(PaymentMethod::Cash))
                        .with_description(describe("purchase from", invoice.supplier_name.as_deref()))
                        .with_reference(invoice.id.clone());
                self.ledger.record(tx, self.clock.now())?;
                None
            }
        };

        info!(invoice_id = %invoice.id, total = invoice.total, "purchase recorded");
        Ok(LinkOutcome::new(invoice, holder_error))
    }

    /// Consolidated report over `[start, end]`. Never fails as a whole.
    pub fn generate_report(&self, start: NaiveDate, end: NaiveDate) -> UnifiedReport {
        self.reports.generate(start, end)
    }

    /// Periodic upkeep: check reconciliation, missing ledger rows, overdue
    /// refresh, scanners and notification cleanup. Each step is independent.
    pub fn run_maintenance(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match self.linker.reconcile_pending_checks() {
            Ok(n) => report.reconciled_checks = n,
            Err(err) => report.fail("reconcile_pending_checks", &err),
        }
        match self.linker.repair_missing_ledger_rows() {
            Ok(n) => report.repaired_ledger_rows = n,
            Err(err) => report.fail("repair_missing_ledger_rows", &err),
        }
        match self.linker.refresh_overdue_installments() {
            Ok(n) => report.refreshed_customers = n,
            Err(err) => report.fail("refresh_overdue_installments", &err),
        }

        report.scan = self.notifications.run_all_checks();

        match self
            .notifications
            .cleanup_resolved(self.config.resolved_retention_days)
        {
            Ok(n) => report.cleaned_notifications = n,
            Err(err) => report.fail("cleanup_resolved", &err),
        }

        info!(
            reconciled = report.reconciled_checks,
            repaired = report.repaired_ledger_rows,
            refreshed = report.refreshed_customers,
            created = report.scan.created,
            resolved = report.scan.resolved,
            cleaned = report.cleaned_notifications,
            failures = report.failures.len(),
            "maintenance pass finished"
        );
        report
    }

    fn insert_unique<T>(&self, key: &str, record: &T) -> DomainResult<()>
    where
        T: Entity + Clone + Serialize + serde::de::DeserializeOwned,
    {
        self.collections.update_collection::<T, (), _>(key, |rows| {
            if rows.iter().any(|r| r.id() == record.id()) {
                return Err(DomainError::conflict(format!(
                    "{} {} already exists",
                    T::KIND,
                    record.id()
                )));
            }
            rows.push(record.clone());
            Ok(())
        })
    }
}

impl<S, C> EventHandler<BusinessEvent> for BusinessEngine<S, C>
where
    S: DocumentStore + Clone,
    C: Clock + Clone,
{
    type Output = HandledEvent;
    type Error = DomainError;

    fn handle(&self, event: BusinessEvent) -> DomainResult<HandledEvent> {
        let event_type = event.event_type();
        let result = match event {
            BusinessEvent::SaleRecorded(invoice) => self.record_sale(invoice).map(HandledEvent::Sale),
            BusinessEvent::PurchaseRecorded(invoice) => {
                self.record_purchase(invoice).map(HandledEvent::Purchase)
            }
            BusinessEvent::CheckReceived(data) => {
                self.linker.add_check_with_holder(data).map(HandledEvent::Check)
            }
            BusinessEvent::CheckCashed { check_id } => {
                self.linker.cash_check(&check_id).map(HandledEvent::Check)
            }
            BusinessEvent::CheckReturned { check_id, reason } => self
                .linker
                .return_check(&check_id, &reason)
                .map(HandledEvent::Check),
            BusinessEvent::CheckCancelled { check_id } => {
                self.linker.cancel_check(&check_id).map(HandledEvent::Check)
            }
            BusinessEvent::InstallmentScheduled(data) => self
                .linker
                .add_installment(data)
                .map(HandledEvent::Installment),
            BusinessEvent::InstallmentPaid { installment_id } => self
                .linker
                .pay_installment(&installment_id)
                .map(HandledEvent::Installment),
            BusinessEvent::InstallmentDefaulted { installment_id } => self
                .linker
                .mark_installment_defaulted(&installment_id)
                .map(HandledEvent::Installment),
        };

        match &result {
            Ok(handled) => {
                if let Some(err) = handled.holder_error() {
                    warn!(event = event_type, error = %err, "event applied without aggregate update");
                }
                if let Some(err) = handled.ledger_error() {
                    warn!(event = event_type, error = %err, "event applied without ledger row");
                }
            }
            Err(err) => warn!(event = event_type, error = %err, "event rejected"),
        }
        result
    }
}

impl<S, C> Maintenance for BusinessEngine<S, C>
where
    S: DocumentStore + Clone + 'static,
    C: Clock + Clone + 'static,
{
    fn run(&self) -> MaintenanceReport {
        self.run_maintenance()
    }
}

fn ensure_positive(amount: f64, what: &str) -> DomainResult<()> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(DomainError::validation(format!("{what} must be positive")))
    }
}

fn describe(prefix: &str, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => format!("{prefix} {name}"),
        _ => format!("{prefix} walk-in"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizpulse_core::{EntityId, FixedClock};
    use bizpulse_parties::CustomerAggregate;
    use bizpulse_store::InMemoryDocumentStore;
    use std::sync::Arc;

    fn engine() -> BusinessEngine<Arc<InMemoryDocumentStore>, FixedClock> {
        let day = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        BusinessEngine::new(
            Arc::new(InMemoryDocumentStore::new()),
            FixedClock::on(day),
            EngineConfig::default(),
        )
    }

    fn sale(id: &str, customer: Option<&str>, total: f64) -> SalesInvoice {
        SalesInvoice {
            id: EntityId::new(id),
            customer_id: customer.map(EntityId::new),
            customer_name: None,
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            items: Vec::new(),
            total,
            payment_method: None,
        }
    }

    #[test]
    fn anonymous_sale_only_touches_the_ledger() {
        let engine = engine();
        let outcome = engine.record_sale(sale("inv-1", None, 120.0)).unwrap();
        assert!(outcome.is_fully_linked());
        assert_eq!(engine.ledger().balance(), 120.0);
        assert_eq!(engine.ledger().transactions()[0].category, categories::SALES);
    }

    #[test]
    fn sale_for_unknown_customer_keeps_invoice_and_reports() {
        let engine = engine();
        let outcome = engine.record_sale(sale("inv-1", Some("ghost"), 80.0)).unwrap();
        assert!(outcome.holder_error.as_ref().is_some_and(DomainError::is_not_found));

        let stored: Vec<SalesInvoice> = engine
            .collections()
            .get_collection(keys::SALES_INVOICES, Vec::new());
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn duplicate_invoice_is_a_conflict() {
        let engine = engine();
        engine
            .parties()
            .register_customer(CustomerAggregate::new(EntityId::new("c1"), "Dana"))
            .unwrap();
        engine.record_sale(sale("inv-1", Some("c1"), 50.0)).unwrap();
        let err = engine.record_sale(sale("inv-1", Some("c1"), 50.0)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(engine.parties().customer(&EntityId::new("c1")).unwrap().total_purchases, 50.0);
    }

    #[test]
    fn non_positive_totals_are_rejected() {
        let engine = engine();
        assert!(engine.record_sale(sale("inv-1", None, 0.0)).is_err());
        assert!(engine.record_sale(sale("inv-2", None, f64::NAN)).is_err());
        assert_eq!(engine.ledger().balance(), 0.0);
    }

    #[test]
    fn maintenance_on_empty_store_reports_no_failures() {
        let report = engine().run_maintenance();
        assert!(report.failures.is_empty());
        assert_eq!(report.reconciled_checks, 0);
    }
}
