use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as Days, NaiveDate};

use bizpulse_accounting::{PaymentMethod, TransactionType};
use bizpulse_core::{EntityId, FixedClock};
use bizpulse_engine::{BusinessEngine, EngineConfig, HandledEvent, MaintenanceRunner};
use bizpulse_events::{BusinessEvent, EventHandler};
use bizpulse_notifications::NotificationCategory;
use bizpulse_parties::{CustomerAggregate, PaymentStatus, RiskLevel};
use bizpulse_payments::{CheckStatus, HolderType, NewCheck, NewInstallment};
use bizpulse_sales::SalesInvoice;
use bizpulse_store::InMemoryDocumentStore;

type Engine = BusinessEngine<Arc<InMemoryDocumentStore>, FixedClock>;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn engine() -> Engine {
    bizpulse_observability::init();
    let engine = BusinessEngine::new(
        Arc::new(InMemoryDocumentStore::new()),
        FixedClock::on(today()),
        EngineConfig::default(),
    );
    engine
        .parties()
        .register_customer(CustomerAggregate::new(EntityId::new("c1"), "Dana Stores"))
        .unwrap();
    engine
}

fn sale(id: &str, total: f64) -> SalesInvoice {
    SalesInvoice {
        id: EntityId::new(id),
        customer_id: Some(EntityId::new("c1")),
        customer_name: Some("Dana Stores".into()),
        date: today(),
        items: Vec::new(),
        total,
        payment_method: Some(PaymentMethod::Cash),
    }
}

fn check(id: &str, days_ago: i64) -> NewCheck {
    NewCheck {
        id: Some(EntityId::new(id)),
        check_number: id.to_string(),
        amount: 5_000.0,
        date_received: today() - Days::days(days_ago),
        date_issued: today() - Days::days(days_ago),
        bank_name: "First Bank".into(),
        holder_type: HolderType::Customer,
        holder_id: Some(EntityId::new("c1")),
        holder_name: "Dana Stores".into(),
        notes: String::new(),
    }
}

#[test]
fn first_sale_builds_the_customer_aggregate() {
    let engine = engine();
    let outcome = engine.record_sale(sale("inv-1", 250.0)).unwrap();
    assert!(outcome.is_fully_linked());

    let customer = engine.parties().customer(&EntityId::new("c1")).unwrap();
    assert_eq!(customer.total_purchases, 250.0);
    assert_eq!(customer.loyalty_points, 2);
    assert_eq!(customer.average_order_value, 250.0);
    assert_eq!(customer.payment_history.len(), 1);
    let row = &customer.payment_history[0];
    assert_eq!(row.amount, 250.0);
    assert_eq!(row.method, PaymentMethod::Cash);
    assert_eq!(row.status, PaymentStatus::Paid);

    assert_eq!(engine.ledger().balance(), 250.0);
}

#[test]
fn overdue_check_is_cleared_by_cashing() {
    let engine = engine();
    engine.handle(BusinessEvent::CheckReceived(check("1001", 40))).unwrap();

    let overdue = engine.payments().get_overdue_checks();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, EntityId::new("1001"));

    let handled = engine
        .handle(BusinessEvent::CheckCashed {
            check_id: EntityId::new("1001"),
        })
        .unwrap();
    assert!(handled.holder_error().is_none());
    match handled {
        HandledEvent::Check(outcome) => assert_eq!(outcome.value.status, CheckStatus::Cashed),
        other => panic!("unexpected outcome: {other:?}"),
    }

    let income: Vec<_> = engine
        .ledger()
        .by_reference(&EntityId::new("1001"))
        .into_iter()
        .filter(|t| t.kind == TransactionType::Income)
        .collect();
    assert_eq!(income.len(), 1);
    assert_eq!(income[0].amount, 5_000.0);
    assert!(engine.payments().get_overdue_checks().is_empty());
}

#[test]
fn returned_check_raises_a_risk_notification_once() {
    let engine = engine();
    engine.handle(BusinessEvent::CheckReceived(check("2001", 2))).unwrap();
    engine
        .handle(BusinessEvent::CheckReturned {
            check_id: EntityId::new("2001"),
            reason: "insufficient funds".into(),
        })
        .unwrap();

    let customer = engine.parties().customer(&EntityId::new("c1")).unwrap();
    assert_eq!(customer.risk_level, RiskLevel::High);

    engine.run_maintenance();
    engine.run_maintenance();
    let risk = engine
        .notifications()
        .get_by_category(NotificationCategory::Customers);
    assert_eq!(risk.len(), 1);
    assert_eq!(risk[0].related_entity_id, Some(EntityId::new("c1")));
}

#[test]
fn rejected_event_changes_nothing() {
    let engine = engine();
    engine.handle(BusinessEvent::CheckReceived(check("3001", 1))).unwrap();
    engine
        .handle(BusinessEvent::CheckCancelled {
            check_id: EntityId::new("3001"),
        })
        .unwrap();

    let err = engine
        .handle(BusinessEvent::CheckCashed {
            check_id: EntityId::new("3001"),
        })
        .unwrap_err();
    assert!(err.to_string().contains("cannot transition"));
    assert_eq!(engine.ledger().balance(), 0.0);
}

#[test]
fn installment_default_surfaces_in_customer_and_notifications() {
    let engine = engine();
    engine
        .handle(BusinessEvent::InstallmentScheduled(NewInstallment {
            id: Some(EntityId::new("i1")),
            holder_id: EntityId::new("c1"),
            amount: 1_200.0,
            due_date: today() - Days::days(45),
        }))
        .unwrap();

    let report = engine.run_maintenance();
    assert!(report.failures.is_empty());

    let customer = engine.parties().customer(&EntityId::new("c1")).unwrap();
    assert_eq!(customer.overdue_installments_amount, 1_200.0);
    assert_eq!(
        engine
            .notifications()
            .get_by_category(NotificationCategory::Installments)
            .len(),
        1
    );

    engine
        .handle(BusinessEvent::InstallmentPaid {
            installment_id: EntityId::new("i1"),
        })
        .unwrap();
    engine.run_maintenance();
    let active: Vec<_> = engine
        .notifications()
        .get_active()
        .into_iter()
        .filter(|n| n.category == NotificationCategory::Installments)
        .collect();
    assert!(active.is_empty());
}

#[test]
fn report_covers_recorded_activity() {
    let engine = engine();
    engine.record_sale(sale("inv-1", 400.0)).unwrap();
    engine.record_sale(sale("inv-2", 600.0)).unwrap();

    let report = engine.generate_report(today() - Days::days(30), today());
    assert!(report.degraded_sections.is_empty());
    assert_eq!(report.financial.revenue, 1_000.0);
    assert_eq!(report.financial.invoice_count, 2);
    assert_eq!(report.period.end, today());
}

#[test]
fn events_round_trip_through_json() {
    let engine = engine();
    let raw = serde_json::json!({
        "type": "sale_recorded",
        "id": "inv-9",
        "customerId": "c1",
        "date": "2024-06-15",
        "total": 150.0
    });
    let event: BusinessEvent = serde_json::from_value(raw).unwrap();
    let handled = engine.handle(event).unwrap();
    assert!(handled.holder_error().is_none());
    assert_eq!(
        engine.parties().customer(&EntityId::new("c1")).unwrap().loyalty_points,
        1
    );
}

#[test]
fn background_runner_drives_maintenance() {
    let engine = Arc::new(engine());
    engine.handle(BusinessEvent::CheckReceived(check("4001", 45))).unwrap();

    let runner = MaintenanceRunner::with_interval(Duration::from_secs(3600));
    let handle = runner.spawn("bizpulse-maintenance", engine.clone()).unwrap();
    let report = handle.next_report(Duration::from_secs(10)).unwrap();
    handle.shutdown();

    assert!(report.failures.is_empty());
    assert!(report.scan.created >= 1);
    assert_eq!(
        engine
            .notifications()
            .get_by_category(NotificationCategory::Checks)
            .len(),
        1
    );
}
