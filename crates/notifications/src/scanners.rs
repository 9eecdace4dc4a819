//! Scanners: each reads its source collection, proposes notifications for
//! every entity crossing a threshold and auto-resolves the ones that cleared.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use bizpulse_accounting::net_flow;
use bizpulse_core::{Clock, DomainResult, EntityId, days_between};
use bizpulse_inventory::Product;
use bizpulse_parties::CustomerAggregate;
use bizpulse_payments::{Check, CheckStatus, Installment};
use bizpulse_store::{DocumentStore, keys};

use crate::engine::{NotificationEngine, ScanReport};
use crate::notification::{
    BackupRecord, NewNotification, Notification, NotificationCategory, NotificationType, Priority,
};
use crate::priority;

const CASH_BALANCE_ID: &str = "cash-balance";
const NET_CASH_FLOW_ID: &str = "net-cash-flow";
const BACKUP_ID: &str = "backup";

fn owns_any(_: &Notification) -> bool {
    true
}

fn kind_for(priority: Priority) -> NotificationType {
    match priority {
        Priority::Critical => NotificationType::Alert,
        Priority::High | Priority::Medium => NotificationType::Warning,
        Priority::Low => NotificationType::Info,
    }
}

impl<S, C> NotificationEngine<S, C>
where
    S: DocumentStore + Clone,
    C: Clock,
{
    pub fn check_low_stock_alerts(&self) -> DomainResult<ScanReport> {
        let products: Vec<Product> = self.collections.get_collection(keys::PRODUCTS, Vec::new());
        let candidates = products
            .into_iter()
            .filter_map(|p| {
                let priority = priority::stock_priority(p.stock, p.min_stock)?;
                let (title, message) = if p.stock <= 0.0 {
                    ("Out of stock".to_string(), format!("{} is out of stock", p.name))
                } else {
                    (
                        "Low stock".to_string(),
                        format!("{} has {} left (minimum {})", p.name, p.stock, p.min_stock),
                    )
                };
                Some(
                    NewNotification::new(
                        kind_for(priority),
                        NotificationCategory::Inventory,
                        priority,
                        title,
                        message,
                    )
                    .about("product", p.id)
                    .action_required()
                    .auto_resolve(),
                )
            })
            .collect();

        self.sync(NotificationCategory::Inventory, Some(&owns_any), candidates)
            .map(|(report, _)| report)
    }

    pub fn check_customer_risk_alerts(&self) -> DomainResult<ScanReport> {
        let customers: Vec<CustomerAggregate> =
            self.collections.get_collection(keys::CUSTOMERS, Vec::new());
        let candidates = customers
            .into_iter()
            .filter_map(|c| {
                let priority = priority::customer_risk_priority(c.risk_level)?;
                Some(
                    NewNotification::new(
                        kind_for(priority),
                        NotificationCategory::Customers,
                        priority,
                        format!("{} risk customer", c.risk_level),
                        format!(
                            "{} owes {:.2} with {:.2} in pending checks",
                            c.name, c.total_debt, c.pending_checks_amount
                        ),
                    )
                    .about("customer", c.id)
                    .action_required()
                    .auto_resolve(),
                )
            })
            .collect();

        self.sync(NotificationCategory::Customers, Some(&owns_any), candidates)
            .map(|(report, _)| report)
    }

    pub fn check_overdue_checks(&self) -> DomainResult<ScanReport> {
        let today = self.clock.today();
        let after = self.settings.overdue_check_days;
        let checks: Vec<Check> = self.collections.get_collection(keys::CHECKS, Vec::new());
        let candidates = checks
            .into_iter()
            .filter(|c| c.status == CheckStatus::Pending && c.is_overdue(today, after))
            .map(|c| {
                let priority = priority::overdue_check_priority();
                NewNotification::new(
                    kind_for(priority),
                    NotificationCategory::Checks,
                    priority,
                    "Overdue check",
                    format!(
                        "check {} ({:.2}) has been pending for {} days",
                        c.check_number,
                        c.amount,
                        c.days_pending(today)
                    ),
                )
                .about("check", c.id)
                .action_required()
                .auto_resolve()
            })
            .collect();

        self.sync(NotificationCategory::Checks, Some(&owns_any), candidates)
            .map(|(report, _)| report)
    }

    pub fn check_overdue_installments(&self) -> DomainResult<ScanReport> {
        let today = self.clock.today();
        let installments: Vec<Installment> =
            self.collections.get_collection(keys::INSTALLMENTS, Vec::new());
        let candidates = installments
            .into_iter()
            .filter(|i| i.is_overdue(today))
            .map(|i| {
                let days = i.days_past_due(today);
                let priority = priority::installment_priority(days);
                NewNotification::new(
                    kind_for(priority),
                    NotificationCategory::Installments,
                    priority,
                    "Overdue installment",
                    format!("installment of {:.2} is {} days past due", i.amount, days),
                )
                .about("installment", i.id)
                .action_required()
                .auto_resolve()
            })
            .collect();

        self.sync(NotificationCategory::Installments, Some(&owns_any), candidates)
            .map(|(report, _)| report)
    }

    pub fn check_cash_flow_alerts(&self) -> DomainResult<ScanReport> {
        let today = self.clock.today();
        let transactions = self.ledger.transactions();
        let balance = bizpulse_accounting::balance_of(&transactions);
        let window = self.settings.net_flow_window_days;
        let flow = net_flow(&transactions, today - Duration::days(window), today);

        let mut candidates = Vec::new();
        if let Some(priority) = priority::cash_balance_priority(balance, &self.settings) {
            candidates.push(
                NewNotification::new(
                    kind_for(priority),
                    NotificationCategory::CashFlow,
                    priority,
                    "Low cash balance",
                    format!("cash balance is {balance:.2}"),
                )
                .about("cash", EntityId::new(CASH_BALANCE_ID))
                .action_required()
                .auto_resolve(),
            );
        }
        if let Some(priority) = priority::net_flow_priority(flow) {
            candidates.push(
                NewNotification::new(
                    kind_for(priority),
                    NotificationCategory::CashFlow,
                    priority,
                    "Negative cash flow",
                    format!("net cash flow over the last {window} days is {flow:.2}"),
                )
                .about("cash", EntityId::new(NET_CASH_FLOW_ID))
                .auto_resolve(),
            );
        }

        self.sync(NotificationCategory::CashFlow, Some(&owns_any), candidates)
            .map(|(report, _)| report)
    }

    pub fn check_backup_reminder(&self) -> DomainResult<ScanReport> {
        let age_days = self
            .last_backup()
            .map(|at| days_between(at.date_naive(), self.clock.today()));

        let candidates = priority::backup_priority(age_days, &self.settings)
            .map(|priority| {
                let message = match age_days {
                    Some(days) => format!("last backup was {days} days ago"),
                    None => "no backup has been recorded".to_string(),
                };
                NewNotification::new(
                    NotificationType::Info,
                    NotificationCategory::System,
                    priority,
                    "Backup reminder",
                    message,
                )
                .about("system", EntityId::new(BACKUP_ID))
                .action_required()
                .auto_resolve()
            })
            .into_iter()
            .collect();

        let owns_backup = |n: &Notification| {
            n.related_entity_id.as_ref().is_some_and(|id| id.as_str() == BACKUP_ID)
        };
        self.sync(NotificationCategory::System, Some(&owns_backup), candidates)
            .map(|(report, _)| report)
    }

    pub fn record_backup(&self, completed_at: DateTime<Utc>) -> DomainResult<()> {
        self.collections
            .append(keys::BACKUP_HISTORY, BackupRecord { completed_at })
    }

    pub fn last_backup(&self) -> Option<DateTime<Utc>> {
        self.collections
            .get_collection::<BackupRecord>(keys::BACKUP_HISTORY, Vec::new())
            .into_iter()
            .map(|b| b.completed_at)
            .max()
    }

    /// Run every scanner. A failing scanner is logged and skipped.
    pub fn run_all_checks(&self) -> ScanReport {
        let scanners: [(&str, fn(&Self) -> DomainResult<ScanReport>); 6] = [
            ("low_stock", Self::check_low_stock_alerts),
            ("customer_risk", Self::check_customer_risk_alerts),
            ("overdue_checks", Self::check_overdue_checks),
            ("overdue_installments", Self::check_overdue_installments),
            ("cash_flow", Self::check_cash_flow_alerts),
            ("backup", Self::check_backup_reminder),
        ];

        scanners
            .iter()
            .fold(ScanReport::default(), |total, (name, scan)| match scan(self) {
                Ok(report) => total.merge(report),
                Err(err) => {
                    warn!(scanner = name, error = %err, "notification scanner failed");
                    total
                }
            })
    }
}
