//! Condition → priority table for every scanner.
//!
//! `None` means the condition does not warrant a notification.

use bizpulse_parties::RiskLevel;

use crate::notification::Priority;
use crate::settings::NotificationSettings;

pub fn stock_priority(stock: f64, min_stock: f64) -> Option<Priority> {
    if stock <= 0.0 {
        Some(Priority::Critical)
    } else if stock <= min_stock {
        if stock <= min_stock / 2.0 {
            Some(Priority::High)
        } else {
            Some(Priority::Medium)
        }
    } else {
        None
    }
}

pub fn customer_risk_priority(level: RiskLevel) -> Option<Priority> {
    match level {
        RiskLevel::High => Some(Priority::Critical),
        RiskLevel::Medium => Some(Priority::High),
        RiskLevel::Low => None,
    }
}

pub fn overdue_check_priority() -> Priority {
    Priority::High
}

/// Only called for installments already past due.
pub fn installment_priority(days_past_due: i64) -> Priority {
    if days_past_due > 30 {
        Priority::Critical
    } else if days_past_due > 7 {
        Priority::High
    } else {
        Priority::Medium
    }
}

pub fn cash_balance_priority(balance: f64, settings: &NotificationSettings) -> Option<Priority> {
    if balance < settings.cash_critical_below {
        Some(Priority::Critical)
    } else if balance < settings.cash_high_below {
        Some(Priority::High)
    } else {
        None
    }
}

pub fn net_flow_priority(net_flow: f64) -> Option<Priority> {
    (net_flow < 0.0).then_some(Priority::High)
}

/// `age_days` is `None` when no backup was ever recorded.
pub fn backup_priority(age_days: Option<i64>, settings: &NotificationSettings) -> Option<Priority> {
    match age_days {
        None => Some(Priority::High),
        Some(age) if age > settings.backup_high_after_days => Some(Priority::High),
        Some(age) if age >= settings.backup_reminder_after_days => Some(Priority::Medium),
        Some(_) => None,
    }
}
