use serde::{Deserialize, Serialize};

/// Thresholds used by the notification scanners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Ring-buffer capacity; the oldest notifications are evicted beyond it.
    pub max_notifications: usize,
    /// A pending check older than this many days is overdue.
    pub overdue_check_days: i64,
    pub cash_critical_below: f64,
    pub cash_high_below: f64,
    /// Trailing window for the net cash flow alert.
    pub net_flow_window_days: i64,
    pub backup_reminder_after_days: i64,
    pub backup_high_after_days: i64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            max_notifications: 1000,
            overdue_check_days: 30,
            cash_critical_below: 5_000.0,
            cash_high_below: 10_000.0,
            net_flow_window_days: 30,
            backup_reminder_after_days: 7,
            backup_high_after_days: 30,
        }
    }
}
