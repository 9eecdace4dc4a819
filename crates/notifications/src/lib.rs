//! Threshold scanners and the capped, deduplicated notification feed.

pub mod engine;
pub mod notification;
pub mod priority;
pub mod scanners;
pub mod settings;

pub use engine::{NotificationEngine, NotificationStats, ScanReport};
pub use notification::{
    BackupRecord, NewNotification, Notification, NotificationCategory, NotificationType, Priority,
};
pub use settings::NotificationSettings;
