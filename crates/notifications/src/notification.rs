use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bizpulse_core::{Entity, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Alert,
    Warning,
    Info,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationCategory {
    Inventory,
    Customers,
    Suppliers,
    Checks,
    Installments,
    CashFlow,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    #[serde(default)]
    pub action_required: bool,
    #[serde(default)]
    pub related_entity_id: Option<EntityId>,
    #[serde(default)]
    pub related_entity_type: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub auto_resolve: bool,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Unread and unresolved.
    pub fn is_active(&self) -> bool {
        !self.is_read && self.resolved_at.is_none()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    /// Whether this notification suppresses a new one with the same dedup key.
    pub fn blocks(&self, category: NotificationCategory, related: Option<&EntityId>) -> bool {
        self.is_active() && self.category == category && self.related_entity_id.as_ref() == related
    }
}

impl Entity for Notification {
    const KIND: &'static str = "notification";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

/// Notification content before it is stamped and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub kind: NotificationType,
    pub category: NotificationCategory,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    pub action_required: bool,
    pub related_entity_id: Option<EntityId>,
    pub related_entity_type: Option<String>,
    pub auto_resolve: bool,
}

impl NewNotification {
    pub fn new(
        kind: NotificationType,
        category: NotificationCategory,
        priority: Priority,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            category,
            priority,
            title: title.into(),
            message: message.into(),
            action_required: false,
            related_entity_id: None,
            related_entity_type: None,
            auto_resolve: false,
        }
    }

    pub fn about(mut self, entity_type: &str, id: EntityId) -> Self {
        self.related_entity_type = Some(entity_type.to_string());
        self.related_entity_id = Some(id);
        self
    }

    pub fn action_required(mut self) -> Self {
        self.action_required = true;
        self
    }

    pub fn auto_resolve(mut self) -> Self {
        self.auto_resolve = true;
        self
    }

    pub(crate) fn stamp(self, now: DateTime<Utc>) -> Notification {
        Notification {
            id: EntityId::generate(),
            kind: self.kind,
            category: self.category,
            title: self.title,
            message: self.message,
            priority: self.priority,
            action_required: self.action_required,
            related_entity_id: self.related_entity_id,
            related_entity_type: self.related_entity_type,
            created_at: now,
            is_read: false,
            auto_resolve: self.auto_resolve,
            resolved_at: None,
        }
    }
}

/// One completed backup, as recorded in `backup_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    pub completed_at: DateTime<Utc>,
}
