//! Capped notification feed with dedup, read and resolve operations.

use std::collections::{BTreeMap, HashSet};

use chrono::Duration;
use serde::Serialize;
use tracing::{debug, info};

use bizpulse_accounting::CashLedger;
use bizpulse_core::entity::find_mut;
use bizpulse_core::{Clock, DomainError, DomainResult, Entity, EntityId};
use bizpulse_store::{Collections, DocumentStore, keys};

use crate::notification::{NewNotification, Notification, NotificationCategory, Priority};
use crate::settings::NotificationSettings;

/// What one scanner pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub created: usize,
    pub resolved: usize,
}

impl ScanReport {
    pub fn merge(self, other: ScanReport) -> ScanReport {
        ScanReport {
            created: self.created + other.created,
            resolved: self.resolved + other.resolved,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStats {
    pub total: usize,
    pub unread: usize,
    pub active: usize,
    /// Unread notifications that ask for an action.
    pub action_required: usize,
    /// Unread counts.
    pub by_priority: BTreeMap<Priority, usize>,
    /// Unread counts.
    pub by_category: BTreeMap<NotificationCategory, usize>,
}

#[derive(Debug, Clone)]
pub struct NotificationEngine<S, C> {
    pub(crate) collections: Collections<S>,
    pub(crate) ledger: CashLedger<S>,
    pub(crate) clock: C,
    pub(crate) settings: NotificationSettings,
}

impl<S, C> NotificationEngine<S, C>
where
    S: DocumentStore + Clone,
    C: Clock,
{
    pub fn new(collections: Collections<S>, clock: C) -> Self {
        Self {
            ledger: CashLedger::new(collections.clone()),
            collections,
            clock,
            settings: NotificationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: NotificationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    /// Newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.collections.get_collection(keys::SMART_NOTIFICATIONS, Vec::new())
    }

    pub fn get_active(&self) -> Vec<Notification> {
        self.notifications().into_iter().filter(Notification::is_active).collect()
    }

    pub fn get_unread(&self) -> Vec<Notification> {
        self.notifications().into_iter().filter(|n| !n.is_read).collect()
    }

    pub fn get_by_category(&self, category: NotificationCategory) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(|n| n.category == category)
            .collect()
    }

    /// Prepend unconditionally, evicting the oldest beyond the cap.
    pub fn create(&self, new: NewNotification) -> DomainResult<Notification> {
        let notification = new.stamp(self.clock.now());
        let cap = self.settings.max_notifications;
        self.collections
            .update_collection::<Notification, (), _>(keys::SMART_NOTIFICATIONS, |rows| {
                rows.insert(0, notification.clone());
                rows.truncate(cap);
                Ok(())
            })?;
        debug!(notification_id = %notification.id, category = ?notification.category, "notification created");
        Ok(notification)
    }

    /// Create unless an active notification with the same dedup key exists.
    pub fn create_unless_active(&self, new: NewNotification) -> DomainResult<Option<Notification>> {
        let report = self.sync(new.category, None, vec![new])?;
        Ok(report.1.into_iter().next())
    }

    pub fn mark_as_read(&self, id: &EntityId) -> DomainResult<()> {
        self.modify(id, |n| n.is_read = true)
    }

    pub fn mark_all_as_read(&self) -> DomainResult<usize> {
        self.collections
            .update_collection::<Notification, usize, _>(keys::SMART_NOTIFICATIONS, |rows| {
                let mut changed = 0;
                for n in rows.iter_mut().filter(|n| !n.is_read) {
                    n.is_read = true;
                    changed += 1;
                }
                Ok(changed)
            })
    }

    /// Mark resolved. Resolving twice keeps the first timestamp.
    pub fn resolve(&self, id: &EntityId) -> DomainResult<()> {
        let now = self.clock.now();
        self.modify(id, |n| {
            n.resolved_at.get_or_insert(now);
        })
    }

    pub fn delete_notification(&self, id: &EntityId) -> DomainResult<()> {
        self.collections
            .update_collection::<Notification, (), _>(keys::SMART_NOTIFICATIONS, |rows| {
                let before = rows.len();
                rows.retain(|n| &n.id != id);
                if rows.len() == before {
                    return Err(DomainError::not_found(Notification::KIND, id));
                }
                Ok(())
            })
    }

    /// Drop notifications resolved more than `older_than_days` ago.
    pub fn cleanup_resolved(&self, older_than_days: i64) -> DomainResult<usize> {
        let cutoff = self.clock.now() - Duration::days(older_than_days);
        let removed = self
            .collections
            .update_collection::<Notification, usize, _>(keys::SMART_NOTIFICATIONS, |rows| {
                let before = rows.len();
                rows.retain(|n| n.resolved_at.is_none_or(|at| at >= cutoff));
                Ok(before - rows.len())
            })?;
        if removed > 0 {
            info!(removed, "resolved notifications cleaned up");
        }
        Ok(removed)
    }

    pub fn get_notifications_stats(&self) -> NotificationStats {
        let mut stats = NotificationStats::default();
        for n in self.notifications() {
            stats.total += 1;
            if n.is_active() {
                stats.active += 1;
            }
            if n.is_read {
                continue;
            }
            stats.unread += 1;
            if n.action_required {
                stats.action_required += 1;
            }
            *stats.by_priority.entry(n.priority).or_default() += 1;
            *stats.by_category.entry(n.category).or_default() += 1;
        }
        stats
    }

    /// Write `candidates` that are not already active, then resolve active
    /// auto-resolving notifications of `category` whose related entity is no
    /// longer a candidate. `scope` limits which related ids this pass owns;
    /// `None` disables auto-resolve.
    pub(crate) fn sync(
        &self,
        category: NotificationCategory,
        scope: Option<&dyn Fn(&Notification) -> bool>,
        candidates: Vec<NewNotification>,
    ) -> DomainResult<(ScanReport, Vec<Notification>)> {
        let now = self.clock.now();
        let cap = self.settings.max_notifications;
        let still_firing: HashSet<Option<EntityId>> = candidates
            .iter()
            .map(|c| c.related_entity_id.clone())
            .collect();

        let (report, created) = self.collections.update_collection::<Notification, _, _>(
            keys::SMART_NOTIFICATIONS,
            |rows| {
                let mut report = ScanReport::default();
                let mut created = Vec::new();

                if let Some(owns) = scope {
                    for n in rows.iter_mut() {
                        if n.category == category
                            && n.auto_resolve
                            && !n.is_resolved()
                            && owns(n)
                            && !still_firing.contains(&n.related_entity_id)
                        {
                            n.resolved_at = Some(now);
                            report.resolved += 1;
                        }
                    }
                }

                for candidate in &candidates {
                    let key = candidate.related_entity_id.as_ref();
                    let blocked = rows.iter().chain(created.iter()).any(|n: &Notification| {
                        n.blocks(candidate.category, key)
                    });
                    if blocked {
                        continue;
                    }
                    created.push(candidate.clone().stamp(now));
                    report.created += 1;
                }

                for n in &created {
                    rows.insert(0, n.clone());
                }
                rows.truncate(cap);
                Ok((report, created))
            },
        )?;

        if report.created > 0 || report.resolved > 0 {
            info!(
                category = ?category,
                created = report.created,
                resolved = report.resolved,
                "notifications synced"
            );
        }
        Ok((report, created))
    }

    fn modify<F>(&self, id: &EntityId, mut f: F) -> DomainResult<()>
    where
        F: FnMut(&mut Notification),
    {
        self.collections
            .update_collection::<Notification, (), _>(keys::SMART_NOTIFICATIONS, |rows| {
                let n = find_mut(rows, id)
                    .ok_or_else(|| DomainError::not_found(Notification::KIND, id))?;
                f(n);
                Ok(())
            })
    }
}
