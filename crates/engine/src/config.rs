use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use bizpulse_analytics::ForecastSettings;
use bizpulse_notifications::NotificationSettings;

pub const ENV_MAINTENANCE_INTERVAL_SECS: &str = "BIZPULSE_MAINTENANCE_INTERVAL_SECS";
pub const ENV_NOTIFICATION_CAP: &str = "BIZPULSE_NOTIFICATION_CAP";
pub const ENV_OVERDUE_CHECK_DAYS: &str = "BIZPULSE_OVERDUE_CHECK_DAYS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub notifications: NotificationSettings,
    pub forecast: ForecastSettings,
    pub maintenance_interval_secs: u64,
    /// Optimistic-concurrency retries per collection write.
    pub store_max_retries: u32,
    /// Resolved notifications older than this are dropped during maintenance.
    pub resolved_retention_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            notifications: NotificationSettings::default(),
            forecast: ForecastSettings::default(),
            maintenance_interval_secs: 300,
            store_max_retries: 3,
            resolved_retention_days: 30,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `BIZPULSE_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MAINTENANCE_INTERVAL_SECS) {
            config.maintenance_interval_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_MAINTENANCE_INTERVAL_SECS} must be a whole number of seconds"))?;
        }
        if let Some(raw) = lookup(ENV_NOTIFICATION_CAP) {
            config.notifications.max_notifications = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_NOTIFICATION_CAP} must be a positive integer"))?;
        }
        if let Some(raw) = lookup(ENV_OVERDUE_CHECK_DAYS) {
            config.notifications.overdue_check_days = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_OVERDUE_CHECK_DAYS} must be a whole number of days"))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(raw).context("invalid engine configuration JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_interval_secs)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.maintenance_interval_secs > 0, "maintenance interval must be positive");
        anyhow::ensure!(
            self.notifications.max_notifications > 0,
            "notification cap must be positive"
        );
        anyhow::ensure!(
            self.forecast.min_confidence <= self.forecast.max_confidence,
            "confidence bounds are inverted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_thresholds() {
        let c = EngineConfig::default();
        assert_eq!(c.notifications.max_notifications, 1000);
        assert_eq!(c.notifications.overdue_check_days, 30);
        assert_eq!(c.forecast.seasonal_factor, 0.10);
        assert_eq!(c.maintenance_interval(), Duration::from_secs(300));
    }

    #[test]
    fn env_overrides() {
        let c = EngineConfig::from_lookup(lookup(&[
            (ENV_MAINTENANCE_INTERVAL_SECS, "60"),
            (ENV_NOTIFICATION_CAP, " 250 "),
            (ENV_OVERDUE_CHECK_DAYS, "45"),
        ]))
        .unwrap();
        assert_eq!(c.maintenance_interval_secs, 60);
        assert_eq!(c.notifications.max_notifications, 250);
        assert_eq!(c.notifications.overdue_check_days, 45);
    }

    #[test]
    fn bad_env_value_is_reported() {
        let err = EngineConfig::from_lookup(lookup(&[(ENV_NOTIFICATION_CAP, "lots")])).unwrap_err();
        assert!(err.to_string().contains(ENV_NOTIFICATION_CAP));

        assert!(EngineConfig::from_lookup(lookup(&[(ENV_MAINTENANCE_INTERVAL_SECS, "0")])).is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = EngineConfig::from_json_str(
            r#"{"maintenance_interval_secs": 10, "notifications": {"cash_critical_below": 1000.0}}"#,
        )
        .unwrap();
        assert_eq!(c.maintenance_interval_secs, 10);
        assert_eq!(c.notifications.cash_critical_below, 1000.0);
        assert_eq!(c.notifications.max_notifications, 1000);

        assert!(EngineConfig::from_json_str("{").is_err());
    }

    proptest! {
        #[test]
        fn any_positive_interval_parses(secs in 1u64..1_000_000) {
            let raw = secs.to_string();
            let c = EngineConfig::from_lookup(|key| {
                (key == ENV_MAINTENANCE_INTERVAL_SECS).then(|| raw.clone())
            })
            .unwrap();
            prop_assert_eq!(c.maintenance_interval(), Duration::from_secs(secs));
        }
    }
}
