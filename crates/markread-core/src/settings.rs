use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::errors::StorageError;
use crate::keys::{self, LINK_COLOR_KEY, MS_PER_DAY, PRUNE_AFTER_DAYS_KEY};
use crate::storage::{Storage, StorageMap};

pub const DEFAULT_PRUNE_AFTER_DAYS: i64 = 60;
pub const DEFAULT_LINK_COLOR: &str = "#D3D3D3";

/// User-configurable settings stored alongside the link records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Retention window. Zero or negative disables pruning.
    pub prune_after_days: i64,
    /// CSS color applied to read links.
    pub link_color: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prune_after_days: DEFAULT_PRUNE_AFTER_DAYS,
            link_color: DEFAULT_LINK_COLOR.to_string(),
        }
    }
}

impl Settings {
    /// Build settings from raw stored values, falling back to defaults for
    /// anything absent or of the wrong type.
    pub fn from_items(items: &StorageMap) -> Self {
        let defaults = Self::default();
        let prune_after_days = match items.get(PRUNE_AFTER_DAYS_KEY) {
            None => defaults.prune_after_days,
            Some(value) => value.as_i64().unwrap_or_else(|| {
                warn!(%value, "stored pruneAfterDays is not an integer, using default");
                defaults.prune_after_days
            }),
        };
        Self {
            prune_after_days,
            link_color: items
                .get(LINK_COLOR_KEY)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(defaults.link_color),
        }
    }

    pub fn to_items(&self) -> StorageMap {
        let mut items = StorageMap::new();
        items.insert(PRUNE_AFTER_DAYS_KEY.into(), Value::from(self.prune_after_days));
        items.insert(LINK_COLOR_KEY.into(), Value::from(self.link_color.clone()));
        items
    }

    /// Read settings from storage. Nothing is written back.
    pub async fn load(storage: &dyn Storage) -> Result<Self, StorageError> {
        let wanted: Vec<String> = keys::SETTINGS_KEYS.iter().map(|k| k.to_string()).collect();
        let items = storage.get(&wanted).await?;
        Ok(Self::from_items(&items))
    }

    pub async fn save(&self, storage: &dyn Storage) -> Result<(), StorageError> {
        storage.set(self.to_items()).await
    }

    pub fn pruning_enabled(&self) -> bool {
        self.prune_after_days > 0
    }

    /// Timestamp before which link records expire, or `None` when pruning is off.
    pub fn prune_cutoff(&self, now_ms: i64) -> Option<i64> {
        if !self.pruning_enabled() {
            return None;
        }
        Some(now_ms.saturating_sub(self.prune_after_days.saturating_mul(MS_PER_DAY)))
    }

    /// Validate raw form input.
    pub fn parse_input(days: &str, color: &str) -> Result<Self, SettingsError> {
        let days_trimmed = days.trim();
        let prune_after_days: i64 = days_trimmed
            .parse()
            .map_err(|_| SettingsError::InvalidDays(days_trimmed.to_string()))?;
        if prune_after_days < 0 {
            return Err(SettingsError::InvalidDays(days_trimmed.to_string()));
        }

        let color = color.trim();
        if color.is_empty() {
            return Err(SettingsError::EmptyColor);
        }

        Ok(Self {
            prune_after_days,
            link_color: color.to_string(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid number of days: {0:?}")]
    InvalidDays(String),

    #[error("highlight color must not be empty")]
    EmptyColor,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.prune_after_days, 60);
        assert_eq!(s.link_color, "#D3D3D3");
    }

    #[test]
    fn from_items_uses_stored_values() {
        let mut items = StorageMap::new();
        items.insert("pruneAfterDays".into(), json!(7));
        items.insert("linkColor".into(), json!("red"));
        let s = Settings::from_items(&items);
        assert_eq!(s.prune_after_days, 7);
        assert_eq!(s.link_color, "red");
    }

    #[test]
    fn from_items_falls_back_on_wrong_types() {
        let mut items = StorageMap::new();
        items.insert("pruneAfterDays".into(), json!("soon"));
        items.insert("linkColor".into(), json!(12));
        assert_eq!(Settings::from_items(&items), Settings::default());
        assert_eq!(Settings::from_items(&StorageMap::new()), Settings::default());
    }

    #[test]
    fn to_items_round_trips_through_from_items() {
        let s = Settings {
            prune_after_days: 3,
            link_color: "#123456".into(),
        };
        assert_eq!(Settings::from_items(&s.to_items()), s);
    }

    #[test]
    fn cutoff_disabled_for_zero_and_negative() {
        let now = 10 * MS_PER_DAY;
        for days in [0, -1, -30] {
            let s = Settings {
                prune_after_days: days,
                ..Settings::default()
            };
            assert!(!s.pruning_enabled());
            assert_eq!(s.prune_cutoff(now), None);
        }
    }

    #[test]
    fn cutoff_subtracts_whole_days() {
        let s = Settings {
            prune_after_days: 1,
            ..Settings::default()
        };
        assert_eq!(s.prune_cutoff(5 * MS_PER_DAY), Some(4 * MS_PER_DAY));
    }

    #[test]
    fn cutoff_saturates() {
        let s = Settings {
            prune_after_days: i64::MAX,
            ..Settings::default()
        };
        assert_eq!(s.prune_cutoff(0), Some(-i64::MAX));
        assert_eq!(s.prune_cutoff(-10), Some(i64::MIN));
    }

    #[test]
    fn parse_input_accepts_non_negative_integers() {
        let s = Settings::parse_input(" 30 ", " blue ").unwrap();
        assert_eq!(s.prune_after_days, 30);
        assert_eq!(s.link_color, "blue");
        assert_eq!(Settings::parse_input("0", "#fff").unwrap().prune_after_days, 0);
    }

    #[test]
    fn parse_input_rejects_bad_days() {
        for bad in ["", "abc", "-1", "1.5", "12abc"] {
            assert!(
                matches!(Settings::parse_input(bad, "#fff"), Err(SettingsError::InvalidDays(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn parse_input_rejects_empty_color() {
        assert_eq!(
            Settings::parse_input("5", "  "),
            Err(SettingsError::EmptyColor)
        );
    }
}
