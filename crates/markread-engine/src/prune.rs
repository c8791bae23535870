use serde::Serialize;
use serde_json::Value;

use markread_core::keys;
use markread_core::StorageMap;

/// Result of one retention sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PruneOutcome {
    /// Retention is zero or negative; nothing was examined.
    Disabled,
    Swept { cutoff: i64, removed: usize },
}

impl PruneOutcome {
    pub fn removed(&self) -> usize {
        match self {
            Self::Disabled => 0,
            Self::Swept { removed, .. } => *removed,
        }
    }
}

/// Keys of link records whose timestamp is strictly older than `cutoff`.
///
/// Non-link keys and non-numeric values are never selected.
pub fn select_expired(items: &StorageMap, cutoff: i64) -> Vec<String> {
    items
        .iter()
        .filter(|(key, value)| keys::is_link_key(key) && is_older_than(value, cutoff))
        .map(|(key, _)| key.clone())
        .collect()
}

fn is_older_than(value: &Value, cutoff: i64) -> bool {
    let Value::Number(n) = value else {
        return false;
    };
    match n.as_i64() {
        Some(ts) => ts < cutoff,
        None => n.as_f64().is_some_and(|ts| ts < cutoff as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markread_core::keys::MS_PER_DAY;
    use serde_json::json;

    fn items(pairs: &[(&str, Value)]) -> StorageMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn selects_only_stale_link_records() {
        let now = 100 * MS_PER_DAY;
        let cutoff = now - MS_PER_DAY;
        let store = items(&[
            ("https://old.example/", json!(now - 2 * MS_PER_DAY)),
            ("https://fresh.example/", json!(now - MS_PER_DAY / 2)),
            ("pruneAfterDays", json!(0)),
            ("linkColor", json!("red")),
            ("legacy", json!(1)),
        ]);
        assert_eq!(select_expired(&store, cutoff), vec!["https://old.example/"]);
    }

    #[test]
    fn cutoff_is_strict() {
        let store = items(&[("https://a.example/", json!(500))]);
        assert!(select_expired(&store, 500).is_empty());
        assert_eq!(select_expired(&store, 501).len(), 1);
    }

    #[test]
    fn non_numeric_values_survive() {
        let store = items(&[
            ("https://s.example/", json!("12")),
            ("https://n.example/", json!(null)),
            ("https://o.example/", json!({"ts": 1})),
            ("https://f.example/", json!(1.5)),
        ]);
        assert_eq!(select_expired(&store, 10), vec!["https://f.example/"]);
    }

    #[test]
    fn outcome_removed_count() {
        assert_eq!(PruneOutcome::Disabled.removed(), 0);
        assert_eq!(PruneOutcome::Swept { cutoff: 1, removed: 4 }.removed(), 4);
    }
}
