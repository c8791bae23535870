use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use markread_core::storage::count_link_keys;
use markread_core::{Message, RuntimeMessenger, Settings, Storage};

use crate::error::SurfaceError;

/// Text shown in the options page status region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

impl From<&SurfaceError> for StatusMessage {
    fn from(e: &SurfaceError) -> Self {
        Self::error(e.user_message())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    pub link_count: usize,
    pub bytes_in_use: u64,
}

impl StorageStats {
    /// Size in mebibytes with three decimals, e.g. `0.001`.
    pub fn size_mb(&self) -> String {
        format!("{:.3}", self.bytes_in_use as f64 / (1024.0 * 1024.0))
    }
}

impl fmt::Display for StorageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total links stored: {}", self.link_count)?;
        write!(f, "Database size: ~{} MB", self.size_mb())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveReport {
    pub settings: Settings,
    /// Links removed by the prune that follows a save.
    pub removed: usize,
    /// Refreshed stats; `None` if they could not be loaded.
    pub stats: Option<StorageStats>,
    pub status: StatusMessage,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClearOutcome {
    /// The user did not confirm; nothing was touched.
    Cancelled,
    Cleared {
        stats: Option<StorageStats>,
        settings: Settings,
        status: StatusMessage,
    },
}

/// The settings surface: reads and writes settings, shows stats, wipes data.
pub struct OptionsPage {
    storage: Arc<dyn Storage>,
    runtime: Arc<dyn RuntimeMessenger>,
}

impl OptionsPage {
    pub fn new(storage: Arc<dyn Storage>, runtime: Arc<dyn RuntimeMessenger>) -> Self {
        Self { storage, runtime }
    }

    pub async fn load_stats(&self) -> Result<StorageStats, SurfaceError> {
        let items = self.storage.get_all().await.map_err(SurfaceError::Stats)?;
        let bytes_in_use = self
            .storage
            .bytes_in_use(None)
            .await
            .map_err(SurfaceError::Stats)?;
        Ok(StorageStats {
            link_count: count_link_keys(items.keys()),
            bytes_in_use,
        })
    }

    pub async fn load_settings(&self) -> Result<Settings, SurfaceError> {
        Settings::load(self.storage.as_ref())
            .await
            .map_err(SurfaceError::LoadSettings)
    }

    /// Validate and store settings, then broadcast the color, prune, and refresh stats.
    ///
    /// Invalid input writes nothing.
    pub async fn save_settings(&self, days: &str, color: &str) -> Result<SaveReport, SurfaceError> {
        let settings = Settings::parse_input(days, color)?;

        let result = self.persist_and_notify(&settings).await;
        let removed = match result {
            Ok(removed) => removed,
            Err(e) => {
                error!(error = %e, "error saving settings");
                return Err(e);
            }
        };

        let stats = self.stats_for_display().await;
        Ok(SaveReport {
            settings,
            removed,
            stats,
            status: StatusMessage::ok("Settings saved and pruning complete."),
        })
    }

    async fn persist_and_notify(&self, settings: &Settings) -> Result<usize, SurfaceError> {
        settings
            .save(self.storage.as_ref())
            .await
            .map_err(SurfaceError::SaveStorage)?;

        self.runtime
            .send(Message::UpdateColor {
                color: settings.link_color.clone(),
            })
            .await
            .map_err(SurfaceError::SaveMessaging)?;

        let resp = self
            .runtime
            .send(Message::RunPruning)
            .await
            .map_err(SurfaceError::SaveMessaging)?;
        Ok(resp.removed.unwrap_or(0))
    }

    /// Erase the whole store, settings included, if `confirmed`.
    pub async fn clear_all(&self, confirmed: bool) -> Result<ClearOutcome, SurfaceError> {
        if !confirmed {
            return Ok(ClearOutcome::Cancelled);
        }

        if let Err(e) = self.storage.clear().await {
            let err = SurfaceError::Clear(e);
            error!(error = %err, "error clearing data");
            return Err(err);
        }
        info!("storage cleared");

        let (stats, settings) = tokio::join!(self.stats_for_display(), self.load_settings());
        let settings = settings.unwrap_or_else(|e| {
            warn!(error = %e, "showing default settings after clear");
            Settings::default()
        });
        Ok(ClearOutcome::Cleared {
            stats,
            settings,
            status: StatusMessage::ok("All data cleared successfully."),
        })
    }

    async fn stats_for_display(&self) -> Option<StorageStats> {
        match self.load_stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(error = %e, "could not load statistics");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use markread_core::{HostError, Response, Status, StorageError, StorageMap};
    use markread_store::MemoryStorage;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingRuntime {
        sent: Mutex<Vec<Message>>,
        fail: bool,
    }

    #[async_trait]
    impl RuntimeMessenger for RecordingRuntime {
        async fn send(&self, message: Message) -> Result<Response, HostError> {
            if self.fail {
                return Err(HostError::Disconnected);
            }
            let resp = match &message {
                Message::RunPruning => Response::new(Status::PruningComplete).with_removed(2),
                _ => Response::new(Status::ColorUpdateBroadcasted),
            };
            self.sent.lock().push(message);
            Ok(resp)
        }
    }

    /// Storage whose every call fails.
    struct BrokenStorage;

    #[async_trait]
    impl Storage for BrokenStorage {
        async fn get(&self, _keys: &[String]) -> Result<StorageMap, StorageError> {
            Err(StorageError::Backend("io".into()))
        }
        async fn get_all(&self) -> Result<StorageMap, StorageError> {
            Err(StorageError::Backend("io".into()))
        }
        async fn set(&self, _items: StorageMap) -> Result<(), StorageError> {
            Err(StorageError::Backend("io".into()))
        }
        async fn remove(&self, _keys: &[String]) -> Result<(), StorageError> {
            Err(StorageError::Backend("io".into()))
        }
        async fn clear(&self) -> Result<(), StorageError> {
            Err(StorageError::Backend("io".into()))
        }
        async fn bytes_in_use(&self, _keys: Option<&[String]>) -> Result<u64, StorageError> {
            Err(StorageError::Backend("io".into()))
        }
    }

    fn page(items: StorageMap) -> (OptionsPage, Arc<MemoryStorage>, Arc<RecordingRuntime>) {
        let storage = Arc::new(MemoryStorage::with_items(items));
        let runtime = Arc::new(RecordingRuntime::default());
        (OptionsPage::new(storage.clone(), runtime.clone()), storage, runtime)
    }

    fn mixed_store() -> StorageMap {
        [
            ("https://a.example/", json!(1)),
            ("http://b.example/", json!(2)),
            ("pruneAfterDays", json!(10)),
            ("linkColor", json!("red")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    #[tokio::test]
    async fn stats_count_only_link_records() {
        let (page, storage, _) = page(mixed_store());
        let stats = page.load_stats().await.unwrap();
        assert_eq!(stats.link_count, 2);
        assert_eq!(stats.bytes_in_use, storage.bytes_in_use(None).await.unwrap());
    }

    #[test]
    fn stats_display() {
        let stats = StorageStats {
            link_count: 3,
            bytes_in_use: 1_572_864,
        };
        assert_eq!(stats.size_mb(), "1.500");
        assert_eq!(
            stats.to_string(),
            "Total links stored: 3\nDatabase size: ~1.500 MB"
        );
    }

    #[tokio::test]
    async fn load_settings_defaults_when_absent() {
        let (page, _, _) = page(StorageMap::new());
        assert_eq!(page.load_settings().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn save_writes_notifies_and_prunes() {
        let (page, storage, runtime) = page(StorageMap::new());
        let report = page.save_settings("14", "#00ff00").await.unwrap();

        assert_eq!(report.settings.prune_after_days, 14);
        assert_eq!(report.removed, 2);
        assert!(!report.status.is_error);
        assert_eq!(report.stats.unwrap().link_count, 0);

        let snap = storage.snapshot();
        assert_eq!(snap["pruneAfterDays"], json!(14));
        assert_eq!(snap["linkColor"], json!("#00ff00"));
        assert_eq!(
            runtime.sent.lock().as_slice(),
            &[
                Message::UpdateColor {
                    color: "#00ff00".into()
                },
                Message::RunPruning
            ]
        );
    }

    #[tokio::test]
    async fn invalid_days_leave_settings_unchanged() {
        let (page, storage, runtime) = page(mixed_store());
        for bad in ["abc", "-3", ""] {
            let err = page.save_settings(bad, "blue").await.unwrap_err();
            assert!(err.is_validation());
            assert_eq!(
                StatusMessage::from(&err),
                StatusMessage::error("Please enter a valid number of days (0 or more).")
            );
        }
        assert_eq!(storage.snapshot(), mixed_store());
        assert!(runtime.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn messaging_failure_reports_save_error() {
        let storage = Arc::new(MemoryStorage::new());
        let runtime = Arc::new(RecordingRuntime {
            fail: true,
            ..RecordingRuntime::default()
        });
        let page = OptionsPage::new(storage, runtime);
        let err = page.save_settings("5", "red").await.unwrap_err();
        assert!(matches!(err, SurfaceError::SaveMessaging(_)));
        assert_eq!(err.user_message(), "Error saving settings.");
    }

    #[tokio::test]
    async fn storage_failures_surface_per_operation() {
        let page = OptionsPage::new(Arc::new(BrokenStorage), Arc::new(RecordingRuntime::default()));
        assert!(matches!(page.load_stats().await, Err(SurfaceError::Stats(_))));
        assert!(matches!(page.load_settings().await, Err(SurfaceError::LoadSettings(_))));
        assert!(matches!(
            page.save_settings("1", "red").await,
            Err(SurfaceError::SaveStorage(_))
        ));
        let err = page.clear_all(true).await.unwrap_err();
        assert_eq!(err.user_message(), "Error clearing data: storage backend error: io");
    }

    #[tokio::test]
    async fn clear_requires_confirmation() {
        let (page, storage, _) = page(mixed_store());
        assert_eq!(page.clear_all(false).await.unwrap(), ClearOutcome::Cancelled);
        assert_eq!(storage.len(), 4);
    }

    #[tokio::test]
    async fn clear_erases_everything_and_settings_revert() {
        let (page, storage, _) = page(mixed_store());
        let outcome = page.clear_all(true).await.unwrap();
        assert!(storage.is_empty());
        match outcome {
            ClearOutcome::Cleared {
                stats,
                settings,
                status,
            } => {
                assert_eq!(
                    stats,
                    Some(StorageStats {
                        link_count: 0,
                        bytes_in_use: 0
                    })
                );
                assert_eq!(settings, Settings::default());
                assert_eq!(status.text, "All data cleared successfully.");
            }
            ClearOutcome::Cancelled => panic!("expected clear"),
        }
    }
}
