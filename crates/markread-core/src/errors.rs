use crate::ids::TabId;

/// Failures reported by a [`Storage`](crate::storage::Storage) backend.
#[derive(Clone, Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded { needed: u64, quota: u64 },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Failures reported by host messaging and tab capabilities.
#[derive(Clone, Debug, thiserror::Error)]
pub enum HostError {
    /// No agent is listening in the target page. Expected, never surfaced.
    #[error("no receiver in tab {0}")]
    NoReceiver(TabId),

    #[error("tab not found: {0}")]
    TabNotFound(TabId),

    #[error("runtime channel disconnected")]
    Disconnected,

    #[error("host error: {0}")]
    Host(String),
}

impl HostError {
    /// Whether this failure just means nobody was there to answer.
    pub fn is_absent_receiver(&self) -> bool {
        matches!(self, Self::NoReceiver(_) | Self::TabNotFound(_))
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::NoReceiver(_) => "no_receiver",
            Self::TabNotFound(_) => "tab_not_found",
            Self::Disconnected => "disconnected",
            Self::Host(_) => "host",
        }
    }
}
