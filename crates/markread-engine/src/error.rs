use markread_core::{HostError, SettingsError, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("host error: {0}")]
    Host(#[from] HostError),
}

impl From<EngineError> for HostError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Host(host) => host,
            EngineError::Storage(storage) => HostError::Host(storage.to_string()),
        }
    }
}

/// Failures of options-page operations. Each maps to the status text the user sees.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("invalid settings: {0}")]
    Validation(#[from] SettingsError),

    #[error("saving settings failed: {0}")]
    SaveStorage(StorageError),

    #[error("notifying the coordinator failed: {0}")]
    SaveMessaging(HostError),

    #[error("loading statistics failed: {0}")]
    Stats(StorageError),

    #[error("loading settings failed: {0}")]
    LoadSettings(StorageError),

    #[error("clearing data failed: {0}")]
    Clear(StorageError),
}

impl SurfaceError {
    /// Text for the options page status region.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(SettingsError::InvalidDays(_)) => {
                "Please enter a valid number of days (0 or more).".to_string()
            }
            Self::Validation(SettingsError::EmptyColor) => {
                "Please choose a highlight color.".to_string()
            }
            Self::SaveStorage(_) | Self::SaveMessaging(_) => "Error saving settings.".to_string(),
            Self::Stats(_) => "Could not load statistics.".to_string(),
            Self::LoadSettings(_) => "Error loading settings.".to_string(),
            Self::Clear(e) => format!("Error clearing data: {e}"),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_maps_to_host_error() {
        let host: HostError = EngineError::Storage(StorageError::Backend("disk".into())).into();
        assert!(matches!(host, HostError::Host(msg) if msg.contains("disk")));

        let host: HostError = EngineError::Host(HostError::Disconnected).into();
        assert!(matches!(host, HostError::Disconnected));
    }

    #[test]
    fn user_messages() {
        let e = SurfaceError::from(SettingsError::InvalidDays("x".into()));
        assert!(e.is_validation());
        assert_eq!(e.user_message(), "Please enter a valid number of days (0 or more).");

        let e = SurfaceError::SaveMessaging(HostError::Disconnected);
        assert_eq!(e.user_message(), "Error saving settings.");

        let e = SurfaceError::Clear(StorageError::Backend("locked".into()));
        assert_eq!(e.user_message(), "Error clearing data: storage backend error: locked");
    }
}
