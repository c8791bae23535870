pub mod clock;
pub mod errors;
pub mod host;
pub mod ids;
pub mod keys;
pub mod messages;
pub mod pattern;
pub mod settings;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{HostError, StorageError};
pub use host::{HistoryHost, RuntimeMessenger, Tab, TabHost};
pub use ids::TabId;
pub use messages::{Message, Response, Status};
pub use settings::{Settings, SettingsError};
pub use storage::{Storage, StorageMap};
