//! Link marking engine: the background coordinator, the per-page agent,
//! and the options surface, wired together over host capability traits.

pub mod coordinator;
pub mod dom;
pub mod error;
pub mod history;
pub mod options;
pub mod page_agent;
pub mod prune;
pub mod runtime;
pub mod style;
pub mod tabs;

pub use coordinator::{BroadcastReport, Coordinator, HistoryReport, TriggerMode, TriggerOutcome};
pub use dom::{Anchor, Document, DomError, HtmlDocument};
pub use error::{EngineError, SurfaceError};
pub use history::{MemoryHistory, Visit};
pub use options::{ClearOutcome, OptionsPage, SaveReport, StatusMessage, StorageStats};
pub use page_agent::PageAgent;
pub use prune::PruneOutcome;
pub use runtime::{runtime_channel, Envelope, RuntimeReceiver, RuntimeSender};
pub use style::{SiteStyle, StyleConfig, MARKER_CLASS, STYLE_ID};
pub use tabs::{LocalTabs, SharedAgent};
