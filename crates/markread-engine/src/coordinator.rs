use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use url::Url;

use markread_core::keys::is_web_url;
use markread_core::pattern::WEB_PAGE_PATTERNS;
use markread_core::{
    Clock, HistoryHost, Message, Response, Settings, Status, Storage, StorageError, StorageMap,
    SystemClock, Tab, TabHost,
};

use crate::error::EngineError;
use crate::prune::{select_expired, PruneOutcome};
use crate::runtime::RuntimeReceiver;

/// What the toolbar action asks the active page to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriggerMode {
    /// Mark every link in place and persist them as read.
    #[default]
    MarkInPlace,
    /// Collect every link and record it in browsing history.
    CollectToHistory,
}

impl TriggerMode {
    fn message(self) -> Message {
        match self {
            Self::MarkInPlace => Message::MarkAllLinks,
            Self::CollectToHistory => Message::CollectAndSendLinks,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Page is not `http`/`https`.
    Ignored,
    Sent(Response),
    /// No agent answered in the page.
    AgentUnavailable,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub delivered: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HistoryReport {
    pub added: usize,
    pub dropped: usize,
}

/// Background component: persists read links, prunes, and relays to pages.
pub struct Coordinator {
    storage: Arc<dyn Storage>,
    tabs: Arc<dyn TabHost>,
    history: Option<Arc<dyn HistoryHost>>,
    clock: Arc<dyn Clock>,
    mode: TriggerMode,
}

impl Coordinator {
    pub fn new(storage: Arc<dyn Storage>, tabs: Arc<dyn TabHost>) -> Self {
        Self {
            storage,
            tabs,
            history: None,
            clock: Arc::new(SystemClock),
            mode: TriggerMode::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_mode(mut self, mode: TriggerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_history(mut self, history: Arc<dyn HistoryHost>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    /// Toolbar action on `tab`.
    pub async fn on_action_clicked(&self, tab: &Tab) -> TriggerOutcome {
        if !is_web_url(&tab.url) {
            debug!(tab_id = %tab.id, url = %tab.url, "action ignored on non-web page");
            return TriggerOutcome::Ignored;
        }

        match self.tabs.send_to_tab(tab.id, self.mode.message()).await {
            Ok(resp) => TriggerOutcome::Sent(resp),
            Err(e) => {
                debug!(tab_id = %tab.id, kind = e.error_kind(), "no agent answered the action");
                TriggerOutcome::AgentUnavailable
            }
        }
    }

    /// Record every URL as read now. Existing records are overwritten.
    ///
    /// Returns the number of distinct URLs written; an empty input writes nothing.
    pub async fn save_urls(&self, urls: &[String]) -> Result<usize, StorageError> {
        if urls.is_empty() {
            return Ok(0);
        }
        let timestamp = self.clock.now_ms();
        let items: StorageMap = urls
            .iter()
            .map(|url| (url.clone(), serde_json::Value::from(timestamp)))
            .collect();
        let written = items.len();
        self.storage.set(items).await?;
        debug!(count = written, "saved read links");
        Ok(written)
    }

    /// Delete link records older than the retention window.
    pub async fn prune(&self) -> Result<PruneOutcome, StorageError> {
        let settings = Settings::load(self.storage.as_ref()).await?;
        let Some(cutoff) = settings.prune_cutoff(self.clock.now_ms()) else {
            info!(prune_after_days = settings.prune_after_days, "pruning is disabled");
            return Ok(PruneOutcome::Disabled);
        };

        let all = self.storage.get_all().await?;
        let expired = select_expired(&all, cutoff);
        if !expired.is_empty() {
            self.storage.remove(&expired).await?;
            info!(removed = expired.len(), cutoff, "pruned old links");
        }
        Ok(PruneOutcome::Swept {
            cutoff,
            removed: expired.len(),
        })
    }

    pub async fn on_startup(&self) {
        info!("running startup link pruning");
        self.prune_logged().await;
    }

    pub async fn on_installed(&self) {
        info!("running install/update link pruning");
        self.prune_logged().await;
    }

    async fn prune_logged(&self) {
        if let Err(e) = self.prune().await {
            error!(error = %e, "link pruning failed");
        }
    }

    /// Ask every open web page to restyle with `color`.
    ///
    /// Each page is attempted independently; pages without an agent are skipped.
    pub async fn broadcast_color(&self, color: &str) -> BroadcastReport {
        let tabs = match self.tabs.query_tabs(&WEB_PAGE_PATTERNS).await {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!(error = %e, "could not enumerate tabs for color update");
                return BroadcastReport::default();
            }
        };

        let attempts = tabs.iter().map(|tab| {
            let message = Message::UpdateStyle {
                color: color.to_string(),
            };
            async move {
                match self.tabs.send_to_tab(tab.id, message).await {
                    Ok(_) => true,
                    Err(e) => {
                        debug!(tab_id = %tab.id, kind = e.error_kind(), "color update not delivered");
                        false
                    }
                }
            }
        });
        let delivered = join_all(attempts).await.into_iter().filter(|ok| *ok).count();

        debug!(attempted = tabs.len(), delivered, "color update broadcast");
        BroadcastReport {
            attempted: tabs.len(),
            delivered,
        }
    }

    /// Record well-formed URLs in browsing history; malformed ones are dropped.
    ///
    /// `None` when no history capability is configured.
    pub async fn add_links_to_history(&self, urls: &[String]) -> Option<HistoryReport> {
        let history = self.history.as_ref()?;
        let mut report = HistoryReport::default();
        for raw in urls {
            let Ok(url) = Url::parse(raw) else {
                debug!(url = %raw, "dropping malformed url");
                report.dropped += 1;
                continue;
            };
            match history.add_url(&url).await {
                Ok(()) => report.added += 1,
                Err(e) => {
                    debug!(url = %raw, error = %e, "history rejected url");
                    report.dropped += 1;
                }
            }
        }
        Some(report)
    }

    /// Dispatch one runtime message.
    pub async fn handle_message(&self, message: Message) -> Result<Response, EngineError> {
        match message {
            Message::SaveUrls { urls } if urls.is_empty() => Ok(Response::ignored()),
            Message::SaveUrls { urls } => {
                self.save_urls(&urls).await?;
                Ok(Response::new(Status::SaveComplete))
            }
            Message::RunPruning => {
                info!("pruning triggered from options page");
                let outcome = self.prune().await?;
                Ok(Response::new(Status::PruningComplete).with_removed(outcome.removed()))
            }
            Message::UpdateColor { color } => {
                let report = self.broadcast_color(&color).await;
                Ok(Response::new(Status::ColorUpdateBroadcasted)
                    .with_delivery(report.attempted, report.delivered))
            }
            Message::AddLinksToHistory { urls } => Ok(match self.add_links_to_history(&urls).await {
                Some(report) => {
                    Response::new(Status::HistoryUpdated).with_history(report.added, report.dropped)
                }
                None => Response::ignored(),
            }),
            other => {
                debug!(action = other.action(), "coordinator ignoring message");
                Ok(Response::ignored())
            }
        }
    }

    /// Serve the runtime channel until every sender is dropped.
    ///
    /// Each message is handled on its own task.
    pub fn serve(self: Arc<Self>, mut rx: RuntimeReceiver) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let coordinator = Arc::clone(&self);
                tokio::spawn(async move {
                    let action = envelope.message.action();
                    let result = coordinator
                        .handle_message(envelope.message.clone())
                        .await
                        .map_err(|e| {
                            error!(action, error = %e, "runtime message failed");
                            e.into()
                        });
                    envelope.respond(result);
                });
            }
            debug!("runtime channel closed");
        })
    }
}
