use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use markread_core::pattern::matches_any;
use markread_core::{HostError, Message, Response, Tab, TabHost, TabId};

use crate::dom::Document;
use crate::page_agent::PageAgent;

pub type SharedAgent<D> = Arc<Mutex<PageAgent<D>>>;

struct TabSlot<D: Document> {
    url: String,
    agent: Option<SharedAgent<D>>,
}

/// In-process [`TabHost`]: a set of open pages, each optionally running an agent.
pub struct LocalTabs<D: Document> {
    tabs: RwLock<BTreeMap<TabId, TabSlot<D>>>,
    next_id: AtomicI64,
}

impl<D: Document> Default for LocalTabs<D> {
    fn default() -> Self {
        Self {
            tabs: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl<D: Document> LocalTabs<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a page. `agent` is `None` for pages where no agent could be injected.
    pub fn open(&self, url: impl Into<String>, agent: Option<PageAgent<D>>) -> Tab {
        let id = TabId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let url = url.into();
        self.tabs.write().insert(
            id,
            TabSlot {
                url: url.clone(),
                agent: agent.map(|a| Arc::new(Mutex::new(a))),
            },
        );
        Tab { id, url }
    }

    pub fn close(&self, id: TabId) -> bool {
        self.tabs.write().remove(&id).is_some()
    }

    pub fn agent(&self, id: TabId) -> Option<SharedAgent<D>> {
        self.tabs.read().get(&id).and_then(|slot| slot.agent.clone())
    }

    pub fn len(&self) -> usize {
        self.tabs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.read().is_empty()
    }
}

#[async_trait]
impl<D: Document + 'static> TabHost for LocalTabs<D> {
    async fn query_tabs(&self, patterns: &[&str]) -> Result<Vec<Tab>, HostError> {
        Ok(self
            .tabs
            .read()
            .iter()
            .filter(|(_, slot)| matches_any(patterns, &slot.url))
            .map(|(id, slot)| Tab {
                id: *id,
                url: slot.url.clone(),
            })
            .collect())
    }

    async fn send_to_tab(&self, tab: TabId, message: Message) -> Result<Response, HostError> {
        let agent = {
            let tabs = self.tabs.read();
            let slot = tabs.get(&tab).ok_or(HostError::TabNotFound(tab))?;
            slot.agent.clone().ok_or(HostError::NoReceiver(tab))?
        };
        let mut agent = agent.lock().await;
        Ok(agent.handle_message(message).await)
    }
}
