use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, warn};

use markread_core::keys::is_web_url;
use markread_core::settings::DEFAULT_LINK_COLOR;
use markread_core::{Message, Response, RuntimeMessenger, Settings, Status, Storage, StorageError};

use crate::dom::Document;
use crate::style::{StyleConfig, MARKER_CLASS, STYLE_ID};

/// Agent living in one page: styles read links and reports links to the coordinator.
pub struct PageAgent<D: Document> {
    document: D,
    storage: Arc<dyn Storage>,
    runtime: Arc<dyn RuntimeMessenger>,
    styles: StyleConfig,
}

impl<D: Document> PageAgent<D> {
    pub fn new(document: D, storage: Arc<dyn Storage>, runtime: Arc<dyn RuntimeMessenger>) -> Self {
        Self {
            document,
            storage,
            runtime,
            styles: StyleConfig::default(),
        }
    }

    pub fn with_styles(mut self, styles: StyleConfig) -> Self {
        self.styles = styles;
        self
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Page-load entry point: inject the stylesheet, then mark stored links.
    ///
    /// Returns the number of anchors marked. Storage failures are logged and
    /// leave the page as it was.
    pub async fn initialize(&mut self) -> usize {
        let color = match Settings::load(self.storage.as_ref()).await {
            Ok(settings) => settings.link_color,
            Err(e) => {
                warn!(error = %e, "could not read highlight color, using default");
                DEFAULT_LINK_COLOR.to_string()
            }
        };
        self.inject_style(&color);

        match self.apply_stored_styles().await {
            Ok(marked) => marked,
            Err(e) => {
                error!(error = %e, location = self.document.location(), "error applying stored styles");
                0
            }
        }
    }

    /// Write (or rewrite) the agent's single stylesheet element.
    pub fn inject_style(&mut self, color: &str) {
        let css = self.styles.stylesheet(color, self.document.location());
        self.document.upsert_style(STYLE_ID, &css);
    }

    /// Mark anchors whose URL is already stored. One storage query per call.
    pub async fn apply_stored_styles(&mut self) -> Result<usize, StorageError> {
        let anchors = self.document.anchors();
        let unique = dedupe(anchors.iter().filter_map(|a| web_href(a.href.as_deref())));
        if unique.is_empty() {
            return Ok(0);
        }

        let stored = self.storage.get(&unique).await?;
        if stored.is_empty() {
            return Ok(0);
        }

        let mut marked = 0;
        for anchor in &anchors {
            if anchor.href.as_ref().is_some_and(|h| stored.contains_key(h)) {
                self.document.add_class(anchor.index, MARKER_CLASS);
                marked += 1;
            }
        }
        debug!(marked, location = self.document.location(), "applied stored styles");
        Ok(marked)
    }

    /// Mark every web link on the page and ask the coordinator to persist them.
    ///
    /// Returns the deduplicated URLs reported; nothing is sent when empty.
    pub async fn mark_all(&mut self) -> Vec<String> {
        let mut urls = Vec::new();
        for anchor in self.document.anchors() {
            if let Some(href) = web_href(anchor.href.as_deref()) {
                self.document.add_class(anchor.index, MARKER_CLASS);
                urls.push(href);
            }
        }

        let unique = dedupe(urls);
        if !unique.is_empty() {
            self.report(Message::SaveUrls { urls: unique.clone() }).await;
        }
        unique
    }

    /// Report every web link on the page for history recording, without marking.
    ///
    /// Duplicates are kept; the coordinator validates each entry.
    pub async fn collect_and_report(&self) -> Vec<String> {
        let urls: Vec<String> = self
            .document
            .anchors()
            .into_iter()
            .filter_map(|a| web_href(a.href.as_deref()))
            .collect();

        if !urls.is_empty() {
            self.report(Message::AddLinksToHistory { urls: urls.clone() }).await;
        }
        urls
    }

    pub async fn handle_message(&mut self, message: Message) -> Response {
        match message {
            Message::MarkAllLinks => {
                self.mark_all().await;
                Response::new(Status::MarkingInitiated)
            }
            Message::CollectAndSendLinks => {
                self.collect_and_report().await;
                Response::new(Status::CollectionInitiated)
            }
            Message::UpdateStyle { color } => {
                self.inject_style(&color);
                Response::new(Status::StyleUpdated)
            }
            other => {
                debug!(action = other.action(), "page agent ignoring message");
                Response::ignored()
            }
        }
    }

    async fn report(&self, message: Message) {
        let action = message.action();
        if let Err(e) = self.runtime.send(message).await {
            warn!(action, error = %e, "failed to report links to coordinator");
        }
    }
}

fn web_href(href: Option<&str>) -> Option<String> {
    href.filter(|h| is_web_url(h)).map(str::to_string)
}

/// Drop repeats, keeping first-seen order.
fn dedupe(urls: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}
