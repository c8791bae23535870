use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::HostError;
use crate::ids::TabId;
use crate::messages::{Message, Response};

/// An open page as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub url: String,
}

/// Host capability for enumerating pages and messaging their agents.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// Open tabs whose URL matches any of `patterns`.
    async fn query_tabs(&self, patterns: &[&str]) -> Result<Vec<Tab>, HostError>;

    /// Deliver `message` to the agent running in `tab`.
    ///
    /// Returns [`HostError::NoReceiver`] when no agent is listening there.
    async fn send_to_tab(&self, tab: TabId, message: Message) -> Result<Response, HostError>;
}

/// Host capability for sending a message to the coordinator.
#[async_trait]
pub trait RuntimeMessenger: Send + Sync {
    async fn send(&self, message: Message) -> Result<Response, HostError>;
}

/// Host browsing-history capability.
#[async_trait]
pub trait HistoryHost: Send + Sync {
    async fn add_url(&self, url: &Url) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_serde() {
        let tab = Tab {
            id: TabId(5),
            url: "https://example.com/".into(),
        };
        let json = serde_json::to_value(&tab).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["url"], "https://example.com/");
    }
}
