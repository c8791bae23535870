use serde::{Deserialize, Serialize};

/// Messages exchanged between the coordinator, page agents and the options page.
///
/// Wire format: `{"action": "saveUrls", "urls": [...]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    /// Page agent -> coordinator: persist these URLs as read.
    SaveUrls { urls: Vec<String> },
    /// Options page -> coordinator: run the retention sweep now.
    RunPruning,
    /// Options page -> coordinator: broadcast a new highlight color.
    UpdateColor { color: String },
    /// Coordinator -> page agent: mark every link on the page.
    MarkAllLinks,
    /// Coordinator -> page agent: report every link on the page.
    CollectAndSendLinks,
    /// Coordinator -> page agent: re-inject the stylesheet.
    UpdateStyle { color: String },
    /// Page agent -> coordinator: record these URLs in browsing history.
    AddLinksToHistory { urls: Vec<String> },
}

impl Message {
    /// The wire `action` name, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            Self::SaveUrls { .. } => "saveUrls",
            Self::RunPruning => "runPruning",
            Self::UpdateColor { .. } => "updateColor",
            Self::MarkAllLinks => "markAllLinks",
            Self::CollectAndSendLinks => "collectAndSendLinks",
            Self::UpdateStyle { .. } => "updateStyle",
            Self::AddLinksToHistory { .. } => "addLinksToHistory",
        }
    }
}

/// Status token carried by every response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    SaveComplete,
    PruningComplete,
    ColorUpdateBroadcasted,
    MarkingInitiated,
    CollectionInitiated,
    StyleUpdated,
    HistoryUpdated,
    /// Not handled by the receiver, or an empty payload.
    Ignored,
}

/// Reply to a [`Message`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempted: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropped: Option<usize>,
}

impl Response {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            removed: None,
            attempted: None,
            delivered: None,
            added: None,
            dropped: None,
        }
    }

    pub fn ignored() -> Self {
        Self::new(Status::Ignored)
    }

    pub fn with_removed(mut self, removed: usize) -> Self {
        self.removed = Some(removed);
        self
    }

    pub fn with_delivery(mut self, attempted: usize, delivered: usize) -> Self {
        self.attempted = Some(attempted);
        self.delivered = Some(delivered);
        self
    }

    pub fn with_history(mut self, added: usize, dropped: usize) -> Self {
        self.added = Some(added);
        self.dropped = Some(dropped);
        self
    }

    pub fn is_ignored(&self) -> bool {
        self.status == Status::Ignored
    }
}

impl From<Status> for Response {
    fn from(status: Status) -> Self {
        Self::new(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_wire_format() {
        let msg = Message::SaveUrls {
            urls: vec!["https://a.example/".into()],
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"action": "saveUrls", "urls": ["https://a.example/"]})
        );
        assert_eq!(
            serde_json::to_value(Message::RunPruning).unwrap(),
            json!({"action": "runPruning"})
        );
        assert_eq!(
            serde_json::to_value(Message::UpdateStyle { color: "red".into() }).unwrap(),
            json!({"action": "updateStyle", "color": "red"})
        );
    }

    #[test]
    fn parse_incoming_messages() {
        let msg: Message =
            serde_json::from_value(json!({"action": "markAllLinks"})).unwrap();
        assert_eq!(msg, Message::MarkAllLinks);

        let msg: Message = serde_json::from_value(
            json!({"action": "addLinksToHistory", "urls": ["a", "b"]}),
        )
        .unwrap();
        assert_eq!(msg.action(), "addLinksToHistory");
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let res: Result<Message, _> =
            serde_json::from_value(json!({"action": "saveUrls", "urls": "nope"}));
        assert!(res.is_err());
        let res: Result<Message, _> = serde_json::from_value(json!({"action": "launch"}));
        assert!(res.is_err());
    }

    #[test]
    fn action_names_match_wire_tags() {
        let all = [
            Message::SaveUrls { urls: vec![] },
            Message::RunPruning,
            Message::UpdateColor { color: String::new() },
            Message::MarkAllLinks,
            Message::CollectAndSendLinks,
            Message::UpdateStyle { color: String::new() },
            Message::AddLinksToHistory { urls: vec![] },
        ];
        for msg in all {
            let json = serde_json::to_value(&msg).unwrap();
            assert_eq!(json["action"], msg.action());
        }
    }

    #[test]
    fn response_omits_empty_details() {
        let json = serde_json::to_value(Response::new(Status::SaveComplete)).unwrap();
        assert_eq!(json, json!({"status": "save_complete"}));

        let json =
            serde_json::to_value(Response::new(Status::PruningComplete).with_removed(3)).unwrap();
        assert_eq!(json, json!({"status": "pruning_complete", "removed": 3}));
    }

    #[test]
    fn response_status_tokens() {
        let json = serde_json::to_value(Status::ColorUpdateBroadcasted).unwrap();
        assert_eq!(json, "color_update_broadcasted");
        let parsed: Response = serde_json::from_value(json!({"status": "style_updated"})).unwrap();
        assert_eq!(parsed.status, Status::StyleUpdated);
        assert!(Response::ignored().is_ignored());
    }
}
