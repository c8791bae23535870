use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use markread_core::{Clock, HistoryHost, HostError, SystemClock};

/// One recorded history visit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Visit {
    pub url: String,
    pub visited_at: i64,
}

/// In-process browsing history.
pub struct MemoryHistory {
    visits: Mutex<Vec<Visit>>,
    clock: Box<dyn Clock>,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            visits: Mutex::new(Vec::new()),
            clock,
        }
    }

    pub fn visits(&self) -> Vec<Visit> {
        self.visits.lock().clone()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.visits.lock().iter().any(|v| v.url == url)
    }
}

#[async_trait]
impl HistoryHost for MemoryHistory {
    async fn add_url(&self, url: &Url) -> Result<(), HostError> {
        let visit = Visit {
            url: url.to_string(),
            visited_at: self.clock.now_ms(),
        };
        self.visits.lock().push(visit);
        Ok(())
    }
}
