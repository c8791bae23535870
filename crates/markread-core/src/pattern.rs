use glob::Pattern;
use url::Url;

/// Patterns selecting every page the extension may run on.
pub const WEB_PAGE_PATTERNS: [&str; 2] = ["http://*/*", "https://*/*"];

/// Host URL match pattern of the form `<scheme>://<host>/<path>`.
///
/// `*` as the scheme matches `http` and `https`; `*` as the host matches any
/// host and `*.example.com` matches the domain and its subdomains. The path
/// (including any query) is a glob.
#[derive(Clone, Debug)]
pub struct MatchPattern {
    scheme: SchemeMatch,
    host: HostMatch,
    path: Pattern,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum SchemeMatch {
    Web,
    Exact(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum HostMatch {
    Any,
    Domain(String),
    Exact(String),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("missing scheme separator in pattern: {0}")]
    MissingScheme(String),
    #[error("missing path in pattern: {0}")]
    MissingPath(String),
    #[error("invalid path glob in pattern {pattern}: {detail}")]
    InvalidPath { pattern: String, detail: String },
}

impl MatchPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let (scheme, rest) = pattern
            .split_once("://")
            .ok_or_else(|| PatternError::MissingScheme(pattern.to_string()))?;
        let slash = rest
            .find('/')
            .ok_or_else(|| PatternError::MissingPath(pattern.to_string()))?;
        let (host, path) = rest.split_at(slash);

        let scheme = match scheme {
            "*" => SchemeMatch::Web,
            other => SchemeMatch::Exact(other.to_ascii_lowercase()),
        };
        let host = match host {
            "*" => HostMatch::Any,
            h if h.starts_with("*.") => HostMatch::Domain(h[2..].to_ascii_lowercase()),
            h => HostMatch::Exact(h.to_ascii_lowercase()),
        };
        let path = Pattern::new(path).map_err(|e| PatternError::InvalidPath {
            pattern: pattern.to_string(),
            detail: e.to_string(),
        })?;

        Ok(Self { scheme, host, path })
    }

    pub fn matches(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        let scheme_ok = match &self.scheme {
            SchemeMatch::Web => matches!(parsed.scheme(), "http" | "https"),
            SchemeMatch::Exact(s) => parsed.scheme() == s,
        };
        if !scheme_ok {
            return false;
        }

        let host = parsed.host_str().unwrap_or("");
        let host_ok = match &self.host {
            HostMatch::Any => true,
            HostMatch::Exact(h) => host == h,
            HostMatch::Domain(d) => host == d || host.ends_with(&format!(".{d}")),
        };
        if !host_ok {
            return false;
        }

        let mut path = parsed.path().to_string();
        if let Some(query) = parsed.query() {
            path.push('?');
            path.push_str(query);
        }
        self.path.matches(&path)
    }
}

/// Whether `url` matches any of `patterns`. Unparseable patterns never match.
pub fn matches_any(patterns: &[&str], url: &str) -> bool {
    patterns
        .iter()
        .filter_map(|p| MatchPattern::parse(p).ok())
        .any(|p| p.matches(url))
}
