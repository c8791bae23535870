//! Key layout of the shared store namespace.
//!
//! Link records and settings live side by side. A key is a link record iff it
//! starts with [`LINK_KEY_PREFIX`]; settings keys must never start with it.

/// Prefix that classifies a key as a read-link record.
pub const LINK_KEY_PREFIX: &str = "http";

/// Retention window in days.
pub const PRUNE_AFTER_DAYS_KEY: &str = "pruneAfterDays";

/// Highlight color for read links.
pub const LINK_COLOR_KEY: &str = "linkColor";

/// All settings keys, in display order.
pub const SETTINGS_KEYS: [&str; 2] = [PRUNE_AFTER_DAYS_KEY, LINK_COLOR_KEY];

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Whether `key` names a read-link record.
pub fn is_link_key(key: &str) -> bool {
    key.starts_with(LINK_KEY_PREFIX)
}

/// Whether `url` is an absolute `http`/`https` address.
///
/// Stricter than [`is_link_key`]: used when deciding which anchors or pages
/// the extension acts on, not when classifying stored keys.
pub fn is_web_url(url: &str) -> bool {
    starts_with_ignore_case(url, "http://") || starts_with_ignore_case(url, "https://")
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}
