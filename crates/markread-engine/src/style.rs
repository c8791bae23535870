use markread_core::settings::DEFAULT_LINK_COLOR;

/// Id of the single stylesheet element the agent owns in each page.
pub const STYLE_ID: &str = "markread-dynamic-style";

/// Class applied to anchors that have been read.
pub const MARKER_CLASS: &str = "markread--visited";

/// Extra CSS applied only on pages whose address starts with `url_prefix`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteStyle {
    pub url_prefix: String,
    pub css: String,
}

/// CSS injected next to the marker rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleConfig {
    pub global_css: Option<String>,
    pub site_styles: Vec<SiteStyle>,
}

impl StyleConfig {
    /// Full stylesheet text for a page at `location`.
    pub fn stylesheet(&self, color: &str, location: &str) -> String {
        let mut parts = vec![marker_rule(color)];
        if let Some(global) = &self.global_css {
            parts.push(global.clone());
        }
        parts.extend(
            self.site_styles
                .iter()
                .filter(|s| location.starts_with(&s.url_prefix))
                .map(|s| s.css.clone()),
        );
        parts.join("\n")
    }
}

pub fn marker_rule(color: &str) -> String {
    format!("a.{MARKER_CLASS} {{ color: {} !important; }}", css_color(color))
}

/// `color` if it is safe to splice into a declaration, else the default color.
fn css_color(color: &str) -> &str {
    let color = color.trim();
    let safe = !color.is_empty()
        && color
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "#(),.% -".contains(c));
    if safe {
        color
    } else {
        DEFAULT_LINK_COLOR
    }
}
