//! Page document abstraction the agent operates on.

use std::collections::BTreeMap;

use scraper::{Html, Selector};
use url::Url;

/// An `a[href]` element as seen by the agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Anchor {
    /// Position among the page's anchors; stable for the document's lifetime.
    pub index: usize,
    /// Absolute URL the anchor points to, if it resolves.
    pub href: Option<String>,
}

/// The DOM operations the page agent needs.
pub trait Document: Send + Sync {
    /// Address of the page.
    fn location(&self) -> &str;

    fn anchors(&self) -> Vec<Anchor>;

    fn add_class(&mut self, anchor: usize, class: &str);

    fn has_class(&self, anchor: usize, class: &str) -> bool;

    /// Create the stylesheet element `id`, or replace its content if present.
    fn upsert_style(&mut self, id: &str, css: &str);

    fn style(&self, id: &str) -> Option<&str>;
}

#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("invalid page url {url}: {detail}")]
    InvalidLocation { url: String, detail: String },

    #[error("selector error: {0}")]
    Selector(String),
}

/// One anchor of an [`HtmlDocument`].
#[derive(Clone, Debug)]
pub struct AnchorNode {
    pub href_attr: String,
    pub href: Option<String>,
    pub text: String,
    pub classes: Vec<String>,
}

/// A [`Document`] built from static HTML.
///
/// Hrefs resolve against `<base href>` when present, otherwise the page URL.
#[derive(Clone, Debug)]
pub struct HtmlDocument {
    location: String,
    anchors: Vec<AnchorNode>,
    styles: BTreeMap<String, String>,
}

impl HtmlDocument {
    pub fn parse(html: &str, location: &str) -> Result<Self, DomError> {
        let page_url = Url::parse(location).map_err(|e| DomError::InvalidLocation {
            url: location.to_string(),
            detail: e.to_string(),
        })?;

        let doc = Html::parse_document(html);
        let base_sel = selector("base[href]")?;
        let anchor_sel = selector("a[href]")?;

        let base = doc
            .select(&base_sel)
            .next()
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| page_url.join(href).ok())
            .unwrap_or_else(|| page_url.clone());

        let anchors = doc
            .select(&anchor_sel)
            .map(|el| {
                let href_attr = el.value().attr("href").unwrap_or_default().to_string();
                AnchorNode {
                    href: base.join(href_attr.trim()).ok().map(String::from),
                    href_attr,
                    text: el.text().collect::<String>().trim().to_string(),
                    classes: el.value().classes().map(str::to_string).collect(),
                }
            })
            .collect();

        Ok(Self {
            location: page_url.to_string(),
            anchors,
            styles: BTreeMap::new(),
        })
    }

    pub fn anchor_nodes(&self) -> &[AnchorNode] {
        &self.anchors
    }

    /// Number of injected stylesheet elements.
    pub fn style_count(&self) -> usize {
        self.styles.len()
    }
}

fn selector(css: &str) -> Result<Selector, DomError> {
    Selector::parse(css).map_err(|e| DomError::Selector(e.to_string()))
}

impl Document for HtmlDocument {
    fn location(&self) -> &str {
        &self.location
    }

    fn anchors(&self) -> Vec<Anchor> {
        self.anchors
            .iter()
            .enumerate()
            .map(|(index, node)| Anchor {
                index,
                href: node.href.clone(),
            })
            .collect()
    }

    fn add_class(&mut self, anchor: usize, class: &str) {
        if let Some(node) = self.anchors.get_mut(anchor) {
            if !node.classes.iter().any(|c| c == class) {
                node.classes.push(class.to_string());
            }
        }
    }

    fn has_class(&self, anchor: usize, class: &str) -> bool {
        self.anchors
            .get(anchor)
            .is_some_and(|node| node.classes.iter().any(|c| c == class))
    }

    fn upsert_style(&mut self, id: &str, css: &str) {
        self.styles.insert(id.to_string(), css.to_string());
    }

    fn style(&self, id: &str) -> Option<&str> {
        self.styles.get(id).map(String::as_str)
    }
}
