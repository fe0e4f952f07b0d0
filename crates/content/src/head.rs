//! Head metadata: base target validation, rfc5988 links, the title latch.

use bus::Rfc5988Link;
use html::dom_utils::squash_whitespace;
use html::{Dom, ElementData, NodeId};
use url::Url;

/// Browsing-context keywords a base target may use; any other name
/// starting with `_` is rejected.
const RESERVED_TARGETS: [&str; 4] = ["_blank", "_self", "_parent", "_top"];

pub fn is_valid_base_target(target: &str) -> bool {
    if target.is_empty() {
        return false;
    }
    if target.starts_with('_') {
        return RESERVED_TARGETS
            .iter()
            .any(|r| r.eq_ignore_ascii_case(target));
    }
    true
}

fn non_empty(element: &ElementData, name: &str) -> Option<String> {
    element
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `<link rel href>` as an rfc5988 link, with `href` resolved against
/// `base`. Anything missing or unresolvable is dropped.
pub fn rfc5988_link(element: &ElementData, base: &Url) -> Option<Rfc5988Link> {
    let rel = non_empty(element, "rel")?;
    let href = non_empty(element, "href")?;
    let href = base.join(&href).ok()?;
    Some(Rfc5988Link {
        rel: squash_whitespace(&rel).to_ascii_lowercase(),
        href: href.to_string(),
        hreflang: non_empty(element, "hreflang"),
        link_type: non_empty(element, "type"),
        media: non_empty(element, "media"),
        sizes: non_empty(element, "sizes"),
    })
}

/// The first `<title>` element wins; its text follows later edits to that
/// element only.
#[derive(Clone, Debug, Default)]
pub struct TitleLatch {
    node: Option<NodeId>,
    text: Option<String>,
}

impl TitleLatch {
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Latch `node` unless a title is already held. Returns the new text if
    /// it is worth announcing.
    pub fn latch(&mut self, dom: &Dom, node: NodeId) -> Option<String> {
        if self.node.is_some() {
            return None;
        }
        self.node = Some(node);
        self.refresh(dom)
    }

    /// Re-read the latched element's text. Returns it if it changed and is
    /// not empty.
    pub fn refresh(&mut self, dom: &Dom) -> Option<String> {
        let node = self.node?;
        let text = squash_whitespace(&dom.text_content(node));
        if self.text.as_deref() == Some(text.as_str()) {
            return None;
        }
        self.text = Some(text.clone());
        (!text.is_empty()).then_some(text)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_targets() {
        assert!(is_valid_base_target("frame1"));
        assert!(is_valid_base_target("_blank"));
        assert!(is_valid_base_target("_TOP"));
        assert!(!is_valid_base_target("_new"));
        assert!(!is_valid_base_target(""));
    }

    #[test]
    fn link_requires_rel_and_href() {
        let base = Url::parse("http://x/dir/page.html").unwrap();
        let mut element = ElementData::new("link");
        element.attributes.push(("rel".into(), "Icon".into()));
        assert!(rfc5988_link(&element, &base).is_none());
        element.attributes.push(("href".into(), "fav.ico".into()));
        element.attributes.push(("sizes".into(), "16x16".into()));
        let link = rfc5988_link(&element, &base).unwrap();
        assert_eq!(link.rel, "icon");
        assert_eq!(link.href, "http://x/dir/fav.ico");
        assert_eq!(link.sizes.as_deref(), Some("16x16"));
    }

    #[test]
    fn title_latches_first_element() {
        let mut dom = Dom::new();
        let first = dom.create_element("title");
        let second = dom.create_element("title");
        let text = dom.create_text(" Hello \n world ");
        dom.append_child(dom.document(), first).unwrap();
        dom.append_child(first, text).unwrap();
        let mut latch = TitleLatch::default();
        assert_eq!(latch.latch(&dom, first).as_deref(), Some("Hello world"));
        assert_eq!(latch.latch(&dom, second), None);
        assert_eq!(latch.node(), Some(first));

        dom.set_text_data(text, "Changed").unwrap();
        assert_eq!(latch.refresh(&dom).as_deref(), Some("Changed"));
        assert_eq!(latch.refresh(&dom), None);
        assert_eq!(latch.text(), Some("Changed"));
    }
}
