//! Mutation observer: reacts to elements entering or changing in the tree.
//!
//! Handlers are registered per mutation kind in [`OBSERVERS`] and
//! dispatched on the element's tag. Mutations are drained after every
//! parser call and every script run; a drain never nests.

use super::{HtmlDocument, Refresh};
use crate::fetch::{FetchPurpose, is_insecure_url};
use crate::head::{is_valid_base_target, rfc5988_link};
use crate::objects::{ObjectKind, ObjectState};
use crate::refresh::parse_refresh;
use bus::ContentEvent;
use core_types::{ContentStatus, ResourceKind};
use html::dom_utils::rel_contains;
use html::{Mutation, MutationKind, NodeId};

/// Elements the observer cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementTag {
    Link,
    Meta,
    Title,
    Base,
    Img,
    Style,
    Script,
    Textarea,
    Input,
    Other,
}

impl ElementTag {
    pub fn of(name: &str) -> Self {
        match name {
            "link" => ElementTag::Link,
            "meta" => ElementTag::Meta,
            "title" => ElementTag::Title,
            "base" => ElementTag::Base,
            "img" => ElementTag::Img,
            "style" => ElementTag::Style,
            "script" => ElementTag::Script,
            "textarea" => ElementTag::Textarea,
            "input" => ElementTag::Input,
            _ => ElementTag::Other,
        }
    }
}

type Handler = fn(&mut HtmlDocument, NodeId, ElementTag);

const OBSERVERS: [(MutationKind, Handler); 3] = [
    (MutationKind::NodeInserted, HtmlDocument::on_node_inserted),
    (
        MutationKind::NodeInsertedIntoDocument,
        HtmlDocument::on_inserted_into_document,
    ),
    (MutationKind::SubtreeModified, HtmlDocument::on_subtree_modified),
];

/// `media` absent, or naming a medium we render for.
fn media_applies(media: Option<&str>) -> bool {
    let Some(media) = media.map(str::trim).filter(|m| !m.is_empty()) else {
        return true;
    };
    media.split(',').any(|m| {
        let m = m.trim();
        m.eq_ignore_ascii_case("screen") || m.eq_ignore_ascii_case("all")
    })
}

fn is_css_type(ty: Option<&str>) -> bool {
    match ty.map(str::trim) {
        None | Some("") => true,
        Some(ty) => css::is_css(Some(ty)),
    }
}

impl HtmlDocument {
    /// Deliver every queued mutation to the observers.
    pub(crate) fn drain_mutations(&mut self) {
        if self.draining {
            return;
        }
        self.draining = true;
        let mut handled = 0usize;
        while let Some(mutation) = self.dom.take_mutation() {
            if self.status == ContentStatus::Error {
                self.dom.discard_mutations();
                break;
            }
            self.dispatch_mutation(mutation);
            handled += 1;
        }
        self.draining = false;
        if handled > 0 {
            if let Some(thread) = self.script_thread.as_mut() {
                thread.cleanup();
            }
        }
    }

    fn dispatch_mutation(&mut self, mutation: Mutation) {
        if mutation.kind == MutationKind::SubtreeModified && self.title.node() == Some(mutation.target) {
            if let Some(title) = self.title.refresh(&self.dom) {
                self.announce_title(title);
            }
        }
        let Some(tag) = self.dom.tag_name(mutation.target).map(ElementTag::of) else {
            return;
        };
        if mutation.kind == MutationKind::NodeInserted && self.ensure_script_thread() {
            if let Some(thread) = self.script_thread.as_mut() {
                thread.new_element(&self.dom, mutation.target);
            }
        }
        for (kind, handler) in OBSERVERS {
            if kind == mutation.kind {
                handler(self, mutation.target, tag);
            }
        }
    }

    fn on_node_inserted(&mut self, node: NodeId, tag: ElementTag) {
        match tag {
            ElementTag::Link => self.process_link(node),
            ElementTag::Meta => self.process_meta(node),
            ElementTag::Title => {
                if let Some(title) = self.title.latch(&self.dom, node) {
                    self.announce_title(title);
                }
            }
            ElementTag::Base => self.process_base(node),
            ElementTag::Img if self.config.foreground_images => self.speculative_image(node),
            ElementTag::Style => self.register_inline_style(node),
            ElementTag::Script => self.script_insertion_check(node),
            _ => {}
        }
    }

    fn on_inserted_into_document(&mut self, node: NodeId, tag: ElementTag) {
        if tag == ElementTag::Script {
            self.script_insertion_check(node);
        }
    }

    fn on_subtree_modified(&mut self, node: NodeId, tag: ElementTag) {
        match tag {
            ElementTag::Style => {
                let text = self.dom.text_content(node);
                self.stylesheets.update_inline(node, &text);
            }
            ElementTag::Textarea | ElementTag::Input => self.resync_gadget(node),
            _ => {}
        }
    }

    fn announce_title(&self, title: String) {
        log::debug!(target: "content.convert", "content {}: title {title:?}", self.id);
        self.broadcast(ContentEvent::Title {
            content_id: self.id,
            title,
        });
    }

    fn process_link(&mut self, node: NodeId) {
        let Some(element) = self.dom.element(node) else {
            return;
        };
        let rel = element.attr("rel").unwrap_or("");
        let wants_sheet = rel_contains(rel, "stylesheet")
            && !rel_contains(rel, "alternate")
            && is_css_type(element.attr("type"))
            && media_applies(element.attr("media"));
        let href = element
            .attr("href")
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string);
        let link = rfc5988_link(element, &self.base_url);

        if let Some(link) = link {
            if !self.links.contains(&link) {
                self.links.push(link.clone());
                self.broadcast(ContentEvent::Link {
                    content_id: self.id,
                    link,
                });
            }
        }

        if !wants_sheet {
            return;
        }
        let Some(href) = href else {
            return;
        };
        let url = match self.base_url.join(&href) {
            Ok(url) => url,
            Err(err) => {
                log::debug!(target: "content.css", "stylesheet href {href:?} unresolvable: {err}");
                return;
            }
        };
        let slot = self.stylesheets.add_link(url.clone(), is_insecure_url(&url));
        match self
            .fetches
            .start(url, ResourceKind::Css, FetchPurpose::Stylesheet { slot })
        {
            Some(id) => self.stylesheets.set_fetch(slot, id),
            None => self.stylesheets.link_failed(slot),
        }
    }

    /// Only the first valid refresh is acted upon.
    fn process_meta(&mut self, node: NodeId) {
        if self.refresh.is_some() {
            return;
        }
        let Some(element) = self.dom.element(node) else {
            return;
        };
        let is_refresh = element
            .attr("http-equiv")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"));
        if !is_refresh {
            return;
        }
        let Some(content) = element.attr("content") else {
            return;
        };
        let Some(directive) = parse_refresh(content) else {
            log::debug!(target: "content.convert", "ignoring refresh {content:?}");
            return;
        };
        let url = match directive.url.as_deref() {
            None => self.url.clone(),
            Some(raw) => match self.base_url.join(raw) {
                Ok(url) => url,
                Err(err) => {
                    log::debug!(target: "content.convert", "refresh url {raw:?} unresolvable: {err}");
                    return;
                }
            },
        };
        log::info!(
            target: "content.convert",
            "content {}: refresh to {url} in {}s",
            self.id,
            directive.delay_secs
        );
        self.broadcast(ContentEvent::Refresh {
            content_id: self.id,
            delay_secs: directive.delay_secs,
            url: url.to_string(),
        });
        self.refresh = Some(Refresh {
            delay_secs: directive.delay_secs,
            url,
        });
    }

    fn process_base(&mut self, node: NodeId) {
        let (href, target) = match self.dom.element(node) {
            Some(element) => (
                element.attr("href").map(str::trim).map(str::to_string),
                element.attr("target").map(str::to_string),
            ),
            None => return,
        };
        if let Some(href) = href.filter(|h| !h.is_empty()) {
            match self.url.join(&href) {
                Ok(url) => {
                    log::debug!(target: "content.convert", "content {}: base {url}", self.id);
                    self.base_url = url;
                }
                Err(err) => {
                    log::debug!(target: "content.convert", "base href {href:?} unresolvable: {err}")
                }
            }
        }
        if let Some(target) = target {
            if self.base_target.is_some() {
                return;
            }
            if is_valid_base_target(&target) {
                self.base_target = Some(target);
            } else {
                log::debug!(target: "content.convert", "ignoring base target {target:?}");
            }
        }
    }

    fn speculative_image(&mut self, node: NodeId) {
        let Some(src) = self
            .dom
            .attr(node, "src")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
        else {
            return;
        };
        if self.objects.has_entry_for(node) {
            return;
        }
        let Ok(url) = self.base_url.join(&src) else {
            log::debug!(target: "content.fetch", "img src {src:?} unresolvable");
            return;
        };
        let index = self.objects.add(node, url.clone(), ObjectKind::Image, true);
        let state = match self
            .fetches
            .start(url, ResourceKind::Image, FetchPurpose::Object { index })
        {
            Some(id) => ObjectState::Fetching(id),
            None => ObjectState::Failed,
        };
        self.objects.set_state(index, state);
    }

    fn register_inline_style(&mut self, node: NodeId) {
        let applies = self.dom.element(node).is_some_and(|element| {
            is_css_type(element.attr("type")) && media_applies(element.attr("media"))
        });
        if !applies {
            return;
        }
        let text = self.dom.text_content(node);
        self.stylesheets.add_inline(node, &text);
    }

    /// Pull a form control's value back into its gadget after a script edit.
    fn resync_gadget(&mut self, node: NodeId) {
        let Some(tree) = self.box_tree.as_mut() else {
            return;
        };
        let Some(index) = tree.gadgets().iter().position(|g| g.node == node) else {
            return;
        };
        let changed = tree
            .gadget_mut(index)
            .is_some_and(|gadget| gadget.sync_with_dom(&self.dom));
        if !changed {
            return;
        }
        if let Some(area) = tree.box_for_node(node).and_then(|id| tree.get(id)).map(|b| b.rect) {
            self.broadcast(ContentEvent::Redraw {
                content_id: self.id,
                area,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_lists() {
        assert!(media_applies(None));
        assert!(media_applies(Some("print, Screen")));
        assert!(!media_applies(Some("print")));
        assert!(is_css_type(Some("text/css")));
        assert!(!is_css_type(Some("text/less")));
    }
}
