//! Token-to-DOM construction.
//!
//! A small insertion-mode machine: implied `html`/`head`/`body`, head-only
//! elements routed to `head`, `p` closed by block starts, and end tags that
//! only pop when a matching element is open. Every insertion goes through
//! `Dom::append_child`, so the DOM mutation queue sees the document grow
//! exactly as the parser builds it.

use crate::dom::{Dom, DomError, ElementData, NodeId};
use crate::types::Token;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum InsertionMode {
    Initial,
    BeforeHtml,
    BeforeHead,
    InHead,
    AfterHead,
    InBody,
    InFrameset,
    AfterBody,
}

/// Outcome of feeding one token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BuildEvent {
    Continue,
    /// A parser-inserted script element has just been closed.
    ScriptEnd(NodeId),
}

fn is_head_element(name: &str) -> bool {
    matches!(
        name,
        "base" | "link" | "meta" | "title" | "style" | "script" | "noscript"
    )
}

fn closes_paragraph(name: &str) -> bool {
    matches!(
        name,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "dd"
            | "div"
            | "dl"
            | "dt"
            | "fieldset"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "ul"
    )
}

/// Extract `charset=...` from a `Content-Type` style value.
pub fn charset_from_content_type(value: &str) -> Option<String> {
    let lower = value.to_ascii_lowercase();
    let at = lower.find("charset")?;
    let rest = lower[at + "charset".len()..].trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let rest = rest.trim_start_matches(['"', '\'']);
    let end = rest
        .find(|c: char| c == ';' || c == '"' || c == '\'' || c.is_ascii_whitespace())
        .unwrap_or(rest.len());
    let label = &rest[..end];
    (!label.is_empty()).then(|| label.to_string())
}

#[derive(Debug)]
pub(crate) struct TreeBuilder {
    mode: InsertionMode,
    open: Vec<NodeId>,
    html: Option<NodeId>,
    head: Option<NodeId>,
    body: Option<NodeId>,
    charset_hint: Option<String>,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self {
            mode: InsertionMode::Initial,
            open: Vec::new(),
            html: None,
            head: None,
            body: None,
            charset_hint: None,
        }
    }

    /// Charset declared by a `<meta>` since the last call.
    pub(crate) fn take_charset_hint(&mut self) -> Option<String> {
        self.charset_hint.take()
    }

    fn current(&self, dom: &Dom) -> NodeId {
        self.open.last().copied().unwrap_or(dom.document())
    }

    pub(crate) fn process(&mut self, dom: &mut Dom, token: Token) -> Result<BuildEvent, DomError> {
        match token {
            Token::Doctype(doctype) => {
                if self.mode == InsertionMode::Initial {
                    let quirks = doctype
                        .split_ascii_whitespace()
                        .next()
                        .is_none_or(|name| !name.eq_ignore_ascii_case("html"));
                    dom.set_doctype(doctype, quirks);
                    self.mode = InsertionMode::BeforeHtml;
                }
            }
            Token::Comment(text) => {
                let parent = self.current(dom);
                let comment = dom.create_comment(&text);
                dom.append_child(parent, comment)?;
            }
            Token::Text(text) => self.text(dom, &text)?,
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let attributes = attributes
                    .into_iter()
                    .map(|(k, v)| (k, v.unwrap_or_default()))
                    .collect();
                self.start_tag(dom, name, attributes, self_closing)?;
            }
            Token::EndTag(name) => return self.end_tag(dom, &name),
        }
        Ok(BuildEvent::Continue)
    }

    fn no_doctype(&mut self, dom: &mut Dom) {
        if self.mode == InsertionMode::Initial {
            dom.set_quirks(true);
            self.mode = InsertionMode::BeforeHtml;
        }
    }

    fn ensure_html(&mut self, dom: &mut Dom) -> Result<NodeId, DomError> {
        self.no_doctype(dom);
        if let Some(html) = self.html {
            return Ok(html);
        }
        let html = dom.create_element("html");
        dom.append_child(dom.document(), html)?;
        self.open.clear();
        self.open.push(html);
        self.html = Some(html);
        self.mode = InsertionMode::BeforeHead;
        Ok(html)
    }

    fn ensure_head(&mut self, dom: &mut Dom) -> Result<NodeId, DomError> {
        let html = self.ensure_html(dom)?;
        if let Some(head) = self.head {
            return Ok(head);
        }
        let head = dom.create_element("head");
        match dom.children(html).first().copied() {
            Some(first) => dom.insert_before(html, head, first)?,
            None => dom.append_child(html, head)?,
        }
        self.head = Some(head);
        if self.mode < InsertionMode::InHead {
            self.open.push(head);
            self.mode = InsertionMode::InHead;
        }
        Ok(head)
    }

    fn close_head(&mut self) {
        if let Some(head) = self.head {
            if let Some(pos) = self.open.iter().position(|&n| n == head) {
                self.open.truncate(pos);
            }
        }
        if self.mode < InsertionMode::AfterHead {
            self.mode = InsertionMode::AfterHead;
        }
    }

    fn ensure_body(&mut self, dom: &mut Dom) -> Result<NodeId, DomError> {
        if let Some(body) = self.body {
            return Ok(body);
        }
        self.ensure_head(dom)?;
        self.close_head();
        let html = self.ensure_html(dom)?;
        let body = dom.create_element("body");
        dom.append_child(html, body)?;
        if let Some(pos) = self.open.iter().position(|&n| n == html) {
            self.open.truncate(pos + 1);
        }
        self.open.push(body);
        self.body = Some(body);
        self.mode = InsertionMode::InBody;
        Ok(body)
    }

    fn text(&mut self, dom: &mut Dom, text: &str) -> Result<(), DomError> {
        if text.is_empty() {
            return Ok(());
        }
        let blank = text.bytes().all(|b| b.is_ascii_whitespace());
        if self.mode < InsertionMode::InBody {
            let in_head_child = self
                .open
                .last()
                .is_some_and(|&n| Some(n) != self.head && Some(n) != self.html);
            if !in_head_child {
                if blank {
                    return Ok(());
                }
                self.ensure_body(dom)?;
            }
        } else if self.mode == InsertionMode::InFrameset {
            return Ok(());
        }
        let parent = self.current(dom);
        self.insert_text(dom, parent, text)
    }

    fn insert_text(&mut self, dom: &mut Dom, parent: NodeId, text: &str) -> Result<(), DomError> {
        if let Some(last) = dom.last_child(parent) {
            if matches!(dom.get(last).map(|n| &n.kind), Some(crate::dom::NodeKind::Text(_))) {
                dom.append_text_data(last, text)?;
                dom.queue_subtree_modified(parent);
                return Ok(());
            }
        }
        let node = dom.create_text(text);
        dom.append_child(parent, node)
    }

    fn insert_element(
        &mut self,
        dom: &mut Dom,
        parent: NodeId,
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    ) -> Result<NodeId, DomError> {
        let parser_inserted = name == "script";
        let meta = name == "meta";
        let element = dom.create_element_with(ElementData {
            name,
            attributes,
            parser_inserted,
            already_started: false,
        });
        if meta {
            self.note_meta_charset(dom, element);
        }
        dom.append_child(parent, element)?;
        if !self_closing {
            self.open.push(element);
        }
        Ok(element)
    }

    fn note_meta_charset(&mut self, dom: &Dom, meta: NodeId) {
        if let Some(charset) = dom.attr(meta, "charset") {
            let charset = charset.trim();
            if !charset.is_empty() {
                self.charset_hint = Some(charset.to_string());
            }
            return;
        }
        let is_content_type = dom
            .attr(meta, "http-equiv")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("content-type"));
        if is_content_type {
            if let Some(label) = dom.attr(meta, "content").and_then(charset_from_content_type) {
                self.charset_hint = Some(label);
            }
        }
    }

    fn start_tag(
        &mut self,
        dom: &mut Dom,
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    ) -> Result<(), DomError> {
        match name.as_str() {
            "html" => {
                if self.html.is_none() {
                    self.no_doctype(dom);
                    let html = dom.create_element_with(ElementData {
                        name,
                        attributes,
                        parser_inserted: false,
                        already_started: false,
                    });
                    dom.append_child(dom.document(), html)?;
                    self.open.push(html);
                    self.html = Some(html);
                    self.mode = InsertionMode::BeforeHead;
                }
                return Ok(());
            }
            "head" => {
                if self.mode <= InsertionMode::BeforeHead {
                    self.ensure_head(dom)?;
                }
                return Ok(());
            }
            "body" => {
                if self.body.is_none() && self.mode != InsertionMode::InFrameset {
                    let body = self.ensure_body(dom)?;
                    for (k, v) in &attributes {
                        dom.set_attr(body, k, v)?;
                    }
                }
                return Ok(());
            }
            "frameset" => {
                if self.mode == InsertionMode::InFrameset {
                    let parent = self.current(dom);
                    self.insert_element(dom, parent, name, attributes, self_closing)?;
                } else if self.body.is_none() && self.mode < InsertionMode::InBody {
                    self.ensure_head(dom)?;
                    self.close_head();
                    let html = self.ensure_html(dom)?;
                    self.insert_element(dom, html, name, attributes, self_closing)?;
                    self.mode = InsertionMode::InFrameset;
                }
                return Ok(());
            }
            _ => {}
        }

        if self.mode == InsertionMode::InFrameset {
            if matches!(name.as_str(), "frame" | "frameset" | "noframes") {
                let parent = self.current(dom);
                self.insert_element(dom, parent, name, attributes, self_closing)?;
            }
            return Ok(());
        }

        if self.mode < InsertionMode::InBody && is_head_element(&name) {
            let head = self.ensure_head(dom)?;
            let parent = if self.mode == InsertionMode::InHead {
                self.current(dom)
            } else {
                head
            };
            self.insert_element(dom, parent, name, attributes, self_closing)?;
            return Ok(());
        }

        self.ensure_body(dom)?;
        if self.mode == InsertionMode::AfterBody {
            self.mode = InsertionMode::InBody;
        }
        if closes_paragraph(&name) {
            self.close_open("p", dom);
        }
        if matches!(name.as_str(), "li" | "option") {
            self.close_open(&name, dom);
        }
        let parent = self.current(dom);
        self.insert_element(dom, parent, name, attributes, self_closing)?;
        Ok(())
    }

    /// Pop up to and including the nearest open `name` element, stopping at
    /// `body`.
    fn close_open(&mut self, name: &str, dom: &Dom) {
        for i in (0..self.open.len()).rev() {
            let node = self.open[i];
            if Some(node) == self.body {
                return;
            }
            if dom.is_element_named(node, name) {
                self.open.truncate(i);
                return;
            }
        }
    }

    fn end_tag(&mut self, dom: &mut Dom, name: &str) -> Result<BuildEvent, DomError> {
        match name {
            "head" => {
                if self.mode <= InsertionMode::InHead {
                    self.ensure_head(dom)?;
                    self.close_head();
                }
                return Ok(BuildEvent::Continue);
            }
            "body" | "html" => {
                if self.mode == InsertionMode::InBody {
                    self.mode = InsertionMode::AfterBody;
                }
                return Ok(BuildEvent::Continue);
            }
            _ => {}
        }

        let Some(pos) = self
            .open
            .iter()
            .rposition(|&n| dom.is_element_named(n, name))
        else {
            return Ok(BuildEvent::Continue);
        };
        let node = self.open[pos];
        if Some(node) == self.html || Some(node) == self.body {
            return Ok(BuildEvent::Continue);
        }
        self.open.truncate(pos);

        let parser_script = dom.element(node).is_some_and(|e| e.parser_inserted);
        if name == "script" && parser_script {
            return Ok(BuildEvent::ScriptEnd(node));
        }
        Ok(BuildEvent::Continue)
    }

    /// End of input: the document always ends up with `html`, `head` and
    /// (unless it is a frameset) `body`.
    pub(crate) fn finish(&mut self, dom: &mut Dom) -> Result<(), DomError> {
        self.ensure_head(dom)?;
        if self.mode != InsertionMode::InFrameset {
            self.ensure_body(dom)?;
        }
        self.open.clear();
        Ok(())
    }
}
