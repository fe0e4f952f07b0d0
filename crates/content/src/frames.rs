//! Frameset and iframe descriptions.
//!
//! Nested browsing contexts are created by the embedder; the document only
//! describes them.

use html::{Dom, NodeId};
use layout::BoxId;
use std::fmt::Write;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameDimension {
    Pixels(f32),
    Percent(f32),
    /// `n*` share of the remaining space.
    Relative(f32),
}

/// Parse a `rows`/`cols` list such as `"100,*,2*,20%"`. Missing or empty
/// lists mean one track taking everything.
pub fn parse_dimensions(list: Option<&str>) -> Vec<FrameDimension> {
    let dims: Vec<FrameDimension> = list
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            if let Some(n) = s.strip_suffix('*') {
                let n = n.trim();
                let factor = if n.is_empty() { Some(1.0) } else { n.parse().ok() };
                factor.map(FrameDimension::Relative)
            } else if let Some(n) = s.strip_suffix('%') {
                n.trim().parse().ok().map(FrameDimension::Percent)
            } else {
                s.trim_end_matches("px").parse().ok().map(FrameDimension::Pixels)
            }
        })
        .collect();
    if dims.is_empty() {
        vec![FrameDimension::Relative(1.0)]
    } else {
        dims
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scrolling {
    Auto,
    Yes,
    No,
}

fn scrolling_of(value: Option<&str>) -> Scrolling {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("yes") => Scrolling::Yes,
        Some("no") => Scrolling::No,
        _ => Scrolling::Auto,
    }
}

fn pixels(dom: &Dom, node: NodeId, name: &str) -> Option<u32> {
    dom.attr(node, name)?.trim().parse().ok()
}

fn border_of(dom: &Dom, node: NodeId) -> bool {
    !matches!(dom.attr(node, "frameborder").map(str::trim), Some("0") | Some("no"))
}

fn resolve(dom: &Dom, node: NodeId, base: &Url) -> Option<Url> {
    let src = dom.attr(node, "src")?.trim();
    if src.is_empty() {
        return None;
    }
    base.join(src).ok()
}

#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub node: NodeId,
    pub name: Option<String>,
    pub url: Option<Url>,
    pub margin_width: Option<u32>,
    pub margin_height: Option<u32>,
    pub scrolling: Scrolling,
    pub no_resize: bool,
    pub border: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FrameItem {
    Frame(Frame),
    Frameset(Frameset),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Frameset {
    pub node: NodeId,
    pub rows: Vec<FrameDimension>,
    pub cols: Vec<FrameDimension>,
    pub children: Vec<FrameItem>,
}

impl Frameset {
    fn from_element(dom: &Dom, node: NodeId, base: &Url) -> Self {
        let children = dom
            .children(node)
            .iter()
            .filter_map(|&child| match dom.tag_name(child) {
                Some("frameset") => Some(FrameItem::Frameset(Frameset::from_element(dom, child, base))),
                Some("frame") => Some(FrameItem::Frame(Frame {
                    node: child,
                    name: dom.attr(child, "name").map(str::to_string),
                    url: resolve(dom, child, base),
                    margin_width: pixels(dom, child, "marginwidth"),
                    margin_height: pixels(dom, child, "marginheight"),
                    scrolling: scrolling_of(dom.attr(child, "scrolling")),
                    no_resize: dom.attr(child, "noresize").is_some(),
                    border: border_of(dom, child),
                })),
                _ => None,
            })
            .collect();
        Self {
            node,
            rows: parse_dimensions(dom.attr(node, "rows")),
            cols: parse_dimensions(dom.attr(node, "cols")),
            children,
        }
    }

    pub fn frames(&self) -> Vec<&Frame> {
        let mut out = Vec::new();
        for child in &self.children {
            match child {
                FrameItem::Frame(f) => out.push(f),
                FrameItem::Frameset(fs) => out.extend(fs.frames()),
            }
        }
        out
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        let _ = writeln!(
            out,
            "{}FRAMESET rows={} cols={}",
            "  ".repeat(depth),
            self.rows.len(),
            self.cols.len()
        );
        for child in &self.children {
            match child {
                FrameItem::Frameset(fs) => fs.dump_into(out, depth + 1),
                FrameItem::Frame(f) => {
                    let _ = writeln!(
                        out,
                        "{}FRAME name={:?} url={}",
                        "  ".repeat(depth + 1),
                        f.name.as_deref().unwrap_or(""),
                        f.url.as_ref().map_or("-", Url::as_str)
                    );
                }
            }
        }
    }
}

/// The outermost `<frameset>` of the document, if it uses one instead of a
/// body.
pub fn build_frameset(dom: &Dom, base: &Url) -> Option<Frameset> {
    let root = dom.document_element()?;
    let node = dom
        .children(root)
        .iter()
        .copied()
        .find(|&c| dom.is_element_named(c, "frameset"))?;
    Some(Frameset::from_element(dom, node, base))
}

#[derive(Clone, Debug, PartialEq)]
pub struct Iframe {
    pub node: NodeId,
    pub box_id: BoxId,
    pub url: Url,
    pub name: Option<String>,
    pub scrolling: Scrolling,
    pub border: bool,
    pub margin_width: Option<u32>,
    pub margin_height: Option<u32>,
}

impl Iframe {
    pub fn new(dom: &Dom, node: NodeId, box_id: BoxId, url: Url) -> Self {
        Self {
            node,
            box_id,
            url,
            name: dom.attr(node, "name").map(str::to_string),
            scrolling: scrolling_of(dom.attr(node, "scrolling")),
            border: border_of(dom, node),
            margin_width: pixels(dom, node, "marginwidth"),
            margin_height: pixels(dom, node, "marginheight"),
        }
    }
}
