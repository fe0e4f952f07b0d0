//! Cooperative, cancellable DOM-to-box conversion.
//!
//! A `BoxBuilder` walks the DOM from the root element with an explicit work
//! stack, so the caller can run it a bounded number of nodes at a time and
//! drop or cancel it between steps. Nothing is called back: the owner polls
//! `step` and receives the finished tree as its return value.

use crate::box_tree::{
    BoxId, BoxKind, BoxTree, LayoutBox, ObjectRequest, ObjectRequestKind, ReplacedKind,
};
use crate::flow::layout_tree;
use crate::gadget::Gadget;
use crate::replaced::intrinsic_from_dom;
use crate::text::TextMeasurer;
use css::{ComputedStyle, Display, SelectionContext};
use html::dom_utils::squash_whitespace;
use html::{Dom, NodeId, NodeKind};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvertError {
    Cancelled,
    MissingRoot,
    /// A node queued for conversion was removed from the DOM mid-build.
    StaleNode(NodeId),
    /// `step` was called after the build had already returned its tree.
    AlreadyFinished,
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Cancelled => f.write_str("box conversion cancelled"),
            ConvertError::MissingRoot => f.write_str("no root element to convert"),
            ConvertError::StaleNode(id) => write!(f, "node {id:?} vanished during conversion"),
            ConvertError::AlreadyFinished => f.write_str("box conversion already finished"),
        }
    }
}

impl std::error::Error for ConvertError {}

#[derive(Debug)]
pub enum StepResult {
    /// Budget exhausted; call `step` again.
    Pending,
    Done(BoxTree),
}

#[derive(Clone, Debug)]
struct Link {
    href: String,
    target: Option<String>,
}

#[derive(Debug)]
struct Frame {
    node: NodeId,
    parent_box: BoxId,
    parent_style: ComputedStyle,
    link: Option<Link>,
}

#[derive(Debug, PartialEq, Eq)]
enum State {
    Running,
    Cancelled,
    Finished,
}

#[derive(Debug)]
pub struct BoxBuilder {
    state: State,
    stack: Vec<Frame>,
    tree: Option<BoxTree>,
    nodes_converted: usize,
}

impl BoxBuilder {
    /// Start converting the subtree at `root`, which must be a live element.
    pub fn new(dom: &Dom, root: NodeId, selection: &SelectionContext) -> Result<Self, ConvertError> {
        let Some(element) = dom.element(root) else {
            return Err(ConvertError::MissingRoot);
        };
        let style = selection.select(dom, root, None);
        let mut root_box = LayoutBox::new(BoxKind::Block, Some(root), style);
        root_box.element_id = element.attr("id").map(str::to_string);
        let tree = BoxTree::new(root_box);
        let root_box = tree.root();

        let stack = dom
            .children(root)
            .iter()
            .rev()
            .map(|&node| Frame {
                node,
                parent_box: root_box,
                parent_style: style,
                link: None,
            })
            .collect();
        log::debug!(target: "layout.convert", "box conversion started at {root:?}");
        Ok(Self {
            state: State::Running,
            stack,
            tree: Some(tree),
            nodes_converted: 1,
        })
    }

    /// Stop the build. Any later `step` reports `Cancelled` and the partial
    /// tree is released immediately.
    pub fn cancel(&mut self) {
        if self.state == State::Running {
            log::debug!(
                target: "layout.convert",
                "box conversion cancelled after {} nodes",
                self.nodes_converted
            );
            self.state = State::Cancelled;
            self.stack.clear();
            self.tree = None;
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    /// Convert at most `budget` nodes; once the DOM is exhausted, lay the
    /// tree out at `width` and return it.
    pub fn step(
        &mut self,
        dom: &Dom,
        selection: &SelectionContext,
        measurer: &dyn TextMeasurer,
        budget: usize,
    ) -> Result<StepResult, ConvertError> {
        match self.state {
            State::Cancelled => return Err(ConvertError::Cancelled),
            State::Finished => return Err(ConvertError::AlreadyFinished),
            State::Running => {}
        }
        let Some(tree) = self.tree.as_mut() else {
            return Err(ConvertError::AlreadyFinished);
        };

        for _ in 0..budget.max(1) {
            let Some(frame) = self.stack.pop() else {
                break;
            };
            if let Err(err) = convert_node(dom, selection, tree, frame, &mut self.stack) {
                self.state = State::Cancelled;
                self.stack.clear();
                self.tree = None;
                return Err(err);
            }
            self.nodes_converted += 1;
        }

        if !self.stack.is_empty() {
            return Ok(StepResult::Pending);
        }

        self.state = State::Finished;
        let mut tree = self.tree.take().ok_or(ConvertError::AlreadyFinished)?;
        layout_tree(&mut tree, selection.media().viewport_width, measurer);
        log::debug!(
            target: "layout.convert",
            "box conversion finished: {} nodes, {} boxes",
            self.nodes_converted,
            tree.len()
        );
        Ok(StepResult::Done(tree))
    }
}

fn is_form_control(name: &str) -> bool {
    matches!(name, "input" | "textarea" | "select" | "button")
}

fn convert_node(
    dom: &Dom,
    selection: &SelectionContext,
    tree: &mut BoxTree,
    frame: Frame,
    stack: &mut Vec<Frame>,
) -> Result<(), ConvertError> {
    let Some(node) = dom.get(frame.node) else {
        return Err(ConvertError::StaleNode(frame.node));
    };
    let element = match &node.kind {
        NodeKind::Text(text) => {
            let text = squash_whitespace(text);
            if !text.is_empty() && frame.parent_style.visible {
                let mut text_box =
                    LayoutBox::new(BoxKind::Text(text), Some(frame.node), frame.parent_style);
                if let Some(link) = &frame.link {
                    text_box.href = Some(link.href.clone());
                    text_box.target = link.target.clone();
                }
                tree.push(frame.parent_box, text_box);
            }
            return Ok(());
        }
        NodeKind::Element(element) => element,
        NodeKind::Comment(_) | NodeKind::Document { .. } => return Ok(()),
    };

    let name = element.name.as_str();
    if matches!(name, "frameset" | "frame" | "noframes") {
        return Ok(());
    }
    let style = selection.select(dom, frame.node, Some(&frame.parent_style));
    if style.display == Display::None {
        if name == "input" {
            // Hidden inputs still take part in form submission.
            if let Some(gadget) = Gadget::from_element(dom, frame.node) {
                tree.gadgets.push(gadget);
            }
        }
        return Ok(());
    }

    let mut request: Option<(String, ObjectRequestKind)> = None;
    let mut descend = true;
    let kind = match name {
        "img" => {
            descend = false;
            if let Some(src) = element.attr("src").map(str::trim).filter(|s| !s.is_empty()) {
                request = Some((src.to_string(), ObjectRequestKind::Image));
            }
            BoxKind::Replaced(ReplacedKind::Image)
        }
        "object" | "embed" => {
            let attr = if name == "object" { "data" } else { "src" };
            match element.attr(attr).map(str::trim).filter(|s| !s.is_empty()) {
                Some(url) => {
                    descend = false;
                    request = Some((url.to_string(), ObjectRequestKind::Object));
                    BoxKind::Replaced(ReplacedKind::Object)
                }
                // Without data the fallback content renders instead.
                None => BoxKind::Inline,
            }
        }
        "iframe" => {
            descend = false;
            if let Some(src) = element.attr("src").map(str::trim).filter(|s| !s.is_empty()) {
                request = Some((src.to_string(), ObjectRequestKind::Iframe));
            }
            BoxKind::Iframe
        }
        _ if is_form_control(name) => {
            descend = false;
            let Some(gadget) = Gadget::from_element(dom, frame.node) else {
                return Ok(());
            };
            let has_box = gadget.has_box();
            tree.gadgets.push(gadget);
            if !has_box {
                return Ok(());
            }
            BoxKind::Gadget(tree.gadgets.len() - 1)
        }
        _ => match style.display {
            Display::Block | Display::ListItem => BoxKind::Block,
            _ => BoxKind::Inline,
        },
    };

    let mut layout_box = LayoutBox::new(kind, Some(frame.node), style);
    layout_box.element_id = element.attr("id").map(str::to_string);
    layout_box.title = element.attr("title").map(str::to_string);
    if matches!(name, "img" | "object" | "input") {
        layout_box.usemap = element
            .attr("usemap")
            .map(|u| u.trim().trim_start_matches('#').to_string())
            .filter(|u| !u.is_empty());
    }
    if matches!(layout_box.kind, BoxKind::Replaced(_) | BoxKind::Iframe) {
        layout_box.intrinsic = intrinsic_from_dom(dom, frame.node);
    }
    if let Some(link) = &frame.link {
        layout_box.href = Some(link.href.clone());
        layout_box.target = link.target.clone();
    }
    let box_id = tree.push(frame.parent_box, layout_box);

    if let Some((url, kind)) = request {
        tree.objects.push(ObjectRequest {
            node: frame.node,
            box_id,
            url,
            kind,
        });
    }

    if descend {
        let link = match (name, element.attr("href")) {
            ("a", Some(href)) => Some(Link {
                href: href.trim().to_string(),
                target: element.attr("target").map(str::to_string),
            }),
            _ => frame.link,
        };
        for &child in dom.children(frame.node).iter().rev() {
            stack.push(Frame {
                node: child,
                parent_box: box_id,
                parent_style: style,
                link: link.clone(),
            });
        }
    }
    Ok(())
}

/// Convert in one go; convenience for callers that do not need to yield.
pub fn convert_all(
    dom: &Dom,
    root: NodeId,
    selection: &SelectionContext,
    measurer: &dyn TextMeasurer,
) -> Result<BoxTree, ConvertError> {
    let mut builder = BoxBuilder::new(dom, root, selection)?;
    loop {
        if let StepResult::Done(tree) = builder.step(dom, selection, measurer, usize::MAX)? {
            return Ok(tree);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::ApproxTextMeasurer;
    use css::{MediaContext, parse_stylesheet};
    use html::{BindingParams, parse_document};

    fn selection() -> SelectionContext {
        SelectionContext::new(
            vec![parse_stylesheet(css::UA_STYLESHEET)],
            MediaContext::default(),
        )
        .unwrap()
    }

    fn parse(src: &str) -> Dom {
        parse_document(src.as_bytes(), BindingParams::default()).unwrap()
    }

    #[test]
    fn budgeted_steps_reach_the_same_tree() {
        let dom = parse("<p>one <a href=/x>two</a></p><div><img src=a.png></div>");
        let root = dom.document_element().unwrap();
        let sel = selection();
        let whole = convert_all(&dom, root, &sel, &ApproxTextMeasurer).unwrap();

        let mut builder = BoxBuilder::new(&dom, root, &sel).unwrap();
        let mut steps = 0;
        let tree = loop {
            steps += 1;
            match builder.step(&dom, &sel, &ApproxTextMeasurer, 1).unwrap() {
                StepResult::Pending => continue,
                StepResult::Done(tree) => break tree,
            }
        };
        assert!(steps > 3);
        assert_eq!(tree.dump(), whole.dump());
        assert_eq!(tree.object_requests().len(), 1);
        assert_eq!(tree.object_requests()[0].url, "a.png");
    }

    #[test]
    fn cancelled_build_reports_cancelled() {
        let dom = parse("<p>a</p><p>b</p>");
        let sel = selection();
        let mut builder = BoxBuilder::new(&dom, dom.document_element().unwrap(), &sel).unwrap();
        assert!(matches!(
            builder.step(&dom, &sel, &ApproxTextMeasurer, 1),
            Ok(StepResult::Pending)
        ));
        builder.cancel();
        assert!(!builder.is_running());
        assert_eq!(
            builder.step(&dom, &sel, &ApproxTextMeasurer, 1).unwrap_err(),
            ConvertError::Cancelled
        );
    }

    #[test]
    fn removed_node_fails_the_build() {
        let mut dom = parse("<div id=a>x</div><div id=b>y</div>");
        let sel = selection();
        let root = dom.document_element().unwrap();
        let mut builder = BoxBuilder::new(&dom, root, &sel).unwrap();
        let b = dom.element_by_id("b").unwrap();
        dom.remove_subtree(b).unwrap();
        let mut result = builder.step(&dom, &sel, &ApproxTextMeasurer, 1);
        while let Ok(StepResult::Pending) = result {
            result = builder.step(&dom, &sel, &ApproxTextMeasurer, 1);
        }
        assert!(matches!(result, Err(ConvertError::StaleNode(_))));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dom = Dom::new();
        let err = BoxBuilder::new(&dom, dom.document(), &selection()).unwrap_err();
        assert_eq!(err, ConvertError::MissingRoot);
    }

    #[test]
    fn links_and_ids_are_recorded() {
        let dom = parse(r#"<p id=intro><a href="/next" target=main>go</a></p>"#);
        let sel = selection();
        let tree = convert_all(&dom, dom.document_element().unwrap(), &sel, &ApproxTextMeasurer)
            .unwrap();
        assert!(tree.box_for_element_id("intro").is_some());
        let text = tree
            .descendants(tree.root())
            .into_iter()
            .find(|&b| matches!(tree.get(b).map(|b| &b.kind), Some(BoxKind::Text(_))))
            .unwrap();
        let text = tree.get(text).unwrap();
        assert_eq!(text.href.as_deref(), Some("/next"));
        assert_eq!(text.target.as_deref(), Some("main"));
    }
}
