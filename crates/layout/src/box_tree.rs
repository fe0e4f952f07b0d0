//! Box tree arena.
//!
//! Boxes reference their DOM node by handle and carry the computed style and
//! the link/object/gadget context the hit tester needs. Rectangles are in
//! document coordinates (CSS px, origin at the canvas top-left).

use crate::gadget::Gadget;
use crate::replaced::IntrinsicSize;
use core_types::Rect;
use css::ComputedStyle;
use html::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxId(pub(crate) u32);

impl BoxId {
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplacedKind {
    Image,
    Object,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BoxKind {
    Block,
    Inline,
    Text(String),
    Replaced(ReplacedKind),
    Iframe,
    /// Index into `BoxTree::gadgets`.
    Gadget(usize),
}

/// Embedded resource met during conversion; the document turns these into
/// fetches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectRequest {
    pub node: NodeId,
    pub box_id: BoxId,
    /// Raw (unresolved) URL from `src`/`data`.
    pub url: String,
    pub kind: ObjectRequestKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectRequestKind {
    Image,
    Object,
    Iframe,
}

#[derive(Clone, Debug)]
pub struct LayoutBox {
    pub kind: BoxKind,
    pub node: Option<NodeId>,
    pub style: ComputedStyle,
    pub rect: Rect,
    pub parent: Option<BoxId>,
    pub children: Vec<BoxId>,
    /// `href`/`target` of the nearest enclosing `<a>`.
    pub href: Option<String>,
    pub target: Option<String>,
    /// The element's `id` attribute.
    pub element_id: Option<String>,
    pub title: Option<String>,
    /// `usemap` name with the leading `#` stripped.
    pub usemap: Option<String>,
    /// Index into the document's object list, assigned after conversion.
    pub object: Option<usize>,
    /// Presentational size of replaced content.
    pub intrinsic: IntrinsicSize,
}

impl LayoutBox {
    pub(crate) fn new(kind: BoxKind, node: Option<NodeId>, style: ComputedStyle) -> Self {
        Self {
            kind,
            node,
            style,
            rect: Rect::default(),
            parent: None,
            children: Vec::new(),
            href: None,
            target: None,
            element_id: None,
            title: None,
            usemap: None,
            object: None,
            intrinsic: IntrinsicSize::default(),
        }
    }

    pub fn is_inline_level(&self) -> bool {
        !matches!(self.kind, BoxKind::Block)
    }
}

#[derive(Clone, Debug)]
pub struct BoxTree {
    boxes: Vec<LayoutBox>,
    root: BoxId,
    pub(crate) gadgets: Vec<Gadget>,
    pub(crate) objects: Vec<ObjectRequest>,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

impl BoxTree {
    pub(crate) fn new(root: LayoutBox) -> Self {
        Self {
            boxes: vec![root],
            root: BoxId(0),
            gadgets: Vec::new(),
            objects: Vec::new(),
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn root(&self) -> BoxId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn get(&self, id: BoxId) -> Option<&LayoutBox> {
        self.boxes.get(id.index())
    }

    pub fn get_mut(&mut self, id: BoxId) -> Option<&mut LayoutBox> {
        self.boxes.get_mut(id.index())
    }

    pub(crate) fn push(&mut self, parent: BoxId, mut layout_box: LayoutBox) -> BoxId {
        let id = BoxId(self.boxes.len() as u32);
        layout_box.parent = Some(parent);
        self.boxes.push(layout_box);
        if let Some(p) = self.boxes.get_mut(parent.index()) {
            p.children.push(id);
        }
        id
    }

    pub fn children(&self, id: BoxId) -> &[BoxId] {
        self.get(id).map(|b| b.children.as_slice()).unwrap_or(&[])
    }

    /// Pre-order walk.
    pub fn descendants(&self, root: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.get(id).is_none() {
                continue;
            }
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Content width and height after the last layout.
    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn gadgets(&self) -> &[Gadget] {
        &self.gadgets
    }

    pub fn gadget_mut(&mut self, index: usize) -> Option<&mut Gadget> {
        self.gadgets.get_mut(index)
    }

    pub fn object_requests(&self) -> &[ObjectRequest] {
        &self.objects
    }

    /// First box generated by `node`.
    pub fn box_for_node(&self, node: NodeId) -> Option<BoxId> {
        self.boxes
            .iter()
            .position(|b| b.node == Some(node))
            .map(|i| BoxId(i as u32))
    }

    /// First box whose element carries `id="..."`.
    pub fn box_for_element_id(&self, element_id: &str) -> Option<BoxId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&b| self.boxes[b.index()].element_id.as_deref() == Some(element_id))
    }

    /// Document coordinates of the element with `id="..."`.
    pub fn id_offset(&self, element_id: &str) -> Option<(f32, f32)> {
        let b = self.box_for_element_id(element_id)?;
        let rect = self.boxes[b.index()].rect;
        Some((rect.x, rect.y))
    }

    /// Text dump, one box per line, for debugging and tests.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(b) = self.get(id) else {
                continue;
            };
            out.push_str(&"  ".repeat(depth));
            match &b.kind {
                BoxKind::Block => out.push_str("BLOCK"),
                BoxKind::Inline => out.push_str("INLINE"),
                BoxKind::Text(text) => out.push_str(&format!("TEXT {text:?}")),
                BoxKind::Replaced(ReplacedKind::Image) => out.push_str("IMAGE"),
                BoxKind::Replaced(ReplacedKind::Object) => out.push_str("OBJECT"),
                BoxKind::Iframe => out.push_str("IFRAME"),
                BoxKind::Gadget(i) => out.push_str(&format!(
                    "GADGET {:?}",
                    self.gadgets.get(*i).map(|g| g.kind)
                )),
            }
            out.push_str(&format!(
                " ({}, {}) {}x{}",
                b.rect.x, b.rect.y, b.rect.width, b.rect.height
            ));
            if let Some(href) = &b.href {
                out.push_str(&format!(" href={href:?}"));
            }
            out.push('\n');
            for &child in b.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}
