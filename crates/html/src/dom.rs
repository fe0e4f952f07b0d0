//! Arena DOM with generation-checked handles.
//!
//! Nodes live in slots; a `NodeId` carries the slot generation so a handle to
//! a removed node can never alias a node allocated later. Structural changes
//! queue `Mutation` records which the owner drains in insertion order.

use std::collections::VecDeque;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(self) -> u32 {
        self.index
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementData {
    /// ASCII-lowercased tag name.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Set on scripts created by the parser; they run via the parser path.
    pub parser_inserted: bool,
    /// A script element is started at most once.
    pub already_started: bool,
}

impl ElementData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
            parser_inserted: false,
            already_started: false,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document {
        doctype: Option<String>,
        quirks: bool,
    },
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    pub fn element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    NodeInserted,
    NodeInsertedIntoDocument,
    SubtreeModified,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mutation {
    pub kind: MutationKind,
    pub target: NodeId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomError {
    StaleNode(NodeId),
    NotAContainer(NodeId),
    HierarchyRequest { parent: NodeId, child: NodeId },
    NotAChild { parent: NodeId, child: NodeId },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::StaleNode(id) => write!(f, "stale node handle {id:?}"),
            DomError::NotAContainer(id) => write!(f, "node {id:?} cannot have children"),
            DomError::HierarchyRequest { parent, child } => {
                write!(f, "inserting {child:?} under {parent:?} would create a cycle")
            }
            DomError::NotAChild { parent, child } => {
                write!(f, "{child:?} is not a child of {parent:?}")
            }
        }
    }
}

impl std::error::Error for DomError {}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

pub struct Dom {
    slots: Vec<Slot>,
    free: Vec<u32>,
    document: NodeId,
    mutations: VecDeque<Mutation>,
}

impl Dom {
    pub fn new() -> Self {
        let mut dom = Self {
            slots: Vec::new(),
            free: Vec::new(),
            document: NodeId {
                index: 0,
                generation: 0,
            },
            mutations: VecDeque::new(),
        };
        dom.document = dom.alloc(NodeKind::Document {
            doctype: None,
            quirks: false,
        });
        dom
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .ok_or(DomError::StaleNode(id))?;
        if slot.generation != id.generation {
            return Err(DomError::StaleNode(id));
        }
        slot.node.as_mut().ok_or(DomError::StaleNode(id))
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // --- creation ---

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Element(ElementData::new(name)))
    }

    pub fn create_element_with(&mut self, data: ElementData) -> NodeId {
        self.alloc(NodeKind::Element(data))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Comment(text.to_string()))
    }

    // --- queries ---

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id)?.element()
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.get_mut(id).ok()?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    pub fn is_element_named(&self, id: NodeId, name: &str) -> bool {
        self.tag_name(id)
            .is_some_and(|n| n.eq_ignore_ascii_case(name))
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn doctype(&self) -> Option<&str> {
        match &self.get(self.document)?.kind {
            NodeKind::Document { doctype, .. } => doctype.as_deref(),
            _ => None,
        }
    }

    pub fn quirks(&self) -> bool {
        matches!(
            self.get(self.document).map(|n| &n.kind),
            Some(NodeKind::Document { quirks: true, .. })
        )
    }

    pub fn set_doctype(&mut self, name: String, quirks_mode: bool) {
        if let Ok(node) = self.get_mut(self.document) {
            if let NodeKind::Document { doctype, quirks } = &mut node.kind {
                *doctype = Some(name);
                *quirks = quirks_mode;
            }
        }
    }

    pub fn set_quirks(&mut self, quirks_mode: bool) {
        if let Ok(node) = self.get_mut(self.document) {
            if let NodeKind::Document { quirks, .. } = &mut node.kind {
                *quirks = quirks_mode;
            }
        }
    }

    /// First element child of the document.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.document)
            .iter()
            .copied()
            .find(|&c| self.get(c).is_some_and(Node::is_element))
    }

    fn html_child(&self, name: &str) -> Option<NodeId> {
        let html = self.document_element()?;
        self.children(html)
            .iter()
            .copied()
            .find(|&c| self.is_element_named(c, name))
    }

    pub fn head(&self) -> Option<NodeId> {
        self.html_child("head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.html_child("body")
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.parent(id);
        }
        false
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        self.is_live(id) && self.contains(self.document, id)
    }

    /// Pre-order list of `root` and its descendants.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.is_live(root) {
            return out;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for &child in self.children(id).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    pub fn elements_named(&self, root: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.is_element_named(id, name))
            .collect()
    }

    pub fn element_by_id(&self, id_value: &str) -> Option<NodeId> {
        self.descendants(self.document)
            .into_iter()
            .find(|&id| self.attr(id, "id") == Some(id_value))
    }

    /// Concatenated data of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(Node {
                kind: NodeKind::Text(text),
                ..
            }) = self.get(node)
            {
                out.push_str(text);
            }
        }
        out
    }

    // --- mutation ---

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let node = self.get_mut(id)?;
        let NodeKind::Element(data) = &mut node.kind else {
            return Err(DomError::NotAContainer(id));
        };
        if let Some(slot) = data
            .attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            slot.1 = value.to_string();
        } else {
            data.attributes
                .push((name.to_ascii_lowercase(), value.to_string()));
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_child(parent, child, None)
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> Result<(), DomError> {
        self.insert_child(parent, child, Some(before))
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), DomError> {
        let parent_node = self.get(parent).ok_or(DomError::StaleNode(parent))?;
        if matches!(parent_node.kind, NodeKind::Text(_) | NodeKind::Comment(_)) {
            return Err(DomError::NotAContainer(parent));
        }
        if !self.is_live(child) {
            return Err(DomError::StaleNode(child));
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(before) = before {
            if self.parent(before) != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: before,
                });
            }
        }

        self.detach(child)?;

        let position = before.and_then(|b| self.children(parent).iter().position(|&c| c == b));
        let parent_node = self.get_mut(parent)?;
        match position {
            Some(pos) => parent_node.children.insert(pos, child),
            None => parent_node.children.push(child),
        }
        self.get_mut(child)?.parent = Some(parent);

        self.queue(MutationKind::NodeInserted, child);
        if self.is_connected(parent) {
            for node in self.descendants(child) {
                self.queue(MutationKind::NodeInsertedIntoDocument, node);
            }
        }
        self.queue(MutationKind::SubtreeModified, parent);
        Ok(())
    }

    fn detach(&mut self, child: NodeId) -> Result<(), DomError> {
        let Some(old_parent) = self.parent(child) else {
            return Ok(());
        };
        self.get_mut(old_parent)?.children.retain(|&c| c != child);
        self.get_mut(child)?.parent = None;
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child)?;
        self.queue(MutationKind::SubtreeModified, parent);
        Ok(())
    }

    /// Detach `id` and release it and all of its descendants. Handles to the
    /// released nodes become stale.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<(), DomError> {
        if id == self.document {
            return Err(DomError::HierarchyRequest {
                parent: id,
                child: id,
            });
        }
        if !self.is_live(id) {
            return Err(DomError::StaleNode(id));
        }
        if let Some(parent) = self.parent(id) {
            self.remove_child(parent, id)?;
        }
        for node in self.descendants(id) {
            let slot = &mut self.slots[node.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node.index);
        }
        Ok(())
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        let old: Vec<NodeId> = self.children(id).to_vec();
        for child in old {
            self.remove_subtree(child)?;
        }
        if !text.is_empty() {
            let t = self.create_text(text);
            self.append_child(id, t)?;
        } else {
            self.queue(MutationKind::SubtreeModified, id);
        }
        Ok(())
    }

    /// Replace the data of a text node; the parent is reported modified.
    pub fn set_text_data(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        let node = self.get_mut(id)?;
        let NodeKind::Text(data) = &mut node.kind else {
            return Err(DomError::NotAContainer(id));
        };
        *data = text.to_string();
        let parent = node.parent;
        if let Some(parent) = parent {
            self.queue(MutationKind::SubtreeModified, parent);
        }
        Ok(())
    }

    /// Append to a text node without queueing a mutation; the parser uses
    /// this to merge adjacent character tokens.
    pub(crate) fn append_text_data(&mut self, id: NodeId, more: &str) -> Result<(), DomError> {
        match &mut self.get_mut(id)?.kind {
            NodeKind::Text(data) => {
                data.push_str(more);
                Ok(())
            }
            _ => Err(DomError::NotAContainer(id)),
        }
    }

    fn queue(&mut self, kind: MutationKind, target: NodeId) {
        log::trace!(target: "html.dom", "mutation {kind:?} {target:?}");
        self.mutations.push_back(Mutation { kind, target });
    }

    pub(crate) fn queue_subtree_modified(&mut self, target: NodeId) {
        self.queue(MutationKind::SubtreeModified, target);
    }

    pub fn take_mutation(&mut self) -> Option<Mutation> {
        self.mutations.pop_front()
    }

    pub fn has_pending_mutations(&self) -> bool {
        !self.mutations.is_empty()
    }

    pub fn discard_mutations(&mut self) {
        self.mutations.clear();
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::dom_utils::serialize(self, self.document))
    }
}
