//! Embedded objects (images and `<object>`/`<embed>` data).
//!
//! One entry per URL per element; speculative image fetches started at
//! parse time are adopted by the matching box after conversion instead of
//! being fetched twice.

use crate::fetch::is_insecure_url;
use core_types::FetchId;
use html::NodeId;
use layout::BoxId;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Image,
    Object,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectState {
    Unstarted,
    Fetching(FetchId),
    Done { bytes: usize },
    Failed,
    Aborted,
}

#[derive(Clone, Debug)]
pub struct ObjectEntry {
    pub node: NodeId,
    pub url: Url,
    pub kind: ObjectKind,
    pub box_id: Option<BoxId>,
    pub state: ObjectState,
    /// Started from `<img>` insertion, before any box existed.
    pub speculative: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ObjectList {
    entries: Vec<ObjectEntry>,
}

impl ObjectList {
    pub fn add(&mut self, node: NodeId, url: Url, kind: ObjectKind, speculative: bool) -> usize {
        self.entries.push(ObjectEntry {
            node,
            url,
            kind,
            box_id: None,
            state: ObjectState::Unstarted,
            speculative,
        });
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ObjectEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectEntry> {
        self.entries.iter()
    }

    /// A speculative entry for `node` and `url` not yet tied to a box.
    pub fn find_speculative(&self, node: NodeId, url: &Url) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.speculative && e.box_id.is_none() && e.node == node && &e.url == url)
    }

    pub fn has_entry_for(&self, node: NodeId) -> bool {
        self.entries.iter().any(|e| e.node == node)
    }

    pub fn attach_box(&mut self, index: usize, box_id: BoxId) {
        if let Some(e) = self.entries.get_mut(index) {
            e.box_id = Some(box_id);
        }
    }

    pub fn set_state(&mut self, index: usize, state: ObjectState) {
        if let Some(e) = self.entries.get_mut(index) {
            e.state = state;
        }
    }

    /// Mark every unfinished entry aborted and return the fetches that must
    /// be cancelled.
    pub fn abort_all(&mut self) -> Vec<FetchId> {
        let mut fetches = Vec::new();
        for e in &mut self.entries {
            match e.state {
                ObjectState::Fetching(id) => {
                    fetches.push(id);
                    e.state = ObjectState::Aborted;
                }
                ObjectState::Unstarted => e.state = ObjectState::Aborted,
                _ => {}
            }
        }
        fetches
    }

    pub fn saw_insecure(&self) -> bool {
        self.entries.iter().any(|e| is_insecure_url(&e.url))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
