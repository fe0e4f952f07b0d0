//! Ordered stylesheet slots.
//!
//! Slot 0 holds the user-agent sheet and slot 1 the quirks sheet (empty in
//! standards mode). Author sheets follow in the order their elements were
//! seen. A slot is `modified` while its data is not yet available; no
//! conversion may start while any slot is modified.

use core_types::FetchId;
use css::{Stylesheet, parse_stylesheet};
use html::NodeId;
use url::Url;

pub const UA_SLOT: usize = 0;
pub const QUIRKS_SLOT: usize = 1;

#[derive(Clone, Debug, PartialEq)]
pub enum SlotSource {
    UserAgent,
    Quirks,
    Link { url: Url, fetch: Option<FetchId> },
    Inline { node: NodeId },
}

#[derive(Clone, Debug)]
pub struct StylesheetSlot {
    pub source: SlotSource,
    pub sheet: Stylesheet,
    pub modified: bool,
    pub insecure: bool,
}

impl StylesheetSlot {
    fn ready(source: SlotSource, sheet: Stylesheet) -> Self {
        Self {
            source,
            sheet,
            modified: false,
            insecure: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StylesheetList {
    slots: Vec<StylesheetSlot>,
}

impl StylesheetList {
    pub fn new(ua_source: &str) -> Self {
        Self {
            slots: vec![
                StylesheetSlot::ready(SlotSource::UserAgent, parse_stylesheet(ua_source)),
                StylesheetSlot::ready(SlotSource::Quirks, Stylesheet::default()),
            ],
        }
    }

    pub fn enable_quirks(&mut self, quirks_source: &str) {
        if let Some(slot) = self.slots.get_mut(QUIRKS_SLOT) {
            slot.sheet = parse_stylesheet(quirks_source);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StylesheetSlot> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StylesheetSlot> {
        self.slots.iter()
    }

    pub fn any_modified(&self) -> bool {
        self.slots.iter().any(|s| s.modified)
    }

    pub fn saw_insecure(&self) -> bool {
        self.slots.iter().any(|s| s.insecure)
    }

    /// New slot for a `<link>` sheet; modified until the fetch settles.
    pub fn add_link(&mut self, url: Url, insecure: bool) -> usize {
        self.slots.push(StylesheetSlot {
            source: SlotSource::Link { url, fetch: None },
            sheet: Stylesheet::default(),
            modified: true,
            insecure,
        });
        self.slots.len() - 1
    }

    pub fn set_fetch(&mut self, index: usize, id: FetchId) {
        if let Some(StylesheetSlot {
            source: SlotSource::Link { fetch, .. },
            ..
        }) = self.slots.get_mut(index)
        {
            *fetch = Some(id);
        }
    }

    pub fn link_loaded(&mut self, index: usize, text: &str) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.sheet = parse_stylesheet(text);
            slot.modified = false;
            log::debug!(
                target: "content.fetch",
                "stylesheet slot {index}: {} rules",
                slot.sheet.rules.len()
            );
        }
    }

    /// A failed fetch leaves an empty sheet so conversion is not blocked.
    pub fn link_failed(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.sheet = Stylesheet::default();
            slot.modified = false;
        }
    }

    pub fn add_inline(&mut self, node: NodeId, text: &str) -> usize {
        self.slots.push(StylesheetSlot::ready(
            SlotSource::Inline { node },
            parse_stylesheet(text),
        ));
        self.slots.len() - 1
    }

    /// Re-parse the inline sheet owned by `node`. Returns false if `node`
    /// has no slot yet.
    pub fn update_inline(&mut self, node: NodeId, text: &str) -> bool {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.source == SlotSource::Inline { node });
        match slot {
            Some(slot) => {
                slot.sheet = parse_stylesheet(text);
                true
            }
            None => false,
        }
    }

    /// Drop author sheets, keeping the builtin slots.
    pub fn reset_author(&mut self) {
        self.slots.truncate(QUIRKS_SLOT + 1);
    }

    /// Sheets in slot order, for building a selection context.
    pub fn compiled(&self) -> Vec<Stylesheet> {
        self.slots.iter().map(|s| s.sheet.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::Dom;

    #[test]
    fn link_slot_blocks_until_settled() {
        let mut list = StylesheetList::new("p { display: block }");
        assert!(!list.any_modified());
        let url = Url::parse("http://x/a.css").unwrap();
        let slot = list.add_link(url, true);
        assert_eq!(slot, 2);
        assert!(list.any_modified());
        list.link_loaded(slot, "div { color: red }");
        assert!(!list.any_modified());
        assert_eq!(list.get(slot).unwrap().sheet.rules.len(), 1);
        assert!(list.saw_insecure());
    }

    #[test]
    fn failed_link_is_empty_and_clear() {
        let mut list = StylesheetList::new("");
        let slot = list.add_link(Url::parse("http://x/a.css").unwrap(), false);
        list.link_failed(slot);
        assert!(!list.any_modified());
        assert!(list.get(slot).unwrap().sheet.is_empty());
    }

    #[test]
    fn inline_sheets_reparse() {
        let mut dom = Dom::new();
        let style = dom.create_element("style");
        let mut list = StylesheetList::new("");
        list.add_inline(style, "p { color: red }");
        assert!(list.update_inline(style, "p { color: red } a { color: blue }"));
        assert_eq!(list.compiled()[2].rules.len(), 2);
        list.reset_author();
        assert_eq!(list.len(), 2);
        assert!(!list.update_inline(style, ""));
    }
}
