use super::{HtmlDocument, Refresh};
use crate::error::ContentError;
use crate::forms::Form;
use crate::frames::{Frameset, Iframe};
use crate::objects::ObjectList;
use crate::scripts::ScriptList;
use crate::stylesheets::StylesheetList;
use bus::Rfc5988Link;
use core_types::{ContentStatus, EncodingSource};
use html::Dom;
use layout::{BoxTree, ContextualContent, ImageMaps, contextual_content};
use std::fmt::Write;
use url::Url;

impl HtmlDocument {
    pub fn status(&self) -> ContentStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&ContentError> {
        self.last_error.as_ref()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn document(&self) -> &Dom {
        &self.dom
    }

    /// Available once conversion has produced it.
    pub fn box_tree(&self) -> Option<&BoxTree> {
        self.box_tree.as_ref()
    }

    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    pub fn encoding_source(&self) -> EncodingSource {
        self.encoding_source
    }

    pub fn quirks(&self) -> bool {
        self.dom.quirks()
    }

    pub fn frameset(&self) -> Option<&Frameset> {
        self.frameset.as_ref()
    }

    pub fn iframes(&self) -> &[Iframe] {
        &self.iframes
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn base_target(&self) -> Option<&str> {
        self.base_target.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.text().filter(|t| !t.is_empty())
    }

    pub fn refresh(&self) -> Option<&Refresh> {
        self.refresh.as_ref()
    }

    pub fn links(&self) -> &[Rfc5988Link] {
        &self.links
    }

    pub fn forms(&self) -> &[Form] {
        &self.forms
    }

    pub fn imagemaps(&self) -> Option<&ImageMaps> {
        self.imagemaps.as_ref()
    }

    pub fn stylesheets(&self) -> &StylesheetList {
        &self.stylesheets
    }

    pub fn scripts(&self) -> &ScriptList {
        &self.scripts
    }

    pub fn objects(&self) -> &ObjectList {
        &self.objects
    }

    pub fn active_fetches(&self) -> usize {
        self.fetches.active()
    }

    /// Canvas extent of the laid-out document; zero before conversion.
    pub fn width(&self) -> f32 {
        self.box_tree.as_ref().map_or(0.0, BoxTree::width)
    }

    pub fn height(&self) -> f32 {
        self.box_tree.as_ref().map_or(0.0, BoxTree::height)
    }

    /// Top-left of the box generated by the element with `id`.
    pub fn id_offset(&self, id: &str) -> Option<(f32, f32)> {
        self.box_tree.as_ref()?.id_offset(id)
    }

    /// What sits under `(x, y)`: link, object, form control, title. Link
    /// URLs come back resolved against the base URL.
    pub fn contextual_content(&self, x: f32, y: f32) -> ContextualContent {
        let Some(tree) = self.box_tree.as_ref() else {
            return ContextualContent::default();
        };
        let mut found = contextual_content(tree, self.imagemaps.as_ref(), x, y);
        if let Some(raw) = found.link_url.take() {
            found.link_url = Some(match self.base_url.join(&raw) {
                Ok(url) => url.to_string(),
                Err(_) => raw,
            });
        }
        found
    }

    /// Whether any stylesheet, script or embedded object came over an
    /// insecure scheme.
    pub fn saw_insecure_objects(&self) -> bool {
        self.objects.saw_insecure() || self.stylesheets.saw_insecure() || self.scripts.saw_insecure()
    }

    /// Box tree and frameset dump for debugging.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        match self.box_tree.as_ref() {
            Some(tree) => out.push_str(&tree.dump()),
            None => out.push_str("(no box tree)\n"),
        }
        if let Some(frameset) = self.frameset.as_ref() {
            out.push_str(&frameset.dump());
        }
        for iframe in &self.iframes {
            let _ = writeln!(
                out,
                "IFRAME name={:?} url={}",
                iframe.name.as_deref().unwrap_or(""),
                iframe.url
            );
        }
        out
    }
}
