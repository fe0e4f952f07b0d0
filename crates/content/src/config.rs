use core_types::ContentId;
use std::cell::Cell;
use std::rc::Rc;

/// Per-document options.
#[derive(Clone, Debug)]
pub struct ContentConfig {
    pub enable_scripting: bool,
    /// Start image fetches as soon as `<img>` is parsed.
    pub foreground_images: bool,
    /// Default font size in tenths of a point (128 = 12.8pt).
    pub font_size_tenths_pt: u32,
    /// Nodes converted per `pump` before yielding.
    pub max_build_steps: usize,
    /// Encoding assumed when nothing is declared or sniffed.
    pub fallback_charset: Option<String>,
    pub ua_stylesheet: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            enable_scripting: true,
            foreground_images: true,
            font_size_tenths_pt: 128,
            max_build_steps: 512,
            fallback_charset: None,
            ua_stylesheet: css::UA_STYLESHEET.to_string(),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ContentConfig {
    /// Defaults overlaid with `PAGELOAD_*` environment knobs.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply knob values from `lookup`; unparsable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("PAGELOAD_SCRIPTING").as_deref().and_then(parse_flag) {
            self.enable_scripting = v;
        }
        if let Some(v) = lookup("PAGELOAD_FOREGROUND_IMAGES")
            .as_deref()
            .and_then(parse_flag)
        {
            self.foreground_images = v;
        }
        if let Some(v) = lookup("PAGELOAD_FONT_SIZE").and_then(|v| v.trim().parse::<u32>().ok()) {
            if v > 0 {
                self.font_size_tenths_pt = v;
            }
        }
        self
    }
}

/// Process-wide state shared by every document: id allocation and debug
/// toggles. Created once at startup with [`ContentEnvironment::init`] and
/// torn down with [`ContentEnvironment::shutdown`] after the last document.
#[derive(Debug)]
pub struct ContentEnvironment {
    next_content_id: Cell<ContentId>,
    live_documents: Cell<usize>,
    dump_box_trees: Cell<bool>,
    shut_down: Cell<bool>,
}

impl ContentEnvironment {
    pub fn init() -> Rc<Self> {
        let dump = std::env::var("PAGELOAD_DUMP_BOXES")
            .ok()
            .as_deref()
            .and_then(parse_flag)
            .unwrap_or(false);
        log::debug!(target: "content.convert", "content environment initialised");
        Rc::new(Self {
            next_content_id: Cell::new(0),
            live_documents: Cell::new(0),
            dump_box_trees: Cell::new(dump),
            shut_down: Cell::new(false),
        })
    }

    /// Returns false if documents are still alive; they keep working but
    /// no new ones should be created.
    pub fn shutdown(&self) -> bool {
        self.shut_down.set(true);
        let live = self.live_documents.get();
        if live > 0 {
            log::warn!(target: "content.convert", "shutdown with {live} documents alive");
            return false;
        }
        log::debug!(target: "content.convert", "content environment shut down");
        true
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.get()
    }

    pub fn live_documents(&self) -> usize {
        self.live_documents.get()
    }

    pub fn dump_box_trees(&self) -> bool {
        self.dump_box_trees.get()
    }

    pub fn set_dump_box_trees(&self, on: bool) {
        self.dump_box_trees.set(on);
    }

    pub(crate) fn register_document(&self) -> ContentId {
        let id = self.next_content_id.get() + 1;
        self.next_content_id.set(id);
        self.live_documents.set(self.live_documents.get() + 1);
        id
    }

    pub(crate) fn release_document(&self) {
        self.live_documents
            .set(self.live_documents.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_knobs_override_defaults() {
        let config = ContentConfig::default().with_overrides(|key| match key {
            "PAGELOAD_SCRIPTING" => Some("off".into()),
            "PAGELOAD_FONT_SIZE" => Some("160".into()),
            "PAGELOAD_FOREGROUND_IMAGES" => Some("maybe".into()),
            _ => None,
        });
        assert!(!config.enable_scripting);
        assert_eq!(config.font_size_tenths_pt, 160);
        assert!(config.foreground_images);
    }

    #[test]
    fn environment_tracks_documents() {
        let env = ContentEnvironment::init();
        let a = env.register_document();
        let b = env.register_document();
        assert_ne!(a, b);
        assert!(!env.shutdown());
        env.release_document();
        env.release_document();
        assert!(env.shutdown());
        assert!(env.is_shut_down());
    }
}
