//! Script list and classification.

use core_types::FetchId;
use html::{ElementData, NodeId};
use url::Url;

/// How a script relates to parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptMode {
    /// Inline text; runs as soon as it is seen.
    Inline,
    /// External, parser waits for it.
    Sync,
    /// External, runs when conversion begins, in document order.
    Defer,
    /// External, runs whenever it arrives.
    Async,
}

#[derive(Clone, Debug)]
pub struct ScriptEntry {
    pub node: NodeId,
    pub mode: ScriptMode,
    pub url: Option<Url>,
    pub fetch: Option<FetchId>,
    pub source: Option<String>,
    pub executed: bool,
    pub failed: bool,
    pub insecure: bool,
}

impl ScriptEntry {
    pub fn is_settled(&self) -> bool {
        self.source.is_some() || self.failed
    }
}

const JS_TYPES: [&str; 8] = [
    "text/javascript",
    "application/javascript",
    "application/ecmascript",
    "text/ecmascript",
    "application/x-javascript",
    "text/x-javascript",
    "text/jscript",
    "module",
];

/// Absent/empty type or a JavaScript MIME type.
pub fn is_runnable(element: &ElementData) -> bool {
    match element.attr("type").map(str::trim) {
        None | Some("") => match element.attr("language").map(str::trim) {
            None | Some("") => true,
            Some(lang) => lang.to_ascii_lowercase().starts_with("javascript"),
        },
        Some(ty) => {
            let essence = ty.split(';').next().unwrap_or("").trim();
            JS_TYPES.iter().any(|t| t.eq_ignore_ascii_case(essence))
        }
    }
}

/// Mode for a script element; `src` must already be known to be present
/// for the external modes.
pub fn classify(element: &ElementData, has_src: bool) -> ScriptMode {
    if !has_src {
        ScriptMode::Inline
    } else if element.has_attr("async") {
        ScriptMode::Async
    } else if element.has_attr("defer") {
        ScriptMode::Defer
    } else {
        ScriptMode::Sync
    }
}

#[derive(Clone, Debug, Default)]
pub struct ScriptList {
    entries: Vec<ScriptEntry>,
}

impl ScriptList {
    pub fn push(&mut self, node: NodeId, mode: ScriptMode, url: Option<Url>, insecure: bool) -> usize {
        self.entries.push(ScriptEntry {
            node,
            mode,
            url,
            fetch: None,
            source: None,
            executed: false,
            failed: false,
            insecure,
        });
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ScriptEntry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ScriptEntry> {
        self.entries.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScriptEntry> {
        self.entries.iter()
    }

    /// Deferred scripts not yet run, in document order.
    pub fn pending_deferred(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.mode == ScriptMode::Defer && !e.executed && !e.failed)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn saw_insecure(&self) -> bool {
        self.entries.iter().any(|e| e.insecure)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(attrs: &[(&str, &str)]) -> ElementData {
        let mut e = ElementData::new("script");
        for (k, v) in attrs {
            e.attributes.push((k.to_string(), v.to_string()));
        }
        e
    }

    #[test]
    fn type_filter() {
        assert!(is_runnable(&script(&[])));
        assert!(is_runnable(&script(&[("type", "text/JavaScript; charset=utf-8")])));
        assert!(!is_runnable(&script(&[("type", "text/template")])));
        assert!(!is_runnable(&script(&[("language", "vbscript")])));
    }

    #[test]
    fn modes() {
        assert_eq!(classify(&script(&[]), false), ScriptMode::Inline);
        assert_eq!(classify(&script(&[("defer", "")]), true), ScriptMode::Defer);
        assert_eq!(classify(&script(&[("async", ""), ("defer", "")]), true), ScriptMode::Async);
        assert_eq!(classify(&script(&[]), true), ScriptMode::Sync);
    }
}
