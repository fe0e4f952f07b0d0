//! Script coordination: parser-blocking, deferred, async and dynamically
//! inserted scripts, plus `exec`.

use super::HtmlDocument;
use crate::error::ContentError;
use crate::fetch::{FetchPurpose, is_insecure_url};
use crate::scripts::{ScriptMode, classify, is_runnable};
use core_types::ResourceKind;
use html::NodeId;

impl HtmlDocument {
    /// Acquire the script thread on first need. False when scripting is
    /// off or the embedder has no engine.
    pub(crate) fn ensure_script_thread(&mut self) -> bool {
        if !self.config.enable_scripting || self.aborted {
            return false;
        }
        if self.script_thread.is_some() {
            return true;
        }
        if self.script_thread_requested {
            return false;
        }
        self.script_thread_requested = true;
        self.script_thread = self.embedder.script_thread(self.id);
        if self.script_thread.is_none() {
            log::debug!(target: "content.script", "content {}: no script engine", self.id);
        }
        self.script_thread.is_some()
    }

    /// The parser stopped at the end of `node`. Returns true when parsing
    /// may resume immediately.
    pub(crate) fn run_parser_script(&mut self, node: NodeId) -> Result<bool, ContentError> {
        if let Some(index) = self.blocking_script {
            if self.scripts.get(index).is_some_and(|e| e.node == node) {
                return Ok(false);
            }
        }
        if self.aborted {
            // Stay paused; the next conversion attempt reports the stop.
            return Ok(false);
        }
        if !self.ensure_script_thread() {
            return Ok(true);
        }
        let Some(element) = self.dom.element(node) else {
            return Ok(true);
        };
        if element.already_started || !is_runnable(element) {
            return Ok(true);
        }
        let src = element
            .attr("src")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let mode = classify(element, src.is_some());
        if let Some(element) = self.dom.element_mut(node) {
            element.already_started = true;
        }

        let Some(src) = src else {
            let source = self.dom.text_content(node);
            let index = self.scripts.push(node, ScriptMode::Inline, None, false);
            if let Some(entry) = self.scripts.get_mut(index) {
                entry.source = Some(source);
            }
            self.execute_entry(index);
            return Ok(true);
        };

        let Some(index) = self.start_script_fetch(node, mode, &src) else {
            return Ok(true);
        };
        if mode == ScriptMode::Sync {
            log::debug!(target: "content.script", "content {}: parser blocked on {src}", self.id);
            self.blocking_script = Some(index);
            return Ok(false);
        }
        Ok(true)
    }

    /// A script element entered the tree outside the parser.
    pub(crate) fn script_insertion_check(&mut self, node: NodeId) {
        if !self.dom.is_connected(node) {
            return;
        }
        let Some(element) = self.dom.element(node) else {
            return;
        };
        if element.parser_inserted || element.already_started || !is_runnable(element) {
            return;
        }
        if !self.ensure_script_thread() {
            return;
        }
        let src = self
            .dom
            .attr(node, "src")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if let Some(element) = self.dom.element_mut(node) {
            element.already_started = true;
        }
        match src {
            // Script-inserted external scripts never block and run on arrival.
            Some(src) => {
                self.start_script_fetch(node, ScriptMode::Async, &src);
            }
            None => {
                let source = self.dom.text_content(node);
                let index = self.scripts.push(node, ScriptMode::Inline, None, false);
                if let Some(entry) = self.scripts.get_mut(index) {
                    entry.source = Some(source);
                }
                self.execute_entry(index);
            }
        }
    }

    fn start_script_fetch(&mut self, node: NodeId, mode: ScriptMode, src: &str) -> Option<usize> {
        let url = match self.base_url.join(src) {
            Ok(url) => url,
            Err(err) => {
                log::debug!(target: "content.script", "script src {src:?} unresolvable: {err}");
                return None;
            }
        };
        let index = self
            .scripts
            .push(node, mode, Some(url.clone()), is_insecure_url(&url));
        match self
            .fetches
            .start(url, ResourceKind::Script, FetchPurpose::Script { index })
        {
            Some(id) => {
                if let Some(entry) = self.scripts.get_mut(index) {
                    entry.fetch = Some(id);
                }
                Some(index)
            }
            None => {
                if let Some(entry) = self.scripts.get_mut(index) {
                    entry.failed = true;
                }
                None
            }
        }
    }

    pub(crate) fn script_fetched(&mut self, index: usize, source: String) {
        let Some(entry) = self.scripts.get_mut(index) else {
            return;
        };
        entry.source = Some(source);
        if self.aborted {
            log::debug!(target: "content.script", "content {}: script {index} dropped after stop", self.id);
            return;
        }
        let mode = entry.mode;
        match mode {
            ScriptMode::Sync => {
                if self.blocking_script == Some(index) {
                    self.execute_entry(index);
                    self.unblock_parser();
                }
            }
            ScriptMode::Async => {
                if self.box_builder.is_none() {
                    self.execute_entry(index);
                }
            }
            ScriptMode::Defer | ScriptMode::Inline => {}
        }
    }

    pub(crate) fn script_failed(&mut self, index: usize) {
        let Some(entry) = self.scripts.get_mut(index) else {
            return;
        };
        entry.failed = true;
        if self.blocking_script == Some(index) {
            self.unblock_parser();
        }
    }

    fn unblock_parser(&mut self) {
        self.blocking_script = None;
        if let Err(err) = self.drive_parser(super::parse::ParserInput::Resume) {
            self.fail(err);
        }
    }

    fn execute_entry(&mut self, index: usize) {
        let source = match self.scripts.get_mut(index) {
            Some(entry) if !entry.executed => {
                entry.executed = true;
                entry.source.clone()
            }
            _ => None,
        };
        let Some(source) = source else {
            return;
        };
        if self.aborted {
            return;
        }
        let Some(thread) = self.script_thread.as_mut() else {
            return;
        };
        let ok = thread.execute(&mut self.dom, &source);
        log::trace!(
            target: "content.script",
            "content {}: script {index} ran ({} bytes, ok={ok})",
            self.id,
            source.len()
        );
        if !ok {
            if let Some(entry) = self.scripts.get_mut(index) {
                entry.failed = true;
            }
        }
        self.drain_mutations();
    }

    /// Deferred scripts in document order, once parsing is done.
    pub(crate) fn run_deferred_scripts(&mut self) {
        for index in self.scripts.pending_deferred() {
            self.execute_entry(index);
            if self.status.is_terminal() {
                return;
            }
        }
    }

    /// Async scripts that arrived while boxes were being built.
    pub(crate) fn run_pending_async_scripts(&mut self) {
        let pending: Vec<usize> = self
            .scripts
            .iter()
            .enumerate()
            .filter(|(_, e)| e.mode == ScriptMode::Async && !e.executed && e.source.is_some())
            .map(|(i, _)| i)
            .collect();
        for index in pending {
            self.execute_entry(index);
        }
    }

    /// Run `source` as if a script element holding it were appended to the
    /// body. False if scripting is unavailable, there is no body, or the
    /// script failed.
    pub fn exec(&mut self, source: &str) -> bool {
        if !self.ensure_script_thread() {
            return false;
        }
        let Some(body) = self.dom.body() else {
            log::debug!(target: "content.script", "content {}: exec without a body", self.id);
            return false;
        };
        let script = self.dom.create_element("script");
        let text = self.dom.create_text(source);
        let attached = self
            .dom
            .append_child(script, text)
            .and_then(|()| self.dom.append_child(body, script));
        if let Err(err) = attached {
            log::warn!(target: "content.script", "content {}: exec failed: {err}", self.id);
            if let Err(err) = self.dom.remove_subtree(script) {
                log::warn!(target: "content.script", "content {}: exec cleanup: {err}", self.id);
            }
            return false;
        }

        let before = self.scripts.len();
        self.drain_mutations();
        let ran = (before..self.scripts.len()).any(|i| {
            self.scripts
                .get(i)
                .is_some_and(|e| e.node == script && e.executed && !e.failed)
        });

        if let Err(err) = self.dom.remove_subtree(script) {
            log::warn!(target: "content.script", "content {}: exec cleanup: {err}", self.id);
        }
        self.drain_mutations();
        ran
    }
}
