//! Seams to the embedding environment and the script engine.

use core_types::{ContentId, Viewport};
use html::{Dom, NodeId};
use layout::{ApproxTextMeasurer, TextMeasurer};

/// Synchronous queries a document makes of whoever embeds it. Asynchronous
/// notifications travel over the bus instead.
pub trait Embedder {
    fn viewport(&self) -> Viewport;

    /// Hand out a script engine thread for `content`, or `None` when the
    /// embedder has no engine.
    fn script_thread(&mut self, content: ContentId) -> Option<Box<dyn ScriptThread>>;

    fn text_measurer(&self) -> Box<dyn TextMeasurer> {
        Box::new(ApproxTextMeasurer)
    }
}

/// One script engine context bound to a document.
///
/// The engine gets the DOM mutably for the duration of each call; any
/// mutations it makes are queued on the DOM and observed afterwards.
pub trait ScriptThread {
    /// Run `source`. Returns false if the script failed.
    fn execute(&mut self, dom: &mut Dom, source: &str) -> bool;

    /// Fire the named event at `target`. Returns false if nothing handled it.
    fn fire_event(&mut self, dom: &mut Dom, target: NodeId, name: &str) -> bool;

    /// A new element exists; bindings may attach to it.
    fn new_element(&mut self, _dom: &Dom, _node: NodeId) {}

    /// End of a batch of event processing.
    fn cleanup(&mut self) {}

    /// The document is going away.
    fn close(&mut self) {}
}
