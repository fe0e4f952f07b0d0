//! The HTML document content.
//!
//! Invariants:
//! - `status` only moves forward (`Loading -> Ready -> Done`, or to `Error`);
//!   every change goes through `set_status`.
//! - Conversion starts only when the fetch coordinator reports zero active
//!   fetches and no stylesheet slot is modified.
//! - `parse_completed` and `conversion_begun` are set once and never
//!   cleared; re-entry from fetch completions is resolved by checking them,
//!   not by locking.
//! - At most one `BoxBuilder` exists per document, and once a selection
//!   context exists no second one is built: the box tree is static after
//!   the first conversion.
//! - Nothing holds a reference back into the document. The box builder is
//!   polled by `pump` and owned here, so dropping the document cancels it.

mod conversion;
mod observer;
mod parse;
mod query;
mod script_exec;

use crate::config::{ContentConfig, ContentEnvironment};
use crate::error::ContentError;
use crate::fetch::{FetchCoordinator, FetchPurpose, PendingFetch};
use crate::forms::Form;
use crate::frames::{Frameset, Iframe};
use crate::head::TitleLatch;
use crate::host::{Embedder, ScriptThread};
use crate::objects::{ObjectList, ObjectState};
use crate::scripts::ScriptList;
use crate::stylesheets::StylesheetList;
use bus::{ContentEvent, ContentPorts, FetchEvent, Rfc5988Link};
use core_types::{ContentId, ContentStatus, EncodingSource, Rect};
use css::SelectionContext;
use html::{BindingParams, Dom, ParserBinding, charset_from_content_type};
use layout::{BoxBuilder, BoxTree, ImageMaps, TextMeasurer};
use std::rc::Rc;
use url::Url;

pub use observer::ElementTag;

/// Transport metadata the document is created with.
#[derive(Clone, Debug, Default)]
pub struct CreateParams {
    /// `Content-Type` header value, e.g. `text/html; charset=utf-8`.
    pub content_type: Option<String>,
}

/// A scheduled `<meta http-equiv=refresh>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Refresh {
    pub delay_secs: u32,
    pub url: Url,
}

pub struct HtmlDocument {
    id: ContentId,
    url: Url,
    config: ContentConfig,
    env: Rc<ContentEnvironment>,
    ports: ContentPorts,
    embedder: Box<dyn Embedder>,
    measurer: Box<dyn TextMeasurer>,

    status: ContentStatus,
    stream_done: bool,
    parse_completed: bool,
    conversion_begun: bool,
    aborted: bool,
    last_error: Option<ContentError>,

    fetches: FetchCoordinator,

    source: Vec<u8>,
    binding_params: BindingParams,
    binding: Option<ParserBinding>,
    dom: Dom,
    encoding: Option<String>,
    encoding_source: EncodingSource,

    base_url: Url,
    base_target: Option<String>,
    title: TitleLatch,
    refresh: Option<Refresh>,
    links: Vec<Rfc5988Link>,

    stylesheets: StylesheetList,
    selection: Option<SelectionContext>,

    scripts: ScriptList,
    script_thread: Option<Box<dyn ScriptThread>>,
    script_thread_requested: bool,
    /// Sync script the parser is paused on.
    blocking_script: Option<usize>,

    objects: ObjectList,
    forms: Vec<Form>,
    frameset: Option<Frameset>,
    iframes: Vec<Iframe>,
    imagemaps: Option<ImageMaps>,

    box_builder: Option<BoxBuilder>,
    box_tree: Option<BoxTree>,

    draining: bool,
}

impl HtmlDocument {
    /// Allocate a document for `url`. A `charset` parameter in the content
    /// type becomes the declared encoding.
    pub fn create(
        url: Url,
        params: CreateParams,
        config: ContentConfig,
        env: Rc<ContentEnvironment>,
        ports: ContentPorts,
        embedder: Box<dyn Embedder>,
    ) -> Result<Self, ContentError> {
        let id = env.register_document();
        let binding_params = BindingParams {
            encoding: params
                .content_type
                .as_deref()
                .and_then(charset_from_content_type),
            enable_scripting: config.enable_scripting,
            fallback: config.fallback_charset.clone(),
        };
        let (binding, dom) = match ParserBinding::new(binding_params.clone()) {
            Ok(created) => created,
            Err(err) => {
                env.release_document();
                let err = ContentError::from(err);
                let _ = ports.event_tx.send(ContentEvent::Error {
                    content_id: id,
                    report: err.report(),
                });
                log::error!(target: "content.convert", "content {id}: parser creation failed: {err}");
                return Err(err);
            }
        };
        let encoding = Some(binding.encoding().to_string());
        let encoding_source = binding.encoding_source();
        let measurer = embedder.text_measurer();
        let stylesheets = StylesheetList::new(&config.ua_stylesheet);
        log::info!(
            target: "content.convert",
            "content {id}: created for {url} ({} from {})",
            binding.encoding(),
            encoding_source.label()
        );

        let doc = Self {
            id,
            base_url: url.clone(),
            url,
            fetches: FetchCoordinator::new(id, ports.clone()),
            config,
            env,
            ports,
            embedder,
            measurer,
            status: ContentStatus::Loading,
            stream_done: false,
            parse_completed: false,
            conversion_begun: false,
            aborted: false,
            last_error: None,
            source: Vec::new(),
            binding_params,
            binding: Some(binding),
            dom,
            encoding,
            encoding_source,
            base_target: None,
            title: TitleLatch::default(),
            refresh: None,
            links: Vec::new(),
            stylesheets,
            selection: None,
            scripts: ScriptList::default(),
            script_thread: None,
            script_thread_requested: false,
            blocking_script: None,
            objects: ObjectList::default(),
            forms: Vec::new(),
            frameset: None,
            iframes: Vec::new(),
            imagemaps: None,
            box_builder: None,
            box_tree: None,
            draining: false,
        };
        doc.broadcast(ContentEvent::Status {
            content_id: id,
            status: ContentStatus::Loading,
        });
        Ok(doc)
    }

    pub fn id(&self) -> ContentId {
        self.id
    }

    /// Feed a chunk of the document's own byte stream.
    pub fn process_data(&mut self, bytes: &[u8]) -> Result<(), ContentError> {
        if self.status.is_terminal() || self.stream_done {
            log::debug!(
                target: "content.convert",
                "content {}: ignoring {} bytes after end of stream",
                self.id,
                bytes.len()
            );
            return self.result();
        }
        self.source.extend_from_slice(bytes);
        if let Err(err) = self.drive_parser(parse::ParserInput::Chunk(bytes)) {
            self.fail(err);
        }
        self.result()
    }

    /// The document's own stream has ended.
    pub fn convert(&mut self) -> Result<(), ContentError> {
        if self.stream_done || self.status.is_terminal() {
            return self.result();
        }
        self.stream_done = true;
        if self.dom.quirks() {
            log::debug!(target: "content.convert", "content {}: quirks mode", self.id);
            self.stylesheets.enable_quirks(css::QUIRKS_STYLESHEET);
        }
        self.fetches.release_document_unit();
        self.try_begin_conversion();
        self.result()
    }

    /// Route a sub-resource fetch event. Events for other documents and
    /// for fetches this document no longer tracks are dropped.
    pub fn handle_fetch_event(&mut self, event: FetchEvent) {
        if event.content_id() != self.id {
            return;
        }
        match event {
            FetchEvent::Chunk {
                fetch_id, bytes, ..
            } => {
                self.fetches.append(fetch_id, &bytes);
            }
            FetchEvent::Done { fetch_id, .. } => {
                if let Some(done) = self.fetches.finish(fetch_id) {
                    self.fetch_succeeded(done);
                    self.after_fetch_settled();
                }
            }
            FetchEvent::Error {
                fetch_id, error, ..
            } => {
                if let Some(done) = self.fetches.finish(fetch_id) {
                    log::warn!(
                        target: "content.fetch",
                        "content {}: {:?} {} failed: {error}",
                        self.id,
                        done.kind,
                        done.url
                    );
                    self.fetch_failed(done);
                    self.after_fetch_settled();
                }
            }
        }
    }

    fn fetch_succeeded(&mut self, done: PendingFetch) {
        match done.purpose {
            FetchPurpose::Stylesheet { slot } => {
                self.stylesheets
                    .link_loaded(slot, &String::from_utf8_lossy(&done.body));
            }
            FetchPurpose::Script { index } => {
                self.script_fetched(index, String::from_utf8_lossy(&done.body).into_owned());
            }
            FetchPurpose::Object { index } => {
                self.objects.set_state(
                    index,
                    ObjectState::Done {
                        bytes: done.body.len(),
                    },
                );
                self.redraw_object(index);
            }
        }
    }

    fn fetch_failed(&mut self, done: PendingFetch) {
        match done.purpose {
            FetchPurpose::Stylesheet { slot } => self.stylesheets.link_failed(slot),
            FetchPurpose::Script { index } => self.script_failed(index),
            FetchPurpose::Object { index } => {
                self.objects.set_state(index, ObjectState::Failed);
                self.redraw_object(index);
            }
        }
    }

    fn redraw_object(&self, index: usize) {
        let (Some(tree), Some(entry)) = (self.box_tree.as_ref(), self.objects.get(index)) else {
            return;
        };
        if let Some(b) = entry.box_id.and_then(|id| tree.get(id)) {
            self.broadcast(ContentEvent::Redraw {
                content_id: self.id,
                area: b.rect,
            });
        }
    }

    /// Run one budgeted step of box construction. Returns true while more
    /// work remains.
    pub fn pump(&mut self) -> bool {
        self.pump_conversion()
    }

    /// Abort the load.
    pub fn stop(&mut self) {
        match self.status {
            ContentStatus::Loading => {
                log::info!(target: "content.convert", "content {}: stop while loading", self.id);
                self.aborted = true;
                if let Some(mut thread) = self.script_thread.take() {
                    thread.close();
                }
                if let Some(mut builder) = self.box_builder.take() {
                    builder.cancel();
                    self.abort_objects();
                    self.fail(ContentError::stopped());
                    return;
                }
                self.after_fetch_settled();
            }
            ContentStatus::Ready => {
                log::info!(target: "content.convert", "content {}: stop while ready", self.id);
                self.aborted = true;
                if let Some(mut builder) = self.box_builder.take() {
                    builder.cancel();
                    self.abort_objects();
                    self.fail(ContentError::stopped());
                    return;
                }
                self.abort_objects();
                if self.fetches.active() == 0 {
                    self.set_status(ContentStatus::Done);
                }
            }
            ContentStatus::Done | ContentStatus::Error => {}
        }
    }

    /// Cancel every embedded-object fetch still outstanding.
    pub fn abort_objects(&mut self) {
        for id in self.objects.abort_all() {
            self.fetches.cancel(id);
        }
    }

    /// Re-run flow layout for a new viewport; boxes are kept.
    pub fn reformat(&mut self, width: u32, height: u32) {
        if let Some(selection) = self.selection.as_mut() {
            let mut media = *selection.media();
            media.viewport_width = width as f32;
            media.viewport_height = height as f32;
            selection.set_media(media);
        }
        let Some(tree) = self.box_tree.as_mut() else {
            return;
        };
        layout::relayout(tree, width as f32, self.measurer.as_ref());
        let area = Rect {
            x: 0.0,
            y: 0.0,
            width: tree.width(),
            height: tree.height(),
        };
        log::debug!(
            target: "content.convert",
            "content {}: reformatted to {width}x{height}, content {}x{}",
            self.id,
            area.width,
            area.height
        );
        self.broadcast(ContentEvent::Redraw {
            content_id: self.id,
            area,
        });
    }

    pub(crate) fn broadcast(&self, event: ContentEvent) {
        if self.ports.event_tx.send(event).is_err() {
            log::trace!(target: "content.convert", "content {}: event channel closed", self.id);
        }
    }

    pub(crate) fn set_status(&mut self, next: ContentStatus) {
        if self.status == next {
            return;
        }
        if !self.status.can_transition_to(next) {
            log::warn!(
                target: "content.convert",
                "content {}: refusing status change {:?} -> {next:?}",
                self.id,
                self.status
            );
            return;
        }
        log::info!(
            target: "content.convert",
            "content {}: {:?} -> {next:?}",
            self.id,
            self.status
        );
        self.status = next;
        self.broadcast(ContentEvent::Status {
            content_id: self.id,
            status: next,
        });
    }

    /// Report `err` and move to `Error`, settling all outstanding work.
    pub(crate) fn fail(&mut self, err: ContentError) {
        if self.status.is_terminal() {
            return;
        }
        log::error!(target: "content.convert", "content {}: {err}", self.id);
        if let Some(mut builder) = self.box_builder.take() {
            builder.cancel();
        }
        self.abort_objects();
        self.fetches.cancel_all();
        self.blocking_script = None;
        self.broadcast(ContentEvent::Error {
            content_id: self.id,
            report: err.report(),
        });
        self.last_error = Some(err);
        self.set_status(ContentStatus::Error);
    }

    fn result(&self) -> Result<(), ContentError> {
        match (&self.last_error, self.status) {
            (Some(err), ContentStatus::Error) => Err(err.clone()),
            _ => Ok(()),
        }
    }
}

impl Drop for HtmlDocument {
    fn drop(&mut self) {
        if let Some(mut builder) = self.box_builder.take() {
            builder.cancel();
            log::debug!(target: "content.convert", "content {}: destroyed mid-conversion", self.id);
        }
        if let Some(mut thread) = self.script_thread.take() {
            thread.close();
        }
        let cancelled = self.fetches.cancel_all();
        if cancelled > 0 {
            log::debug!(
                target: "content.fetch",
                "content {}: cancelled {cancelled} fetches on destroy",
                self.id
            );
        }
        self.binding = None;
        self.env.release_document();
    }
}
