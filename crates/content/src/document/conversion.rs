//! From a complete DOM to a laid-out box tree.
//!
//! `try_begin_conversion` runs once the stream has ended and every
//! blocking fetch has settled; `finish_conversion` builds the selection
//! context and starts the box builder, which `pump` then drives.

use super::HtmlDocument;
use crate::error::ContentError;
use crate::fetch::FetchPurpose;
use crate::forms::collect_forms;
use crate::frames::{Iframe, build_frameset};
use crate::objects::{ObjectKind, ObjectState};
use bus::{ContentEvent, ErrorKind};
use core_types::{ContentStatus, Rect, ResourceKind};
use css::{MediaContext, SelectionContext};
use layout::{BoxBuilder, BoxTree, ImageMaps, ObjectRequestKind, StepResult};

impl HtmlDocument {
    fn can_begin_conversion(&self) -> bool {
        self.fetches.active() == 0 && !self.stylesheets.any_modified()
    }

    pub(crate) fn try_begin_conversion(&mut self) {
        if self.status.is_terminal() || self.conversion_begun || !self.stream_done {
            return;
        }
        if !self.can_begin_conversion() {
            log::trace!(
                target: "content.convert",
                "content {}: conversion waits on {} fetches",
                self.id,
                self.fetches.active()
            );
            return;
        }
        if self.aborted {
            self.fail(ContentError::stopped());
            return;
        }
        if !self.parse_completed {
            match self.complete_parse() {
                Ok(true) => {}
                Ok(false) => return,
                Err(err) => {
                    self.fail(err);
                    return;
                }
            }
            self.parse_completed = true;
            log::info!(
                target: "content.convert",
                "content {}: parse complete, {} nodes",
                self.id,
                self.dom.len()
            );
            // Completing the parse may have started fetches.
            if !self.can_begin_conversion() {
                return;
            }
        }

        self.conversion_begun = true;
        log::info!(target: "content.convert", "content {}: conversion begins", self.id);
        self.run_deferred_scripts();
        if self.status.is_terminal() {
            return;
        }

        let root_is_html = self
            .dom
            .document_element()
            .and_then(|root| self.dom.tag_name(root))
            .is_some_and(|name| name == "html");
        if !root_is_html {
            self.fail(ContentError::new(ErrorKind::Dom, "document has no html root element"));
            return;
        }

        let charset = self.encoding.clone().unwrap_or_default();
        self.forms = collect_forms(
            &self.dom,
            &self.url,
            &self.base_url,
            self.base_target.as_deref(),
            &charset,
        );

        if self.can_begin_conversion() {
            self.finish_conversion();
        } else {
            self.set_status(ContentStatus::Ready);
        }
    }

    /// `Ok(false)` while the parser is held by a blocking script.
    fn complete_parse(&mut self) -> Result<bool, ContentError> {
        let Some(binding) = self.binding.as_ref() else {
            return Ok(true);
        };
        if binding.is_complete() {
            return Ok(true);
        }
        if binding.is_paused() {
            return Ok(false);
        }
        self.drive_parser(super::parse::ParserInput::Complete)?;
        Ok(self.binding.as_ref().is_none_or(|b| b.is_complete()))
    }

    /// Every fetch completion funnels through here.
    pub(crate) fn after_fetch_settled(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        if !self.conversion_begun {
            self.try_begin_conversion();
            return;
        }
        if self.selection.is_none() {
            if self.can_begin_conversion() {
                self.finish_conversion();
            }
            return;
        }
        self.proceed_to_done();
    }

    pub(crate) fn finish_conversion(&mut self) {
        if self.aborted {
            self.fail(ContentError::stopped());
            return;
        }
        if self.selection.is_some() {
            log::info!(
                target: "content.convert",
                "content {}: conversion already finished; box tree is static",
                self.id
            );
            return;
        }

        let media = MediaContext::new(self.embedder.viewport(), self.config.font_size_tenths_pt);
        match SelectionContext::new(self.stylesheets.compiled(), media) {
            Ok(selection) => self.selection = Some(selection),
            Err(err) => {
                self.fail(err.into());
                return;
            }
        }

        if let Some(thread) = self.script_thread.as_mut() {
            let document = self.dom.document();
            if !thread.fire_event(&mut self.dom, document, "load") {
                log::debug!(target: "content.script", "content {}: load handler failed", self.id);
            }
        }
        self.drain_mutations();
        if self.status.is_terminal() {
            return;
        }

        let Some(root) = self.dom.document_element() else {
            self.fail(ContentError::new(ErrorKind::Dom, "document element vanished"));
            return;
        };
        let Some(selection) = self.selection.as_ref() else {
            return;
        };
        match BoxBuilder::new(&self.dom, root, selection) {
            Ok(builder) => {
                log::debug!(target: "content.convert", "content {}: box conversion started", self.id);
                self.box_builder = Some(builder);
            }
            Err(err) => self.fail(err.into()),
        }
    }

    pub(crate) fn pump_conversion(&mut self) -> bool {
        if self.aborted {
            if let Some(mut builder) = self.box_builder.take() {
                builder.cancel();
                self.abort_objects();
                self.fail(ContentError::stopped());
            }
            return false;
        }
        let (Some(builder), Some(selection)) = (self.box_builder.as_mut(), self.selection.as_ref()) else {
            return false;
        };
        match builder.step(
            &self.dom,
            selection,
            self.measurer.as_ref(),
            self.config.max_build_steps,
        ) {
            Ok(StepResult::Pending) => true,
            Ok(StepResult::Done(tree)) => {
                self.box_builder = None;
                self.box_tree_built(tree);
                false
            }
            Err(err) => {
                self.box_builder = None;
                self.abort_objects();
                self.fail(err.into());
                false
            }
        }
    }

    fn box_tree_built(&mut self, mut tree: BoxTree) {
        for request in tree.object_requests().to_vec() {
            let url = match self.base_url.join(&request.url) {
                Ok(url) => url,
                Err(err) => {
                    log::debug!(
                        target: "content.fetch",
                        "object url {:?} unresolvable: {err}",
                        request.url
                    );
                    continue;
                }
            };
            let kind = match request.kind {
                ObjectRequestKind::Iframe => {
                    self.iframes
                        .push(Iframe::new(&self.dom, request.node, request.box_id, url));
                    continue;
                }
                ObjectRequestKind::Image => ObjectKind::Image,
                ObjectRequestKind::Object => ObjectKind::Object,
            };
            let index = match self.objects.find_speculative(request.node, &url) {
                Some(index) => index,
                None => {
                    let index = self.objects.add(request.node, url.clone(), kind, false);
                    let resource = match kind {
                        ObjectKind::Image => ResourceKind::Image,
                        ObjectKind::Object => ResourceKind::Object,
                    };
                    let state = match self
                        .fetches
                        .start(url, resource, FetchPurpose::Object { index })
                    {
                        Some(id) => ObjectState::Fetching(id),
                        None => ObjectState::Failed,
                    };
                    self.objects.set_state(index, state);
                    index
                }
            };
            self.objects.attach_box(index, request.box_id);
            if let Some(b) = tree.get_mut(request.box_id) {
                b.object = Some(index);
            }
        }

        if self.dom.body().is_none() {
            self.frameset = build_frameset(&self.dom, &self.base_url);
        }

        match ImageMaps::extract(&self.dom) {
            Ok(maps) => self.imagemaps = Some(maps),
            Err(err) => {
                self.abort_objects();
                self.fail(err.into());
                return;
            }
        }

        self.binding = None;
        self.source = Vec::new();

        if self.env.dump_box_trees() {
            log::debug!(target: "content.convert", "content {} box tree:\n{}", self.id, tree.dump());
        }
        log::info!(
            target: "content.convert",
            "content {}: {} boxes, {} objects, {} iframes",
            self.id,
            tree.len(),
            self.objects.len(),
            self.iframes.len()
        );
        let area = Rect {
            x: 0.0,
            y: 0.0,
            width: tree.width(),
            height: tree.height(),
        };
        self.box_tree = Some(tree);
        self.set_status(ContentStatus::Ready);
        self.broadcast(ContentEvent::Redraw {
            content_id: self.id,
            area,
        });
        self.run_pending_async_scripts();
        self.proceed_to_done();
    }

    fn proceed_to_done(&mut self) {
        if self.status == ContentStatus::Ready
            && self.box_builder.is_none()
            && self.box_tree.is_some()
            && self.fetches.active() == 0
        {
            self.set_status(ContentStatus::Done);
        } else if self.status == ContentStatus::Ready && self.fetches.active() > 0 {
            self.broadcast(ContentEvent::StatusText {
                content_id: self.id,
                text: format!("Loading {} objects", self.fetches.active()),
            });
        }
    }
}
