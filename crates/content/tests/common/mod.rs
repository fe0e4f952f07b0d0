#![allow(dead_code)]

//! Test embedder, a line-oriented fake script engine, and a harness that
//! plays the network side of the bus by hand.

use bus::{Bus, ContentEvent, FetchCommand, FetchEvent};
use content::{ContentConfig, ContentEnvironment, CreateParams, Embedder, HtmlDocument, ScriptThread};
use core_types::{ContentStatus, FetchId, ResourceKind, Viewport};
use html::{Dom, NodeId};
use std::cell::RefCell;
use std::rc::Rc;
use url::Url;

pub const DOC_URL: &str = "http://example.test/dir/page.html";

#[derive(Default)]
pub struct EngineState {
    /// `log` lines and fired events, in order.
    pub log: Vec<String>,
    /// Script run when the document's load event fires.
    pub on_load: Option<String>,
    pub new_elements: usize,
    pub cleanups: usize,
    pub closed: bool,
}

/// Understands one command per line:
/// `log TEXT`, `link HREF`, `script SRC`, `append TAG ID`,
/// `text ID TEXT`, `title TEXT`, `fail`.
pub struct FakeEngine {
    state: Rc<RefCell<EngineState>>,
}

fn element_by_id(dom: &Dom, id: &str) -> Option<NodeId> {
    dom.element_by_id(id)
}

fn run_line(dom: &mut Dom, state: &RefCell<EngineState>, line: &str) -> bool {
    let line = line.trim();
    let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
    match cmd {
        "" => true,
        "log" => {
            state.borrow_mut().log.push(rest.to_string());
            true
        }
        "link" => {
            let Some(head) = dom.head() else { return false };
            let link = dom.create_element("link");
            dom.set_attr(link, "rel", "stylesheet").unwrap();
            dom.set_attr(link, "href", rest).unwrap();
            dom.append_child(head, link).is_ok()
        }
        "script" => {
            let Some(head) = dom.head() else { return false };
            let script = dom.create_element("script");
            dom.set_attr(script, "src", rest).unwrap();
            dom.append_child(head, script).is_ok()
        }
        "append" => {
            let (tag, id) = rest.split_once(' ').unwrap_or((rest, ""));
            let Some(body) = dom.body() else { return false };
            let el = dom.create_element(tag);
            if !id.is_empty() {
                dom.set_attr(el, "id", id).unwrap();
            }
            dom.append_child(body, el).is_ok()
        }
        "text" => {
            let (id, text) = rest.split_once(' ').unwrap_or((rest, ""));
            match element_by_id(dom, id) {
                Some(node) => dom.set_text_content(node, text).is_ok(),
                None => false,
            }
        }
        "title" => {
            let Some(title) = dom.elements_named(dom.document(), "title").first().copied() else {
                return false;
            };
            dom.set_text_content(title, rest).is_ok()
        }
        "fail" => false,
        _ => false,
    }
}

impl ScriptThread for FakeEngine {
    fn execute(&mut self, dom: &mut Dom, source: &str) -> bool {
        source.lines().all(|line| run_line(dom, &self.state, line))
    }

    fn fire_event(&mut self, dom: &mut Dom, _target: NodeId, name: &str) -> bool {
        self.state.borrow_mut().log.push(format!("event:{name}"));
        let handler = self.state.borrow().on_load.clone();
        match handler {
            Some(source) if name == "load" => self.execute(dom, &source),
            _ => false,
        }
    }

    fn new_element(&mut self, _dom: &Dom, _node: NodeId) {
        self.state.borrow_mut().new_elements += 1;
    }

    fn cleanup(&mut self) {
        self.state.borrow_mut().cleanups += 1;
    }

    fn close(&mut self) {
        self.state.borrow_mut().closed = true;
    }
}

pub struct TestEmbedder {
    pub viewport: Viewport,
    /// `None` means no script engine is available.
    pub engine: Option<Rc<RefCell<EngineState>>>,
}

impl Embedder for TestEmbedder {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn script_thread(&mut self, _content: core_types::ContentId) -> Option<Box<dyn ScriptThread>> {
        let state = self.engine.clone()?;
        Some(Box::new(FakeEngine { state }))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Started {
    pub fetch_id: FetchId,
    pub url: String,
    pub kind: ResourceKind,
}

pub struct Harness {
    pub bus: Bus,
    pub env: Rc<ContentEnvironment>,
    pub doc: Option<HtmlDocument>,
    pub engine: Rc<RefCell<EngineState>>,
    pub started: Vec<Started>,
    pub cancelled: Vec<FetchId>,
    pub events: Vec<ContentEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ContentConfig::default(), true)
    }

    pub fn with_config(config: ContentConfig, engine: bool) -> Self {
        Self::with_params(config, engine, CreateParams::default())
    }

    pub fn with_params(config: ContentConfig, engine: bool, params: CreateParams) -> Self {
        let bus = Bus::new();
        let env = ContentEnvironment::init();
        let state = Rc::new(RefCell::new(EngineState::default()));
        let embedder = TestEmbedder {
            viewport: Viewport {
                width: 800,
                height: 600,
            },
            engine: engine.then(|| state.clone()),
        };
        let doc = HtmlDocument::create(
            Url::parse(DOC_URL).unwrap(),
            params,
            config,
            env.clone(),
            bus.ports(),
            Box::new(embedder),
        )
        .unwrap();
        Self {
            bus,
            env,
            doc: Some(doc),
            engine: state,
            started: Vec::new(),
            cancelled: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn doc(&self) -> &HtmlDocument {
        self.doc.as_ref().unwrap()
    }

    pub fn doc_mut(&mut self) -> &mut HtmlDocument {
        self.doc.as_mut().unwrap()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.doc_mut().process_data(bytes).unwrap();
        self.collect();
    }

    /// End the stream and run conversion to completion.
    pub fn finish(&mut self) {
        let _ = self.doc_mut().convert();
        self.pump_all();
    }

    pub fn load(&mut self, source: &str) {
        self.feed(source.as_bytes());
        self.finish();
    }

    pub fn pump_all(&mut self) {
        while self.doc_mut().pump() {}
        self.collect();
    }

    /// Move everything the document sent into `started`, `cancelled` and
    /// `events`.
    pub fn collect(&mut self) {
        while let Ok(cmd) = self.bus.fetch_rx.try_recv() {
            match cmd {
                FetchCommand::Start {
                    fetch_id, url, kind, ..
                } => self.started.push(Started { fetch_id, url, kind }),
                FetchCommand::Cancel { fetch_id, .. } => self.cancelled.push(fetch_id),
            }
        }
        while let Ok(event) = self.bus.event_rx.try_recv() {
            self.events.push(event);
        }
    }

    fn fetch_for(&self, url: &str) -> FetchId {
        self.started
            .iter()
            .rev()
            .find(|s| s.url == url)
            .map(|s| s.fetch_id)
            .unwrap_or_else(|| panic!("no fetch started for {url}; started: {:?}", self.started))
    }

    /// Answer the most recent fetch for `url` with `body`, then pump.
    pub fn respond(&mut self, url: &str, body: &str) {
        let fetch_id = self.fetch_for(url);
        let content_id = self.doc().id();
        let doc = self.doc_mut();
        doc.handle_fetch_event(FetchEvent::Chunk {
            content_id,
            fetch_id,
            bytes: body.as_bytes().to_vec(),
        });
        doc.handle_fetch_event(FetchEvent::Done {
            content_id,
            fetch_id,
        });
        self.pump_all();
    }

    pub fn fail_fetch(&mut self, url: &str) {
        let fetch_id = self.fetch_for(url);
        let content_id = self.doc().id();
        self.doc_mut().handle_fetch_event(FetchEvent::Error {
            content_id,
            fetch_id,
            error: "connection refused".to_string(),
        });
        self.pump_all();
    }

    pub fn started_urls(&self) -> Vec<&str> {
        self.started.iter().map(|s| s.url.as_str()).collect()
    }

    pub fn statuses(&self) -> Vec<ContentStatus> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ContentEvent::Status { status, .. } => Some(*status),
                _ => None,
            })
            .collect()
    }

    pub fn titles(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ContentEvent::Title { title, .. } => Some(title.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn engine_log(&self) -> Vec<String> {
        self.engine.borrow().log.clone()
    }
}
