//! Headless driver: loads an HTML file from disk, answers sub-resource
//! fetches from the filesystem, and prints what the document reports.
//!
//! Usage: `pageload FILE [WIDTH HEIGHT]`

use bus::{Bus, ContentEvent, FetchCommand, FetchEvent};
use content::{ContentConfig, ContentEnvironment, CreateParams, Embedder, HtmlDocument, ScriptThread};
use core_types::{ContentId, ContentStatus, Viewport};
use std::io::Read;
use std::process::ExitCode;
use url::Url;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const CHUNK_SIZE: usize = 4096;

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging() {
    let level = std::env::var("PAGELOAD_LOG")
        .ok()
        .and_then(|v| v.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Warn);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// No script engine; scripts are skipped.
struct HeadlessEmbedder {
    viewport: Viewport,
}

impl Embedder for HeadlessEmbedder {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn script_thread(&mut self, _content: ContentId) -> Option<Box<dyn ScriptThread>> {
        None
    }
}

fn parse_viewport(args: &[String]) -> Viewport {
    let mut viewport = Viewport::default();
    if let [w, h] = args {
        if let (Ok(width), Ok(height)) = (w.parse(), h.parse()) {
            viewport = Viewport { width, height };
        }
    }
    viewport
}

/// Answer one fetch from disk. Anything that is not a `file:` URL fails.
fn serve(doc: &mut HtmlDocument, content_id: ContentId, fetch_id: core_types::FetchId, url: &str) {
    let path = Url::parse(url)
        .ok()
        .filter(|u| u.scheme() == "file")
        .and_then(|u| u.to_file_path().ok());
    let result = match path {
        Some(path) => std::fs::read(&path).map_err(|e| format!("{}: {e}", path.display())),
        None => Err(format!("{url}: not a local file")),
    };
    match result {
        Ok(bytes) => {
            log::info!(target: "pageload", "served {url} ({} bytes)", bytes.len());
            doc.handle_fetch_event(FetchEvent::Chunk {
                content_id,
                fetch_id,
                bytes,
            });
            doc.handle_fetch_event(FetchEvent::Done {
                content_id,
                fetch_id,
            });
        }
        Err(error) => {
            log::warn!(target: "pageload", "fetch failed: {error}");
            doc.handle_fetch_event(FetchEvent::Error {
                content_id,
                fetch_id,
                error,
            });
        }
    }
}

fn print_event(event: &ContentEvent) {
    match event {
        ContentEvent::Status { status, .. } => println!("status: {status:?}"),
        ContentEvent::StatusText { text, .. } => println!("status text: {text}"),
        ContentEvent::Redraw { .. } => {}
        ContentEvent::Error { report, .. } => println!("error: {} ({})", report.kind, report.message),
        ContentEvent::Refresh { delay_secs, url, .. } => println!("refresh: {delay_secs}s -> {url}"),
        ContentEvent::Title { title, .. } => println!("title: {title}"),
        ContentEvent::Link { link, .. } => println!("link: {} {}", link.rel, link.href),
    }
}

/// Serve fetches and pump until nothing is left to do.
fn settle(bus: &Bus, doc: &mut HtmlDocument) {
    let content_id = doc.id();
    loop {
        let mut progressed = doc.pump();
        while let Ok(event) = bus.event_rx.try_recv() {
            print_event(&event);
        }
        while let Ok(cmd) = bus.fetch_rx.try_recv() {
            if let FetchCommand::Start { fetch_id, url, .. } = cmd {
                serve(doc, content_id, fetch_id, &url);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
}

fn run(path: &str, viewport: Viewport) -> Result<ContentStatus, String> {
    let absolute = std::fs::canonicalize(path).map_err(|e| format!("{path}: {e}"))?;
    let url = Url::from_file_path(&absolute).map_err(|()| format!("{path}: not a file path"))?;
    let mut file = std::fs::File::open(&absolute).map_err(|e| format!("{path}: {e}"))?;

    let bus = Bus::new();
    let env = ContentEnvironment::init();
    let mut doc = HtmlDocument::create(
        url,
        CreateParams::default(),
        ContentConfig::from_env(),
        env.clone(),
        bus.ports(),
        Box::new(HeadlessEmbedder { viewport }),
    )
    .map_err(|e| e.to_string())?;

    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).map_err(|e| format!("{path}: {e}"))?;
        if n == 0 {
            break;
        }
        doc.process_data(&buf[..n]).map_err(|e| e.to_string())?;
        settle(&bus, &mut doc);
    }
    if let Err(err) = doc.convert() {
        log::warn!(target: "pageload", "conversion failed: {err}");
    }
    settle(&bus, &mut doc);

    let status = doc.status();
    if status == ContentStatus::Done {
        print!("{}", doc.debug_dump());
    }
    drop(doc);
    env.shutdown();
    Ok(status)
}

fn main() -> ExitCode {
    init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(path) = args.first() else {
        eprintln!("usage: pageload FILE [WIDTH HEIGHT]");
        return ExitCode::from(2);
    };
    match run(path, parse_viewport(&args[1..])) {
        Ok(ContentStatus::Done) => ExitCode::SUCCESS,
        Ok(status) => {
            eprintln!("document ended in {status:?}");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
