use core_types::{ContentId, ContentStatus, FetchId, Rect, ResourceKind};
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

/// Document -> network layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchCommand {
    Start {
        content_id: ContentId,
        fetch_id: FetchId,
        url: String,
        kind: ResourceKind,
    },
    Cancel {
        content_id: ContentId,
        fetch_id: FetchId,
    },
}

/// Network layer -> document. Every `Start` is answered by exactly one
/// `Done` or `Error` unless it was cancelled first.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Chunk {
        content_id: ContentId,
        fetch_id: FetchId,
        bytes: Vec<u8>,
    },
    Done {
        content_id: ContentId,
        fetch_id: FetchId,
    },
    Error {
        content_id: ContentId,
        fetch_id: FetchId,
        error: String,
    },
}

impl FetchEvent {
    pub fn fetch_id(&self) -> FetchId {
        match self {
            FetchEvent::Chunk { fetch_id, .. }
            | FetchEvent::Done { fetch_id, .. }
            | FetchEvent::Error { fetch_id, .. } => *fetch_id,
        }
    }

    pub fn content_id(&self) -> ContentId {
        match self {
            FetchEvent::Chunk { content_id, .. }
            | FetchEvent::Done { content_id, .. }
            | FetchEvent::Error { content_id, .. } => *content_id,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NoMemory,
    Encoding,
    Dom,
    BoxConvert,
    /// User or programmatic abort. Not a fault.
    Stopped,
    Css,
    ImageMap,
    Url,
    Parse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NoMemory => "out of memory",
            ErrorKind::Encoding => "unsupported encoding",
            ErrorKind::Dom => "document structure error",
            ErrorKind::BoxConvert => "box conversion failed",
            ErrorKind::Stopped => "stopped",
            ErrorKind::Css => "stylesheet error",
            ErrorKind::ImageMap => "image map error",
            ErrorKind::Url => "invalid url",
            ErrorKind::Parse => "parse error",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rfc5988Link {
    pub rel: String,
    pub href: String,
    pub hreflang: Option<String>,
    pub link_type: Option<String>,
    pub media: Option<String>,
    pub sizes: Option<String>,
}

/// Document -> embedding environment.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentEvent {
    Status {
        content_id: ContentId,
        status: ContentStatus,
    },
    StatusText {
        content_id: ContentId,
        text: String,
    },
    Redraw {
        content_id: ContentId,
        area: Rect,
    },
    Error {
        content_id: ContentId,
        report: ErrorReport,
    },
    Refresh {
        content_id: ContentId,
        delay_secs: u32,
        url: String,
    },
    Title {
        content_id: ContentId,
        title: String,
    },
    Link {
        content_id: ContentId,
        link: Rfc5988Link,
    },
}

impl ContentEvent {
    pub fn content_id(&self) -> ContentId {
        match self {
            ContentEvent::Status { content_id, .. }
            | ContentEvent::StatusText { content_id, .. }
            | ContentEvent::Redraw { content_id, .. }
            | ContentEvent::Error { content_id, .. }
            | ContentEvent::Refresh { content_id, .. }
            | ContentEvent::Title { content_id, .. }
            | ContentEvent::Link { content_id, .. } => *content_id,
        }
    }
}

/// Sending halves a document uses; the receiving halves stay with the
/// embedding environment.
#[derive(Clone)]
pub struct ContentPorts {
    pub fetch_tx: Sender<FetchCommand>,
    pub event_tx: Sender<ContentEvent>,
}

pub struct Bus {
    pub fetch_tx: Sender<FetchCommand>,
    pub fetch_rx: Receiver<FetchCommand>,
    pub event_tx: Sender<ContentEvent>,
    pub event_rx: Receiver<ContentEvent>,
}

impl Bus {
    pub fn new() -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            fetch_tx,
            fetch_rx,
            event_tx,
            event_rx,
        }
    }

    pub fn ports(&self) -> ContentPorts {
        ContentPorts {
            fetch_tx: self.fetch_tx.clone(),
            event_tx: self.event_tx.clone(),
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
