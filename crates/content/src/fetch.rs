//! Sub-resource fetch bookkeeping.
//!
//! Invariants:
//! - `active` counts the document's own stream (until released) plus every
//!   entry in `pending`. Each started fetch leaves `pending` exactly once,
//!   through `finish` or `cancel`, and that is the only place it is
//!   decremented.
//! - Events for ids no longer in `pending` (cancelled, or from before a
//!   reparse) are ignored by the caller.

use bus::{ContentPorts, FetchCommand};
use core_types::{ContentId, FetchId, ResourceKind};
use std::collections::HashMap;
use url::Url;

/// What a finished fetch feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchPurpose {
    Stylesheet { slot: usize },
    Script { index: usize },
    Object { index: usize },
}

#[derive(Debug)]
pub struct PendingFetch {
    pub purpose: FetchPurpose,
    pub url: Url,
    pub kind: ResourceKind,
    pub body: Vec<u8>,
}

/// Schemes that count as secure for mixed-content reporting.
pub fn is_insecure_url(url: &Url) -> bool {
    !matches!(url.scheme(), "https" | "data" | "resource")
}

pub struct FetchCoordinator {
    content_id: ContentId,
    ports: ContentPorts,
    next_id: u64,
    active: usize,
    document_unit: bool,
    pending: HashMap<FetchId, PendingFetch>,
}

impl FetchCoordinator {
    /// Starts with one active unit for the document's own byte stream.
    pub fn new(content_id: ContentId, ports: ContentPorts) -> Self {
        Self {
            content_id,
            ports,
            next_id: 0,
            active: 1,
            document_unit: true,
            pending: HashMap::new(),
        }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn is_pending(&self, id: FetchId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn decrement(&mut self) {
        match self.active.checked_sub(1) {
            Some(n) => self.active = n,
            None => log::error!(
                target: "content.fetch",
                "content {}: active fetch counter underflow",
                self.content_id
            ),
        }
    }

    /// The document's own stream has ended. Returns false if it already had.
    pub fn release_document_unit(&mut self) -> bool {
        if !self.document_unit {
            return false;
        }
        self.document_unit = false;
        self.decrement();
        true
    }

    /// Count and issue a fetch. `None` if the network side has gone away, in
    /// which case nothing was counted.
    pub fn start(&mut self, url: Url, kind: ResourceKind, purpose: FetchPurpose) -> Option<FetchId> {
        let fetch_id = FetchId::next(&mut self.next_id);
        let command = FetchCommand::Start {
            content_id: self.content_id,
            fetch_id,
            url: url.to_string(),
            kind,
        };
        if self.ports.fetch_tx.send(command).is_err() {
            log::warn!(target: "content.fetch", "fetch channel closed; dropping {url}");
            return None;
        }
        self.active += 1;
        log::trace!(
            target: "content.fetch",
            "content {}: start {fetch_id} {kind:?} {url} (active {})",
            self.content_id,
            self.active
        );
        self.pending.insert(
            fetch_id,
            PendingFetch {
                purpose,
                url,
                kind,
                body: Vec::new(),
            },
        );
        Some(fetch_id)
    }

    /// Buffer body bytes. Returns false for unknown ids.
    pub fn append(&mut self, id: FetchId, bytes: &[u8]) -> bool {
        match self.pending.get_mut(&id) {
            Some(p) => {
                p.body.extend_from_slice(bytes);
                true
            }
            None => false,
        }
    }

    /// The fetch completed (successfully or not).
    pub fn finish(&mut self, id: FetchId) -> Option<PendingFetch> {
        let done = self.pending.remove(&id)?;
        self.decrement();
        log::trace!(
            target: "content.fetch",
            "content {}: settled {id} (active {})",
            self.content_id,
            self.active
        );
        Some(done)
    }

    /// Tell the network side to stop and settle the fetch locally.
    pub fn cancel(&mut self, id: FetchId) -> Option<PendingFetch> {
        let done = self.pending.remove(&id)?;
        let _ = self.ports.fetch_tx.send(FetchCommand::Cancel {
            content_id: self.content_id,
            fetch_id: id,
        });
        self.decrement();
        log::debug!(target: "content.fetch", "content {}: cancelled {id}", self.content_id);
        Some(done)
    }

    /// Cancel every pending fetch. The document unit is left alone.
    pub fn cancel_all(&mut self) -> usize {
        let mut ids: Vec<FetchId> = self.pending.keys().copied().collect();
        ids.sort();
        let n = ids.len();
        for id in ids {
            self.cancel(id);
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bus::Bus;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn counter_pairs_start_and_finish() {
        let bus = Bus::new();
        let mut f = FetchCoordinator::new(7, bus.ports());
        assert_eq!(f.active(), 1);
        let a = f
            .start(url("http://x/a.css"), ResourceKind::Css, FetchPurpose::Stylesheet { slot: 2 })
            .unwrap();
        let b = f
            .start(url("http://x/b.png"), ResourceKind::Image, FetchPurpose::Object { index: 0 })
            .unwrap();
        assert_eq!(f.active(), 3);
        assert!(f.append(a, b"body{}"));
        assert!(f.release_document_unit());
        assert!(!f.release_document_unit());
        let done = f.finish(a).unwrap();
        assert_eq!(done.body, b"body{}");
        assert!(f.finish(a).is_none());
        assert_eq!(f.active(), 1);
        f.cancel(b);
        assert_eq!(f.active(), 0);

        let commands: Vec<_> = bus.fetch_rx.try_iter().collect();
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[2], FetchCommand::Cancel { content_id: 7, fetch_id } if fetch_id == b));
    }

    #[test]
    fn closed_channel_does_not_count() {
        let bus = Bus::new();
        let ports = bus.ports();
        drop(bus);
        let mut f = FetchCoordinator::new(1, ports);
        assert!(
            f.start(url("http://x/"), ResourceKind::Script, FetchPurpose::Script { index: 0 })
                .is_none()
        );
        assert_eq!(f.active(), 1);
    }

    #[test]
    fn insecure_schemes() {
        assert!(is_insecure_url(&url("http://x/")));
        assert!(is_insecure_url(&url("file:///tmp/a")));
        assert!(!is_insecure_url(&url("https://x/")));
        assert!(!is_insecure_url(&url("data:text/plain,hi")));
    }
}
