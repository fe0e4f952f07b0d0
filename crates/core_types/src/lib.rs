use std::fmt;

pub type ContentId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchId(pub u64);

impl FetchId {
    pub fn next(counter: &mut u64) -> Self {
        *counter = counter.wrapping_add(1).max(1);
        Self(*counter)
    }
}

impl fmt::Display for FetchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Html,
    Css,
    Script,
    Image,
    Object,
}

/// Lifecycle of a content. Transitions only move forward:
/// `Loading -> Ready -> Done`, or any non-terminal state to `Error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentStatus {
    Loading,
    Ready,
    Done,
    Error,
}

impl ContentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ContentStatus::Done | ContentStatus::Error)
    }

    /// Whether moving from `self` to `next` respects the monotonic ordering.
    pub fn can_transition_to(self, next: ContentStatus) -> bool {
        match (self, next) {
            (ContentStatus::Done | ContentStatus::Error, _) => false,
            (_, ContentStatus::Error) => true,
            (ContentStatus::Loading, ContentStatus::Ready | ContentStatus::Done) => true,
            (ContentStatus::Ready, ContentStatus::Done) => true,
            _ => false,
        }
    }
}

/// Where the document encoding came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodingSource {
    /// `charset` parameter of the transport content type.
    Header,
    /// Byte order mark or `<meta>` declaration found in the document.
    Detected,
    /// Nothing was declared; the fallback was used.
    Default,
}

impl EncodingSource {
    pub fn label(self) -> &'static str {
        match self {
            EncodingSource::Header => "declared",
            EncodingSource::Detected => "sniffed",
            EncodingSource::Default => "default",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// An area in document coordinates (CSS px).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_are_monotonic() {
        use ContentStatus::*;
        assert!(Loading.can_transition_to(Ready));
        assert!(Loading.can_transition_to(Done));
        assert!(Ready.can_transition_to(Done));
        assert!(Ready.can_transition_to(Error));
        assert!(!Ready.can_transition_to(Loading));
        assert!(!Done.can_transition_to(Error));
        assert!(!Error.can_transition_to(Done));
    }

    #[test]
    fn fetch_ids_skip_zero_on_wrap() {
        let mut counter = u64::MAX;
        assert_eq!(FetchId::next(&mut counter), FetchId(1));
    }
}
