use bus::{ErrorKind, ErrorReport};
use css::CssError;
use html::{DomError, ParseError};
use layout::{ConvertError, ImageMapError};
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub struct ContentError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ContentError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn stopped() -> Self {
        Self::new(ErrorKind::Stopped, "load stopped")
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind,
            message: self.message.clone(),
        }
    }
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ContentError {}

impl From<ParseError> for ContentError {
    fn from(err: ParseError) -> Self {
        let kind = match &err {
            ParseError::UnsupportedEncoding(_) | ParseError::EncodingChanged { .. } => {
                ErrorKind::Encoding
            }
            ParseError::Paused => ErrorKind::Parse,
            ParseError::Invariant(_) => ErrorKind::Dom,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<DomError> for ContentError {
    fn from(err: DomError) -> Self {
        Self::new(ErrorKind::Dom, err.to_string())
    }
}

impl From<ConvertError> for ContentError {
    fn from(err: ConvertError) -> Self {
        let kind = match err {
            ConvertError::Cancelled => ErrorKind::Stopped,
            _ => ErrorKind::BoxConvert,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<CssError> for ContentError {
    fn from(err: CssError) -> Self {
        Self::new(ErrorKind::Css, err.to_string())
    }
}

impl From<ImageMapError> for ContentError {
    fn from(err: ImageMapError) -> Self {
        Self::new(ErrorKind::ImageMap, err.to_string())
    }
}

impl From<url::ParseError> for ContentError {
    fn from(err: url::ParseError) -> Self {
        Self::new(ErrorKind::Url, err.to_string())
    }
}
