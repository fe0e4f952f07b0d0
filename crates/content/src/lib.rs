//! HTML document content: drives parsing, sub-resource fetches, scripts
//! and box conversion for one document, and answers queries about it.

pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod forms;
pub mod frames;
pub mod head;
pub mod host;
pub mod objects;
pub mod refresh;
pub mod scripts;
pub mod stylesheets;

pub use bus::ErrorKind;
pub use config::{ContentConfig, ContentEnvironment};
pub use document::{CreateParams, ElementTag, HtmlDocument, Refresh};
pub use error::ContentError;
pub use fetch::is_insecure_url;
pub use forms::{Form, FormMethod};
pub use frames::{Frame, FrameDimension, FrameItem, Frameset, Iframe, Scrolling};
pub use head::is_valid_base_target;
pub use host::{Embedder, ScriptThread};
pub use html::is_html_mime;
pub use refresh::{RefreshDirective, parse_refresh};
