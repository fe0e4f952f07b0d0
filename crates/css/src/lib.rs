pub mod cascade;
pub mod computed;
pub mod media;
pub mod syntax;
pub mod values;

// Re-exports so other crates can just use `css::...` nicely.
pub use cascade::{CssError, SelectionContext, is_css};
pub use computed::{BoxMetrics, ComputedStyle, compute_style, default_display_for};
pub use media::MediaContext;
pub use syntax::{Declaration, Rule, Selector, Stylesheet, parse_declarations, parse_stylesheet};
pub use values::{Display, Length, parse_color, parse_display, parse_length};

/// Builtin user-agent sheet (slot 0).
pub const UA_STYLESHEET: &str = "\
html, body, div, p, ul, ol, li, h1, h2, h3, h4, h5, h6, form, table, pre, blockquote { display: block }
body { margin: 8px }
p, ul, ol, pre, blockquote, form { margin-top: 1em; margin-bottom: 1em }
ul, ol { padding-left: 40px }
h1 { font-size: 2em; margin-top: 0.67em; margin-bottom: 0.67em }
h2 { font-size: 1.5em; margin-top: 0.83em; margin-bottom: 0.83em }
h3 { font-size: 1.17em; margin-top: 1em; margin-bottom: 1em }
a { color: blue }
";

/// Extra rules for documents in quirks mode (slot 1).
pub const QUIRKS_STYLESHEET: &str = "\
form { margin-bottom: 1em }
table { font-size: 1em }
";
