pub mod binding;
pub mod dom;
pub mod dom_utils;
pub mod encoding;

mod entities;
mod tokenizer;
mod tree_builder;
mod types;

use memchr::{memchr, memchr2};

/// Whether a `Content-Type` value names a document this parser handles.
pub fn is_html_mime(content_type: Option<&str>) -> bool {
    let Some(value) = content_type else {
        return false;
    };
    contains_ignore_ascii_case(value, b"text/html")
        || contains_ignore_ascii_case(value, b"application/xhtml+xml")
}

fn contains_ignore_ascii_case(haystack: &str, needle: &[u8]) -> bool {
    let hay = haystack.as_bytes();
    let n = needle.len();
    if n == 0 {
        return true;
    }
    let hay_len = hay.len();
    if hay_len < n {
        return false;
    }
    let first = needle[0];
    let (a, b) = if first.is_ascii_alphabetic() {
        (first.to_ascii_lowercase(), first.to_ascii_uppercase())
    } else {
        (first, first)
    };
    let mut i = 0;
    while i + n <= hay_len {
        let rel = if a == b {
            memchr(a, &hay[i..])
        } else {
            memchr2(a, b, &hay[i..])
        };
        let Some(rel) = rel else {
            return false;
        };
        let pos = i + rel;
        if pos + n <= hay_len && hay[pos..pos + n].eq_ignore_ascii_case(needle) {
            return true;
        }
        i = pos + 1;
    }
    false
}

/// Parse a complete byte buffer fed in `chunks`, skipping scripts.
///
/// Encoding changes are honoured by reparsing, as a document would.
pub fn parse_chunked<'a>(
    chunks: impl IntoIterator<Item = &'a [u8]> + Clone,
    params: BindingParams,
) -> Result<Dom, ParseError> {
    let mut params = params;
    params.enable_scripting = false;
    match parse_chunked_once(chunks.clone(), params.clone()) {
        Err(ParseError::EncodingChanged { label }) => {
            params.encoding = Some(label);
            parse_chunked_once(chunks, params)
        }
        other => other,
    }
}

fn parse_chunked_once<'a>(
    chunks: impl IntoIterator<Item = &'a [u8]>,
    params: BindingParams,
) -> Result<Dom, ParseError> {
    let (mut binding, mut dom) = ParserBinding::new(params)?;
    for chunk in chunks {
        binding.parse_chunk(&mut dom, chunk)?;
    }
    binding.complete(&mut dom)?;
    Ok(dom)
}

/// Parse a whole document held in memory.
pub fn parse_document(bytes: &[u8], params: BindingParams) -> Result<Dom, ParseError> {
    parse_chunked([bytes], params)
}

pub use crate::binding::{BindingParams, ParseError, ParseProgress, ParserBinding};
pub use crate::dom::{Dom, DomError, ElementData, Mutation, MutationKind, Node, NodeId, NodeKind};
pub use crate::tokenizer::{Tokenizer, tokenize};
pub use crate::tree_builder::charset_from_content_type;
pub use crate::types::{Attribute, Token};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_mime_detection() {
        assert!(is_html_mime(Some("text/html; charset=utf-8")));
        assert!(is_html_mime(Some("Application/XHTML+XML")));
        assert!(!is_html_mime(Some("text/plain")));
        assert!(!is_html_mime(None));
    }

    #[test]
    fn parse_document_follows_meta_charset() {
        let dom = parse_document(
            b"<meta charset=utf-8><title>caf\xC3\xA9</title>",
            BindingParams::default(),
        )
        .unwrap();
        let head = dom.head().unwrap();
        let title = dom.elements_named(head, "title")[0];
        assert_eq!(dom.text_content(title), "caf\u{e9}");
    }
}
