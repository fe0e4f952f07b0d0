//! Streaming HTML tokenizer with a constrained, practical tag-name character set.
//!
//! Supported tag-name characters (ASCII only): `[A-Za-z0-9:_-]`.
//! Attribute names use the same ASCII character class.
//!
//! Decoded text is appended with `push_str`; `next_token` only returns a token
//! once the construct is complete, so the token sequence is identical however
//! the input was split. A text run is held back until the markup that ends it
//! has arrived (or the stream is finished). Raw text inside `script`/`style`
//! (and RCDATA inside `title`/`textarea`) is held until the matching close tag.
//!
//! Known limitations (intentional):
//! - Not a full HTML5 tokenizer state machine (no spec parse-error recovery).
//! - Rawtext close-tag scanning accepts only ASCII whitespace before `>`.
use crate::entities::decode_entities;
use crate::types::{Attribute, Token};
use memchr::memchr;

const HTML_COMMENT_START: &str = "<!--";
const HTML_COMMENT_END: &str = "-->";
const DOCTYPE_START: &[u8] = b"<!doctype";
const COMPACT_THRESHOLD: usize = 8 * 1024;

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

/// `rest` is a strict prefix of `pattern`, so more input could complete it.
fn is_partial_prefix(rest: &[u8], pattern: &[u8]) -> bool {
    rest.len() < pattern.len() && pattern[..rest.len()].eq_ignore_ascii_case(rest)
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':'
}

fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "frame"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RawText {
    name: &'static str,
    decode: bool,
}

fn raw_text_for(name: &str) -> Option<RawText> {
    match name {
        "script" => Some(RawText {
            name: "script",
            decode: false,
        }),
        "style" => Some(RawText {
            name: "style",
            decode: false,
        }),
        "title" => Some(RawText {
            name: "title",
            decode: true,
        }),
        "textarea" => Some(RawText {
            name: "textarea",
            decode: true,
        }),
        _ => None,
    }
}

enum MarkupStart {
    Yes,
    No,
    NeedMore,
}

fn markup_starts_at(bytes: &[u8], i: usize) -> MarkupStart {
    match bytes.get(i + 1) {
        None => MarkupStart::NeedMore,
        Some(c) if c.is_ascii_alphabetic() || matches!(c, b'/' | b'!' | b'?') => MarkupStart::Yes,
        Some(_) => MarkupStart::No,
    }
}

enum CloseScan {
    Found { start: usize, end: usize },
    Partial,
    NotFound,
}

// It only attempts matches starting at ASCII `<`, which cannot appear inside
// a UTF-8 continuation byte, so every slice endpoint is a char boundary.
fn scan_close_tag(hay: &[u8], name: &str) -> CloseScan {
    let name = name.as_bytes();
    let mut i = 0;
    while i < hay.len() {
        let Some(rel) = memchr(b'<', &hay[i..]) else {
            return CloseScan::NotFound;
        };
        i += rel;
        let tail = &hay[i..];
        let want = 2 + name.len();
        if tail.len() < want {
            let prefix_ok = tail.len() < 2 || tail[1] == b'/';
            let name_part = &tail[tail.len().min(2)..];
            if prefix_ok && name[..name_part.len()].eq_ignore_ascii_case(name_part) {
                return CloseScan::Partial;
            }
            return CloseScan::NotFound;
        }
        if tail[1] == b'/' && tail[2..want].eq_ignore_ascii_case(name) {
            let mut k = i + want;
            while k < hay.len() && hay[k].is_ascii_whitespace() {
                k += 1;
            }
            if k == hay.len() {
                return CloseScan::Partial;
            }
            if hay[k] == b'>' {
                return CloseScan::Found { start: i, end: k + 1 };
            }
        }
        i += 1;
    }
    CloseScan::NotFound
}

/// Index of the `>` closing a start tag beginning at `start`, ignoring `>`
/// inside quoted attribute values.
fn find_tag_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut after_eq = false;
    let mut i = start + 1;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                    after_eq = false;
                }
            }
            None => match b {
                b'>' => return Some(i),
                b'"' | b'\'' if after_eq => quote = Some(b),
                b'=' => after_eq = true,
                _ if b.is_ascii_whitespace() => {}
                _ => after_eq = false,
            },
        }
        i += 1;
    }
    None
}

/// Parse the inside of a start tag (`name attr=value ...`, without `<`/`>`).
fn parse_start_tag(inner: &str) -> Token {
    let bytes = inner.as_bytes();
    let len = bytes.len();
    let mut j = 0;
    while j < len && is_name_char(bytes[j]) {
        j += 1;
    }
    let name = inner[..j].to_ascii_lowercase();
    let mut k = j;
    let mut attributes: Vec<Attribute> = Vec::new();
    let mut self_closing = false;

    let skip_whitespace = |k: &mut usize| {
        while *k < len && bytes[*k].is_ascii_whitespace() {
            *k += 1;
        }
    };

    loop {
        skip_whitespace(&mut k);
        if k >= len {
            break;
        }
        if bytes[k] == b'/' {
            if k + 1 == len {
                self_closing = true;
                break;
            }
            k += 1;
            continue;
        }
        let name_start = k;
        while k < len && is_name_char(bytes[k]) {
            k += 1;
        }
        if name_start == k {
            k += 1;
            continue;
        }
        let attribute_name = inner[name_start..k].to_ascii_lowercase();

        skip_whitespace(&mut k);
        let value = if k < len && bytes[k] == b'=' {
            k += 1;
            skip_whitespace(&mut k);
            if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                let quote = bytes[k];
                k += 1;
                let vstart = k;
                while k < len && bytes[k] != quote {
                    k += 1;
                }
                let raw = &inner[vstart..k];
                if k < len {
                    k += 1;
                }
                Some(decode_entities(raw))
            } else {
                let vstart = k;
                while k < len && !bytes[k].is_ascii_whitespace() {
                    if bytes[k] == b'/' && k + 1 == len {
                        break;
                    }
                    k += 1;
                }
                Some(decode_entities(&inner[vstart..k]))
            }
        } else {
            None
        };
        // First occurrence wins, as in HTML.
        if !attributes.iter().any(|(n, _)| *n == attribute_name) {
            attributes.push((attribute_name, value));
        }
    }

    if is_void_element(&name) {
        self_closing = true;
    }

    Token::StartTag {
        name,
        attributes,
        self_closing,
    }
}

#[derive(Debug, Default)]
pub struct Tokenizer {
    buf: String,
    pos: usize,
    raw: Option<RawText>,
    pending_end: Option<String>,
    eof: bool,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append decoded text.
    pub fn push_str(&mut self, text: &str) {
        debug_assert!(!self.eof, "input pushed after end of stream");
        self.buf.push_str(text);
    }

    /// No more input will arrive; held-back constructs are flushed.
    pub fn finish(&mut self) {
        self.eof = true;
    }

    pub fn is_finished(&self) -> bool {
        self.eof
    }

    /// Whether every buffered byte has been turned into tokens.
    pub fn is_drained(&self) -> bool {
        self.pos >= self.buf.len() && self.pending_end.is_none() && self.raw.is_none()
    }

    pub fn next_token(&mut self) -> Option<Token> {
        let token = self.next_token_inner();
        if self.pos > COMPACT_THRESHOLD && self.pos * 2 > self.buf.len() {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
        if let Some(t) = &token {
            log::trace!(target: "html.tokenizer", "emit token: {t:?}");
        }
        token
    }

    fn next_token_inner(&mut self) -> Option<Token> {
        loop {
            if let Some(end) = self.pending_end.take() {
                return Some(Token::EndTag(end));
            }
            if let Some(raw) = self.raw {
                return self.next_raw(raw);
            }
            if self.pos >= self.buf.len() {
                if self.eof && !self.buf.is_empty() {
                    self.buf.clear();
                    self.pos = 0;
                }
                return None;
            }

            let bytes = &self.buf.as_bytes()[self.pos..];
            if bytes[0] != b'<' || matches!(markup_starts_at(bytes, 0), MarkupStart::No) {
                return self.next_text();
            }
            if matches!(markup_starts_at(bytes, 0), MarkupStart::NeedMore) {
                if self.eof {
                    return self.next_text();
                }
                return None;
            }

            match self.next_markup() {
                Markup::Token(t) => return Some(t),
                Markup::Skipped => continue,
                Markup::NeedMore => return None,
            }
        }
    }

    fn next_text(&mut self) -> Option<Token> {
        let bytes = &self.buf.as_bytes()[self.pos..];
        let mut i = 0;
        let end = loop {
            let Some(rel) = memchr(b'<', &bytes[i..]) else {
                if !self.eof {
                    return None;
                }
                break bytes.len();
            };
            let at = i + rel;
            match markup_starts_at(bytes, at) {
                MarkupStart::Yes if at > 0 => break at,
                MarkupStart::NeedMore if !self.eof => return None,
                MarkupStart::NeedMore => break bytes.len(),
                _ => i = at + 1,
            }
        };
        let raw = &self.buf[self.pos..self.pos + end];
        let decoded = decode_entities(raw);
        self.pos += end;
        Some(Token::Text(decoded))
    }

    fn next_raw(&mut self, raw: RawText) -> Option<Token> {
        let hay = &self.buf.as_bytes()[self.pos..];
        let (text_end, consumed) = match scan_close_tag(hay, raw.name) {
            CloseScan::Found { start, end } => (start, end),
            CloseScan::Partial | CloseScan::NotFound if self.eof => (hay.len(), hay.len()),
            CloseScan::Partial | CloseScan::NotFound => return None,
        };
        let body = &self.buf[self.pos..self.pos + text_end];
        let text = if raw.decode {
            decode_entities(body)
        } else {
            body.to_string()
        };
        self.pos += consumed;
        self.raw = None;
        if text.is_empty() {
            return Some(Token::EndTag(raw.name.to_string()));
        }
        self.pending_end = Some(raw.name.to_string());
        Some(Token::Text(text))
    }

    fn next_markup(&mut self) -> Markup {
        let eof = self.eof;
        let bytes = &self.buf.as_bytes()[self.pos..];
        let rest = &self.buf[self.pos..];
        let remaining = rest.len();

        if rest.starts_with(HTML_COMMENT_START) {
            let body_start = HTML_COMMENT_START.len();
            return match rest[body_start..].find(HTML_COMMENT_END) {
                Some(e) => {
                    let text = rest[body_start..body_start + e].to_string();
                    self.pos += body_start + e + HTML_COMMENT_END.len();
                    Markup::Token(Token::Comment(text))
                }
                None if eof => {
                    let text = rest[body_start..].to_string();
                    self.pos += rest.len();
                    Markup::Token(Token::Comment(text))
                }
                None => Markup::NeedMore,
            };
        }
        if !eof
            && (is_partial_prefix(bytes, HTML_COMMENT_START.as_bytes())
                || is_partial_prefix(bytes, DOCTYPE_START))
        {
            return Markup::NeedMore;
        }

        let Some(close) = memchr(b'>', bytes) else {
            return self.unterminated_markup(remaining);
        };

        if starts_with_ignore_ascii_case_at(bytes, 0, DOCTYPE_START) {
            let doctype = rest[DOCTYPE_START.len()..close].trim().to_string();
            self.pos += close + 1;
            return Markup::Token(Token::Doctype(doctype));
        }

        match bytes[1] {
            b'!' | b'?' => {
                let text = rest[2..close].to_string();
                self.pos += close + 1;
                Markup::Token(Token::Comment(text))
            }
            b'/' => {
                let name_end = 2 + bytes[2..close]
                    .iter()
                    .take_while(|&&c| is_name_char(c))
                    .count();
                let name = rest[2..name_end].to_ascii_lowercase();
                self.pos += close + 1;
                if name.is_empty() {
                    return Markup::Skipped;
                }
                Markup::Token(Token::EndTag(name))
            }
            _ => {
                let Some(end) = find_tag_end(bytes, 0) else {
                    return self.unterminated_markup(remaining);
                };
                let token = parse_start_tag(&rest[1..end]);
                self.pos += end + 1;
                if let Token::StartTag {
                    name, self_closing, ..
                } = &token
                {
                    if !*self_closing {
                        self.raw = raw_text_for(name);
                    }
                }
                Markup::Token(token)
            }
        }
    }

    fn unterminated_markup(&mut self, len: usize) -> Markup {
        if !self.eof {
            return Markup::NeedMore;
        }
        // EOF inside a tag: the partial tag is dropped.
        self.pos += len;
        Markup::Skipped
    }
}

enum Markup {
    Token(Token),
    Skipped,
    NeedMore,
}

/// Tokenize a complete document.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new();
    tokenizer.push_str(input);
    tokenizer.finish();
    std::iter::from_fn(|| tokenizer.next_token()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_chunked(input: &str, size: usize) -> Vec<Token> {
        let mut tokenizer = Tokenizer::new();
        let mut out = Vec::new();
        let mut start = 0;
        while start < input.len() {
            let mut end = (start + size).min(input.len());
            while !input.is_char_boundary(end) {
                end += 1;
            }
            tokenizer.push_str(&input[start..end]);
            out.extend(std::iter::from_fn(|| tokenizer.next_token()));
            start = end;
        }
        tokenizer.finish();
        out.extend(std::iter::from_fn(|| tokenizer.next_token()));
        out
    }

    #[test]
    fn tokenize_preserves_utf8_text_nodes() {
        let tokens = tokenize("<p>120×32</p>");
        assert!(
            tokens
                .iter()
                .any(|t| matches!(t, Token::Text(s) if s == "120×32")),
            "expected UTF-8 text token, got: {tokens:?}"
        );
    }

    #[test]
    fn tokenize_handles_mixed_case_doctype() {
        let tokens = tokenize("<!DoCtYpE html>");
        assert_eq!(tokens, vec![Token::Doctype("html".to_string())]);
    }

    #[test]
    fn tokenize_finds_script_end_tag_case_insensitive() {
        let tokens = tokenize("<script>let x = 1 < 2;</ScRiPt>");
        assert_eq!(
            tokens,
            vec![
                Token::StartTag {
                    name: "script".to_string(),
                    attributes: Vec::new(),
                    self_closing: false
                },
                Token::Text("let x = 1 < 2;".to_string()),
                Token::EndTag("script".to_string()),
            ]
        );
    }

    #[test]
    fn quoted_gt_does_not_end_tag() {
        let tokens = tokenize(r#"<a title="x>y" href='/z'>t</a>"#);
        let Token::StartTag { attributes, .. } = &tokens[0] else {
            panic!("expected start tag, got {tokens:?}");
        };
        assert_eq!(
            attributes,
            &vec![
                ("title".to_string(), Some("x>y".to_string())),
                ("href".to_string(), Some("/z".to_string())),
            ]
        );
    }

    #[test]
    fn lone_lt_stays_in_text() {
        let tokens = tokenize("a < b <b>c</b>");
        assert_eq!(tokens[0], Token::Text("a < b ".to_string()));
    }

    #[test]
    fn title_is_rcdata() {
        let tokens = tokenize("<title>A &amp; <b>B</b></title>");
        assert_eq!(tokens[1], Token::Text("A & <b>B</b>".to_string()));
    }

    #[test]
    fn chunking_never_changes_tokens() {
        let input = concat!(
            "<!DOCTYPE html><html><head><title>T &amp; t</title>",
            "<meta http-equiv=\"refresh\" content=\"3;url=/next\">",
            "<script>if (a < b) { x = '</scr' + 'ipt>'; }</script>",
            "<!-- note --></head><body a=1 b='2' c=\"3>\">café 😀 &lt;ok&gt; < 5",
            "<img src=x.png><br/></body></html>"
        );
        let whole = tokenize(input);
        for size in [1, 2, 3, 4, 7, 16, 64] {
            assert_eq!(tokens_chunked(input, size), whole, "chunk size {size}");
        }
    }

    #[test]
    fn unterminated_tag_at_eof_is_dropped() {
        let tokens = tokenize("hello<div class=");
        assert_eq!(tokens, vec![Token::Text("hello".to_string())]);
    }
}
