//! `<meta http-equiv="refresh">` content grammar.
//!
//! ```text
//! content = *WS 1*DIGIT *( "." / DIGIT ) *WS [ ";" ] *WS
//!           [ "url" *WS "=" *WS ( quoted | unquoted ) ]
//! ```

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshDirective {
    /// Whole seconds, never below 1.
    pub delay_secs: u32,
    /// Target as written; `None` means reload the current URL.
    pub url: Option<String>,
}

fn skip_ws(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_ascii_whitespace())
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

/// Parse a refresh `content` value. Malformed input yields `None`.
pub fn parse_refresh(content: &str) -> Option<RefreshDirective> {
    let (digits, rest) = split_digits(skip_ws(content));
    if digits.is_empty() {
        return None;
    }
    let delay = digits.parse::<u64>().unwrap_or(u64::MAX).min(u32::MAX as u64) as u32;
    // Fractional seconds are accepted and dropped.
    let rest = rest.trim_start_matches(|c: char| c == '.' || c.is_ascii_digit());
    let delay_secs = delay.max(1);

    let rest = skip_ws(rest);
    let rest = skip_ws(rest.strip_prefix(';').unwrap_or(rest));
    if rest.is_empty() {
        return Some(RefreshDirective {
            delay_secs,
            url: None,
        });
    }

    let keyword = rest.get(..3)?;
    if !keyword.eq_ignore_ascii_case("url") {
        return None;
    }
    let rest = skip_ws(&rest[3..]);
    let rest = skip_ws(rest.strip_prefix('=')?);

    let url = match rest.chars().next()? {
        quote @ ('\'' | '"') => {
            let inner = &rest[1..];
            match inner.find(quote) {
                Some(end) => &inner[..end],
                None => inner,
            }
        }
        _ => {
            let end = rest
                .find(|c: char| c.is_ascii_whitespace())
                .unwrap_or(rest.len());
            &rest[..end]
        }
    };
    if url.is_empty() {
        return None;
    }
    Some(RefreshDirective {
        delay_secs,
        url: Some(url.to_string()),
    })
}
