/// Decode character references in text and attribute values.
///
/// Named references are limited to the common set below; numeric references
/// (`&#123;`, `&#x1F4A9;`) must be `;`-terminated. Anything unrecognised is
/// copied through unchanged.
pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut copy_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'&' {
            i += 1;
            continue;
        }
        out.push_str(&s[copy_start..i]);
        match decode_one(&s[i..]) {
            Some((ch, consumed)) => {
                out.push(ch);
                i += consumed;
            }
            None => {
                out.push('&');
                i += 1;
            }
        }
        copy_start = i;
    }
    out.push_str(&s[copy_start..]);
    out
}

const NAMED: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("copy", '\u{a9}'),
    ("reg", '\u{ae}'),
    ("hellip", '\u{2026}'),
    ("mdash", '\u{2014}'),
    ("ndash", '\u{2013}'),
    ("laquo", '\u{ab}'),
    ("raquo", '\u{bb}'),
];

// Longest decimal scalar is 1114111 (7 digits), hex 10FFFF (6 digits).
const MAX_DEC_DIGITS: usize = 7;
const MAX_HEX_DIGITS: usize = 6;

/// `input` starts at `&`. Returns the decoded char and bytes consumed.
fn decode_one(input: &str) -> Option<(char, usize)> {
    let rest = &input[1..];
    if let Some(num) = rest.strip_prefix('#') {
        let (digits, radix, prefix_len, max) = match num.strip_prefix(['x', 'X']) {
            Some(hex) => (hex, 16, 3, MAX_HEX_DIGITS),
            None => (num, 10, 2, MAX_DEC_DIGITS),
        };
        let end = digits.find(';')?;
        if end == 0 || end > max {
            return None;
        }
        let value = u32::from_str_radix(&digits[..end], radix).ok()?;
        let ch = char::from_u32(value)?;
        return Some((ch, prefix_len + end + 1));
    }

    NAMED.iter().find_map(|(name, ch)| {
        let tail = rest.strip_prefix(name)?;
        tail.starts_with(';').then_some((*ch, 1 + name.len() + 1))
    })
}

#[cfg(test)]
mod tests {
    use super::decode_entities;

    #[test]
    fn decodes_named_and_numeric() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("&nbsp;"), "\u{a0}");
    }

    #[test]
    fn leaves_malformed_references_alone() {
        assert_eq!(decode_entities("AT&T"), "AT&T");
        assert_eq!(decode_entities("&amp"), "&amp");
        assert_eq!(decode_entities("&#;"), "&#;");
        assert_eq!(decode_entities("&#x110000;"), "&#x110000;");
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
    }
}
