// A single CSS property: "color: red"
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
}

// Simple selectors; a compound is a run of these with no whitespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    Universal,
    Type(String),  // element/tag selector
    Id(String),    // #id selector
    Class(String), // .class selector
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Compound(pub Vec<Selector>);

/// Compounds joined by the descendant combinator, outermost first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComplexSelector {
    pub compounds: Vec<Compound>,
}

// Set of selectors and declarations
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub selectors: Vec<ComplexSelector>,
    pub declarations: Vec<Declaration>,
}

// A full stylesheet: multiple rules
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Byte index of the `}` matching the `{` at `open`, if the block is closed.
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

// input: "div, #id { color: red; } .class { font-size: 12px; }"
// output: Stylesheet { rules: vec![Rule{ selectors: ..., declarations: ...}, ...] }
//
// At-rules (`@media`, `@import`, `@charset`, ...) are skipped whole.
pub fn parse_stylesheet(input: &str) -> Stylesheet {
    let source = strip_comments(input);
    let bytes = source.as_bytes();
    let mut rules = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let Some(rel) = bytes[i..].iter().position(|&b| matches!(b, b'{' | b';' | b'}')) else {
            break;
        };
        let stop = i + rel;
        let prelude = source[i..stop].trim();
        match bytes[stop] {
            b'{' => {
                // An unclosed block runs to the end of the sheet.
                let close = matching_brace(bytes, stop).unwrap_or(bytes.len());
                if !prelude.starts_with('@') {
                    if let Some(rule) = parse_rule(prelude, &source[stop + 1..close]) {
                        rules.push(rule);
                    }
                }
                i = close + 1;
            }
            // Statement at-rule or stray terminator.
            _ => i = stop + 1,
        }
    }
    Stylesheet { rules }
}

fn parse_rule(prelude: &str, body: &str) -> Option<Rule> {
    let mut selectors = Vec::new();
    for part in prelude.split(',') {
        // One invalid selector invalidates the whole rule.
        selectors.push(parse_complex(part)?);
    }
    let declarations = parse_declarations(body);
    if selectors.is_empty() || declarations.is_empty() {
        return None;
    }
    Some(Rule {
        selectors,
        declarations,
    })
}

// input: "color: red; font-size: 12px;"
// output: vec![Declaration { name: "color", value: "red" }, Declaration { name: "font-size", value: "12px" }]
pub fn parse_declarations(input: &str) -> Vec<Declaration> {
    input
        .split(';')
        .filter_map(|pair| {
            let (n, v) = pair.split_once(':')?;
            let name = n.trim().to_ascii_lowercase();
            if name.is_empty() {
                return None;
            }
            let value = v.trim();
            let value = value
                .strip_suffix("!important")
                .map(str::trim_end)
                .unwrap_or(value);
            Some(Declaration {
                name,
                value: value.to_string(),
            })
        })
        .collect()
}

fn parse_complex(s: &str) -> Option<ComplexSelector> {
    let compounds = s
        .split_ascii_whitespace()
        .map(parse_compound)
        .collect::<Option<Vec<_>>>()?;
    if compounds.is_empty() {
        return None;
    }
    Some(ComplexSelector { compounds })
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

// input: "div.note#main", "*", ".a.b"
// output: Some(Compound(vec![Selector::Type("div"), ...]))
fn parse_compound(s: &str) -> Option<Compound> {
    let mut parts = Vec::new();
    let mut rest = s;
    if let Some(after) = rest.strip_prefix('*') {
        parts.push(Selector::Universal);
        rest = after;
    } else {
        let end = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
        if end > 0 {
            parts.push(Selector::Type(rest[..end].to_ascii_lowercase()));
            rest = &rest[end..];
        }
    }
    while let Some(marker) = rest.chars().next() {
        let body = &rest[marker.len_utf8()..];
        let end = body.find(|c: char| !is_ident_char(c)).unwrap_or(body.len());
        if end == 0 {
            return None;
        }
        let ident = body[..end].to_string();
        match marker {
            '#' => parts.push(Selector::Id(ident)),
            '.' => parts.push(Selector::Class(ident)),
            // Combinators, attribute selectors and pseudo-classes are not supported.
            _ => return None,
        }
        rest = &body[end..];
    }
    if parts.is_empty() {
        return None;
    }
    Some(Compound(parts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_and_descendant_selectors() {
        let sheet = parse_stylesheet("ul li.item#first, p { color: red }");
        assert_eq!(sheet.rules.len(), 1);
        let first = &sheet.rules[0].selectors[0];
        assert_eq!(first.compounds.len(), 2);
        assert_eq!(
            first.compounds[1],
            Compound(vec![
                Selector::Type("li".to_string()),
                Selector::Class("item".to_string()),
                Selector::Id("first".to_string()),
            ])
        );
    }

    #[test]
    fn skips_comments_and_at_rules() {
        let sheet = parse_stylesheet(
            "@charset \"utf-8\"; /* a { color: red } */ @media print { p { color: red } } b { color: blue }",
        );
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(
            sheet.rules[0].selectors[0].compounds[0],
            Compound(vec![Selector::Type("b".to_string())])
        );
    }

    #[test]
    fn unsupported_selector_drops_rule() {
        let sheet = parse_stylesheet("a > b { color: red } a:hover { color: red } i { color: red }");
        assert_eq!(sheet.rules.len(), 1);
    }

    #[test]
    fn important_suffix_is_ignored() {
        let decls = parse_declarations("color: red !important; margin-top:4px");
        assert_eq!(decls[0].value, "red");
        assert_eq!(decls[1].name, "margin-top");
    }
}
