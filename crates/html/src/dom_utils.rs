use crate::dom::{Dom, NodeId, NodeKind};

/// Collapse runs of ASCII whitespace to one space and trim both ends.
pub fn squash_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_ascii_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Whether the `rel` attribute value contains `token` (space separated,
/// ASCII case-insensitive).
pub fn rel_contains(rel: &str, token: &str) -> bool {
    rel.split_ascii_whitespace()
        .any(|t| t.eq_ignore_ascii_case(token))
}

/// Elements that never generate boxes.
pub fn is_non_rendering_element(dom: &Dom, id: NodeId) -> bool {
    dom.tag_name(id).is_some_and(|n| {
        matches!(
            n,
            "head" | "style" | "script" | "title" | "meta" | "link" | "base" | "map" | "area"
        )
    })
}

/// Collect `<img src>` values in document order.
pub fn collect_img_srcs(dom: &Dom, root: NodeId) -> Vec<String> {
    dom.elements_named(root, "img")
        .into_iter()
        .filter_map(|img| dom.attr(img, "src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(str::to_string)
        .collect()
}

/// Indented outline of the subtree at `root`, at most `cap` lines.
pub fn outline_from_dom(dom: &Dom, root: NodeId, cap: usize) -> Vec<String> {
    fn walk(dom: &Dom, id: NodeId, depth: usize, out: &mut Vec<String>, left: &mut usize) {
        if *left == 0 {
            return;
        }
        let Some(node) = dom.get(id) else {
            return;
        };
        *left -= 1;
        let indent = "  ".repeat(depth);
        match &node.kind {
            NodeKind::Document { doctype, .. } => match doctype {
                Some(dt) => out.push(format!("{indent}<!DOCTYPE {dt}>")),
                None => out.push(format!("{indent}#document")),
            },
            NodeKind::Element(data) => {
                let mut line = format!("{indent}<{}", data.name);
                for key in ["id", "class"] {
                    if let Some(v) = data.attr(key).filter(|v| !v.is_empty()) {
                        line.push_str(&format!(r#" {key}="{v}""#));
                    }
                }
                line.push('>');
                out.push(line);
            }
            NodeKind::Text(text) => {
                let t = squash_whitespace(text);
                if !t.is_empty() {
                    out.push(format!("{indent}\"{}\"", ellipsize(&t, 40)));
                }
            }
            NodeKind::Comment(text) => {
                let t = text.replace('\n', " ");
                out.push(format!("{indent}<!-- {} -->", ellipsize(&t, 40)));
            }
        }
        for &child in node.children() {
            walk(dom, child, depth + 1, out, left);
        }
    }

    let mut out = Vec::new();
    let mut left = cap;
    walk(dom, root, 0, &mut out, &mut left);
    out
}

fn ellipsize(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &s[..cut]),
        None => s.to_string(),
    }
}

/// Deterministic one-node-per-line dump used by `Debug` and parity tests.
pub fn serialize(dom: &Dom, root: NodeId) -> String {
    let mut out = String::new();
    for id in dom.descendants(root) {
        let mut depth = 0;
        let mut cur = dom.parent(id);
        while let Some(p) = cur {
            if p == root {
                depth += 1;
                break;
            }
            depth += 1;
            cur = dom.parent(p);
        }
        let Some(node) = dom.get(id) else {
            continue;
        };
        out.push_str(&"  ".repeat(depth));
        match &node.kind {
            NodeKind::Document { doctype, quirks } => {
                out.push_str("#document");
                if let Some(dt) = doctype {
                    out.push_str(&format!(" doctype={dt:?}"));
                }
                if *quirks {
                    out.push_str(" quirks");
                }
            }
            NodeKind::Element(data) => {
                out.push('<');
                out.push_str(&data.name);
                for (k, v) in &data.attributes {
                    out.push_str(&format!(" {k}={v:?}"));
                }
                out.push('>');
            }
            NodeKind::Text(text) => out.push_str(&format!("#text {text:?}")),
            NodeKind::Comment(text) => out.push_str(&format!("#comment {text:?}")),
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squash_collapses_and_trims() {
        assert_eq!(squash_whitespace("  A \n\t title  "), "A title");
        assert_eq!(squash_whitespace(" \n "), "");
    }

    #[test]
    fn rel_tokens_are_case_insensitive() {
        assert!(rel_contains("Alternate StyleSheet", "stylesheet"));
        assert!(!rel_contains("stylesheets", "stylesheet"));
    }

    #[test]
    fn serialize_indents_children() {
        let mut dom = Dom::new();
        let html = dom.create_element("html");
        let text = dom.create_text("hi");
        dom.append_child(dom.document(), html).unwrap();
        dom.append_child(html, text).unwrap();
        assert_eq!(
            serialize(&dom, dom.document()),
            "#document\n  <html>\n    #text \"hi\"\n"
        );
    }
}
