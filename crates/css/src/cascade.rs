use crate::computed::{ComputedStyle, compute_style, default_display_for};
use crate::media::MediaContext;
use crate::syntax::{ComplexSelector, Compound, Selector, Stylesheet, parse_declarations};
use html::{Dom, NodeId};
use std::cmp::Ordering::Equal;
use std::fmt;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
struct Specificity(u16, u16, u16); // (id, class, type)

struct Candidate {
    property: String,
    value: String,
    specificity: Specificity,
    order: (u32, u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CssError {
    /// Selection needs the user-agent sheet in slot 0.
    MissingUserAgentSheet,
}

impl fmt::Display for CssError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CssError::MissingUserAgentSheet => f.write_str("no user-agent stylesheet"),
        }
    }
}

impl std::error::Error for CssError {}

fn specificity_of(selector: &ComplexSelector) -> Specificity {
    let mut spec = Specificity::default();
    for Compound(parts) in &selector.compounds {
        for part in parts {
            match part {
                Selector::Universal => {}
                Selector::Type(_) => spec.2 += 1,
                Selector::Class(_) => spec.1 += 1,
                Selector::Id(_) => spec.0 += 1,
            }
        }
    }
    spec
}

// Check if an element matches one compound
fn matches_compound(dom: &Dom, node: NodeId, compound: &Compound) -> bool {
    let Some(element) = dom.element(node) else {
        return false;
    };
    compound.0.iter().all(|selector| match selector {
        Selector::Universal => true,
        Selector::Type(t) => element.name.eq_ignore_ascii_case(t),
        Selector::Id(want) => element.attr("id") == Some(want.as_str()),
        Selector::Class(want) => element
            .attr("class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == want)),
    })
}

fn matches_selector(dom: &Dom, node: NodeId, selector: &ComplexSelector) -> bool {
    let Some((last, ancestors)) = selector.compounds.split_last() else {
        return false;
    };
    if !matches_compound(dom, node, last) {
        return false;
    }
    let mut cursor = dom.parent(node);
    for compound in ancestors.iter().rev() {
        loop {
            let Some(candidate) = cursor else {
                return false;
            };
            cursor = dom.parent(candidate);
            if matches_compound(dom, candidate, compound) {
                break;
            }
        }
    }
    true
}

pub fn is_css(content_type: Option<&str>) -> bool {
    content_type
        .map(|s| s.trim_start().to_ascii_lowercase().starts_with("text/css"))
        .unwrap_or(false)
}

/// Compiled rule set for a document: every registered sheet in slot order
/// plus the media metrics they are evaluated against.
#[derive(Debug)]
pub struct SelectionContext {
    sheets: Vec<Stylesheet>,
    media: MediaContext,
}

impl SelectionContext {
    /// `sheets[0]` must be the user-agent sheet; later sheets win ties.
    pub fn new(sheets: Vec<Stylesheet>, media: MediaContext) -> Result<Self, CssError> {
        if sheets.is_empty() {
            return Err(CssError::MissingUserAgentSheet);
        }
        Ok(Self { sheets, media })
    }

    pub fn media(&self) -> &MediaContext {
        &self.media
    }

    pub fn set_media(&mut self, media: MediaContext) {
        self.media = media;
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Cascade and compute the style of `node`.
    pub fn select(&self, dom: &Dom, node: NodeId, parent: Option<&ComputedStyle>) -> ComputedStyle {
        let Some(element) = dom.element(node) else {
            return parent
                .copied()
                .unwrap_or_else(|| ComputedStyle::initial(&self.media));
        };

        let mut candidates: Vec<Candidate> = Vec::new();
        if let Some(inline) = element.attr("style") {
            candidates.extend(parse_declarations(inline).into_iter().map(|d| Candidate {
                property: d.name,
                value: d.value,
                specificity: Specificity(u16::MAX, 0, 0),
                order: (u32::MAX, u32::MAX),
            }));
        }

        for (sheet_idx, sheet) in self.sheets.iter().enumerate() {
            for (rule_idx, rule) in sheet.rules.iter().enumerate() {
                let matched = rule
                    .selectors
                    .iter()
                    .filter(|s| matches_selector(dom, node, s))
                    .map(specificity_of)
                    .max();
                if let Some(specificity) = matched {
                    candidates.extend(rule.declarations.iter().map(|declaration| Candidate {
                        property: declaration.name.clone(),
                        value: declaration.value.clone(),
                        specificity,
                        order: (sheet_idx as u32, rule_idx as u32),
                    }));
                }
            }
        }

        // resolve winners per property
        candidates.sort_by(|a, b| match a.property.cmp(&b.property) {
            Equal => match a.specificity.cmp(&b.specificity) {
                Equal => a.order.cmp(&b.order),
                other => other,
            },
            other => other,
        });

        let mut specified: Vec<(String, String)> = Vec::new();
        let mut i = 0;
        while i < candidates.len() {
            let mut j = i;
            while j + 1 < candidates.len() && candidates[j + 1].property == candidates[i].property {
                j += 1;
            }
            let winner = &candidates[j];
            specified.push((winner.property.clone(), winner.value.clone()));
            i = j + 1;
        }

        let has_display_decl = specified.iter().any(|(prop, _)| prop == "display");
        let mut computed = compute_style(&specified, parent, &self.media);
        if !has_display_decl {
            computed.display = default_display_for(&element.name);
        }
        computed
    }
}
