use crate::media::MediaContext;
use crate::values::{Display, Length, parse_color, parse_display, parse_length};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxMetrics {
    // Margins in CSS px
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,

    // Padding in CSS px
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,
}

impl BoxMetrics {
    pub fn zero() -> Self {
        Self::default()
    }
}

#[derive(Clone, Debug, Copy, PartialEq)]
pub struct ComputedStyle {
    /// Inherited. Initial: black.
    pub color: (u8, u8, u8, u8),

    /// Not inherited. Initial: transparent.
    pub background_color: (u8, u8, u8, u8),

    /// Inherited, resolved to CSS px.
    pub font_size: f32,

    /// Inherited, CSS px.
    pub line_height: f32,

    pub box_metrics: BoxMetrics,

    /// Not inherited. Elements without a declaration get a per-tag default.
    pub display: Display,

    /// Inherited.
    pub visible: bool,

    /// Not inherited; percentages resolve against the containing block in
    /// layout.
    pub width: Option<Length>,
    pub height: Option<Length>,
}

impl ComputedStyle {
    pub fn initial(media: &MediaContext) -> Self {
        let font_size = media.default_font_px();
        ComputedStyle {
            color: (0, 0, 0, 255),
            background_color: (0, 0, 0, 0),
            font_size,
            line_height: media.line_height_px(font_size),
            box_metrics: BoxMetrics::zero(),
            display: Display::Block,
            visible: true,
            width: None,
            height: None,
        }
    }
}

fn edge_px(value: &str, em_px: f32, media: &MediaContext) -> Option<f32> {
    parse_length(value)?.to_px(em_px, None, media.px_per_pt)
}

/// Compute the final, inherited style for an element, given:
/// - its winning declarations, in no particular order
/// - an optional parent computed style.
///
/// `font-size` is applied first so `em` lengths in the same element resolve
/// against the element's own size.
pub fn compute_style(
    specified: &[(String, String)],
    parent: Option<&ComputedStyle>,
    media: &MediaContext,
) -> ComputedStyle {
    let mut result = ComputedStyle::initial(media);

    if let Some(p) = parent {
        result.color = p.color;
        result.font_size = p.font_size;
        result.line_height = p.line_height;
        result.visible = p.visible;
    }

    let parent_font = result.font_size;
    if let Some((_, value)) = specified.iter().find(|(name, _)| name == "font-size") {
        if let Some(px) = parse_length(value)
            .and_then(|len| len.to_px(parent_font, Some(parent_font), media.px_per_pt))
        {
            result.font_size = px;
            result.line_height = media.line_height_px(px);
        }
    }
    let em = result.font_size;

    for (name, value) in specified {
        let value = value.as_str();
        let metrics = &mut result.box_metrics;
        match name.as_str() {
            "color" => {
                if let Some(rgba) = parse_color(value) {
                    result.color = rgba;
                }
            }
            "background-color" => {
                if let Some(rgba) = parse_color(value) {
                    result.background_color = rgba;
                }
            }
            "margin-top" => metrics.margin_top = edge_px(value, em, media).unwrap_or(metrics.margin_top),
            "margin-right" => {
                metrics.margin_right = edge_px(value, em, media).unwrap_or(metrics.margin_right)
            }
            "margin-bottom" => {
                metrics.margin_bottom = edge_px(value, em, media).unwrap_or(metrics.margin_bottom)
            }
            "margin-left" => {
                metrics.margin_left = edge_px(value, em, media).unwrap_or(metrics.margin_left)
            }
            "padding-top" => {
                metrics.padding_top = edge_px(value, em, media).unwrap_or(metrics.padding_top)
            }
            "padding-right" => {
                metrics.padding_right = edge_px(value, em, media).unwrap_or(metrics.padding_right)
            }
            "padding-bottom" => {
                metrics.padding_bottom =
                    edge_px(value, em, media).unwrap_or(metrics.padding_bottom)
            }
            "padding-left" => {
                metrics.padding_left = edge_px(value, em, media).unwrap_or(metrics.padding_left)
            }
            "margin" => {
                if let Some(px) = edge_px(value, em, media) {
                    metrics.margin_top = px;
                    metrics.margin_right = px;
                    metrics.margin_bottom = px;
                    metrics.margin_left = px;
                }
            }
            "padding" => {
                if let Some(px) = edge_px(value, em, media) {
                    metrics.padding_top = px;
                    metrics.padding_right = px;
                    metrics.padding_bottom = px;
                    metrics.padding_left = px;
                }
            }
            "display" => {
                if let Some(d) = parse_display(value) {
                    result.display = d;
                }
            }
            "visibility" => match value.trim().to_ascii_lowercase().as_str() {
                "hidden" | "collapse" => result.visible = false,
                "visible" => result.visible = true,
                _ => {}
            },
            "width" => result.width = parse_length(value),
            "height" => result.height = parse_length(value),
            _ => {
                // unsupported property → ignored
            }
        }
    }

    result
}

/// Roughly follows HTML default display types.
pub fn default_display_for(tag: &str) -> Display {
    match tag {
        "a" | "abbr" | "b" | "big" | "br" | "button" | "cite" | "code" | "em" | "font" | "i"
        | "img" | "input" | "kbd" | "label" | "object" | "embed" | "q" | "s" | "select"
        | "small" | "span" | "strike" | "strong" | "sub" | "sup" | "textarea" | "tt" | "u"
        | "var" | "iframe" => Display::Inline,
        "li" => Display::ListItem,
        "head" | "script" | "style" | "title" | "meta" | "link" | "base" | "map" | "area"
        | "noscript" => Display::None,
        _ => Display::Block,
    }
}
