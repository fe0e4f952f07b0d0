/// CSS length as written; resolved against font size and media metrics
/// during computation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    Px(f32),
    Pt(f32),
    Em(f32),
    Percent(f32),
}

impl Length {
    /// Resolve to CSS px. `em_px` is the reference font size, `percent_of`
    /// the percentage basis (None when percentages do not apply).
    pub fn to_px(self, em_px: f32, percent_of: Option<f32>, px_per_pt: f32) -> Option<f32> {
        match self {
            Length::Px(v) => Some(v),
            Length::Pt(v) => Some(v * px_per_pt),
            Length::Em(v) => Some(v * em_px),
            Length::Percent(v) => percent_of.map(|basis| basis * v / 100.0),
        }
    }
}

/// CSS `display` value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Display {
    Block,
    Inline,
    InlineBlock,
    ListItem,
    None,
}

pub fn parse_color(value: &str) -> Option<(u8, u8, u8, u8)> {
    let s = value.trim().to_ascii_lowercase();
    // HEX
    if let Some(hex) = s.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        if hex.len() == 3 {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            return Some((r, g, b, 255));
        } else if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            return Some((r, g, b, 255));
        }
        return None;
    }

    let named = match s.as_str() {
        "black" => (0, 0, 0, 255),
        "blue" => (0, 0, 255, 255),
        "cyan" => (0, 255, 255, 255),
        "gray" | "grey" => (128, 128, 128, 255),
        "green" => (0, 128, 0, 255),
        "magenta" => (255, 0, 255, 255),
        "maroon" => (128, 0, 0, 255),
        "navy" => (0, 0, 128, 255),
        "olive" => (128, 128, 0, 255),
        "purple" => (128, 0, 128, 255),
        "red" => (255, 0, 0, 255),
        "silver" => (192, 192, 192, 255),
        "teal" => (0, 128, 128, 255),
        "white" => (255, 255, 255, 255),
        "yellow" => (255, 255, 0, 255),
        "transparent" => (0, 0, 0, 0),
        _ => return None,
    };
    Some(named)
}

/// Parse `<number><unit>` for px, pt, em and %; a bare `0` is zero px.
/// Negative values are rejected.
pub fn parse_length(value: &str) -> Option<Length> {
    let v = value.trim().to_ascii_lowercase();
    if v == "0" {
        return Some(Length::Px(0.0));
    }
    let (num, make): (&str, fn(f32) -> Length) = if let Some(n) = v.strip_suffix("px") {
        (n, Length::Px)
    } else if let Some(n) = v.strip_suffix("pt") {
        (n, Length::Pt)
    } else if let Some(n) = v.strip_suffix("em") {
        (n, Length::Em)
    } else if let Some(n) = v.strip_suffix('%') {
        (n, Length::Percent)
    } else {
        return None;
    };
    let num = num.trim().parse::<f32>().ok()?;
    if num.is_finite() && num >= 0.0 {
        return Some(make(num));
    }
    None
}

/// Parse a `display` value into a Display enum.
/// We keep this strict and only support a small subset for now.
pub fn parse_display(value: &str) -> Option<Display> {
    let v = value.trim().to_ascii_lowercase();

    match v.as_str() {
        "block" => Some(Display::Block),
        "inline" => Some(Display::Inline),
        "inline-block" => Some(Display::InlineBlock),
        "list-item" => Some(Display::ListItem),
        "none" => Some(Display::None),
        _ => None,
    }
}
