use css::ComputedStyle;

/// Layout can depend on this without knowing how text is drawn.
pub trait TextMeasurer {
    /// Return the width of `text` in CSS px when rendered with `style`.
    fn measure(&self, text: &str, style: &ComputedStyle) -> f32;

    /// Return the line-height in CSS px for the given `style`.
    fn line_height(&self, style: &ComputedStyle) -> f32;
}

/// Fixed advance per character; used headless and in tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproxTextMeasurer;

impl TextMeasurer for ApproxTextMeasurer {
    fn measure(&self, text: &str, style: &ComputedStyle) -> f32 {
        text.chars().count() as f32 * style.font_size * 0.5
    }

    fn line_height(&self, style: &ComputedStyle) -> f32 {
        style.line_height
    }
}
