use core_types::Viewport;

/// CSS px per typographic point (96 dpi / 72).
pub const PX_PER_PT: f32 = 96.0 / 72.0;

/// Line height as a multiple of font size.
const LINE_HEIGHT_FACTOR: f32 = 1.33;

/// Derived media metrics used as layout input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaContext {
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Client default font size in points.
    pub font_size_pt: f32,
    pub px_per_pt: f32,
}

impl MediaContext {
    /// `font_size_tenths_pt` is the client option, e.g. 128 for 12.8pt.
    pub fn new(viewport: Viewport, font_size_tenths_pt: u32) -> Self {
        Self {
            viewport_width: viewport.width as f32,
            viewport_height: viewport.height as f32,
            font_size_pt: font_size_tenths_pt as f32 / 10.0,
            px_per_pt: PX_PER_PT,
        }
    }

    pub fn default_font_px(&self) -> f32 {
        self.font_size_pt * self.px_per_pt
    }

    pub fn line_height_px(&self, font_px: f32) -> f32 {
        font_px * LINE_HEIGHT_FACTOR
    }
}

impl Default for MediaContext {
    fn default() -> Self {
        Self::new(Viewport::default(), 128)
    }
}
