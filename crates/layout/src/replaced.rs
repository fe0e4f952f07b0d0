use css::{ComputedStyle, Length};
use html::{Dom, NodeId};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IntrinsicSize {
    pub width: Option<f32>,  // px
    pub height: Option<f32>, // px
    /// width / height
    pub ratio: Option<f32>,
}

impl IntrinsicSize {
    pub fn from_w_h(width: Option<f32>, height: Option<f32>) -> Self {
        let ratio = match (width, height) {
            (Some(w), Some(h)) if h > 0.0 => Some(w / h),
            _ => None,
        };
        Self {
            width,
            height,
            ratio,
        }
    }
}

fn attr_px(dom: &Dom, node: NodeId, name: &str) -> Option<f32> {
    dom.attr(node, name)
        .and_then(|s| s.trim().trim_end_matches("px").parse::<f32>().ok())
        .filter(|v| *v > 0.0)
}

/// Presentational `width`/`height` attributes. Image data is never decoded,
/// so these are the only intrinsic dimensions available.
pub fn intrinsic_from_dom(dom: &Dom, node: NodeId) -> IntrinsicSize {
    IntrinsicSize::from_w_h(attr_px(dom, node, "width"), attr_px(dom, node, "height"))
}

fn fallback_intrinsic(is_iframe: bool) -> IntrinsicSize {
    if is_iframe {
        // classic HTML fallback (2:1)
        IntrinsicSize::from_w_h(Some(300.0), Some(150.0))
    } else {
        // unloaded image placeholder
        IntrinsicSize::from_w_h(Some(24.0), Some(24.0))
    }
}

fn px_opt(len: Option<Length>, em: f32, percent_of: Option<f32>) -> Option<f32> {
    len.and_then(|l| l.to_px(em, percent_of, css::media::PX_PER_PT))
}

/// width/height sizing for replaced elements, with ratio support.
/// Returns (used_width, used_height) in px.
pub fn compute_replaced_size(
    style: &ComputedStyle,
    intrinsic: IntrinsicSize,
    available_w: f32,
    is_iframe: bool,
) -> (f32, f32) {
    let intrinsic = if intrinsic.width.is_some() || intrinsic.height.is_some() {
        intrinsic
    } else {
        fallback_intrinsic(is_iframe)
    };

    let w_spec = px_opt(style.width, style.font_size, Some(available_w));
    let h_spec = px_opt(style.height, style.font_size, None);
    let ratio = intrinsic.ratio.unwrap_or(1.0).max(0.0001);
    let height_is_auto = h_spec.is_none();

    let (mut w, mut h) = match (w_spec, h_spec) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, intrinsic.height.map_or(w / ratio, |ih| {
            if intrinsic.ratio.is_some() { w / ratio } else { ih }
        })),
        (None, Some(h)) => (intrinsic.width.map_or(h * ratio, |iw| {
            if intrinsic.ratio.is_some() { h * ratio } else { iw }
        }), h),
        (None, None) => {
            let w0 = intrinsic.width.unwrap_or_else(|| intrinsic.height.unwrap_or(24.0) * ratio);
            let h0 = intrinsic.height.unwrap_or(w0 / ratio);
            (w0, h0)
        }
    };

    // Shrink to the available width.
    if available_w.is_finite() && available_w > 0.0 && w > available_w {
        w = available_w;
        if height_is_auto {
            h = w / ratio;
        }
    }

    (w.max(1.0), h.max(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use css::MediaContext;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 0.01, "{a} != {b}");
    }

    #[test]
    fn attributes_give_intrinsic_size() {
        let style = ComputedStyle::initial(&MediaContext::default());
        let (w, h) = compute_replaced_size(&style, IntrinsicSize::from_w_h(Some(200.0), Some(100.0)), 800.0, false);
        assert_close(w, 200.0);
        assert_close(h, 100.0);
    }

    #[test]
    fn wide_image_shrinks_preserving_ratio() {
        let style = ComputedStyle::initial(&MediaContext::default());
        let (w, h) = compute_replaced_size(&style, IntrinsicSize::from_w_h(Some(1000.0), Some(500.0)), 400.0, false);
        assert_close(w, 400.0);
        assert_close(h, 200.0);
    }

    #[test]
    fn iframe_fallback() {
        let style = ComputedStyle::initial(&MediaContext::default());
        let (w, h) = compute_replaced_size(&style, IntrinsicSize::default(), 800.0, true);
        assert_close(w, 300.0);
        assert_close(h, 150.0);
    }
}
