//! Block and inline flow.
//!
//! Blocks stack vertically inside their parent's content box. Runs of
//! consecutive inline-level children are laid into lines with a shared
//! cursor; text wraps at box granularity, atomic inlines (images, gadgets,
//! iframes) are placed whole.

use crate::box_tree::{BoxId, BoxKind, BoxTree};
use crate::gadget::GadgetKind;
use crate::replaced::compute_replaced_size;
use crate::text::TextMeasurer;
use core_types::Rect;
use css::ComputedStyle;
use css::media::PX_PER_PT;

/// Lay out the whole tree for a canvas `width` px wide.
pub fn layout_tree(tree: &mut BoxTree, width: f32, measurer: &dyn TextMeasurer) {
    let root = tree.root();
    let height = layout_block(tree, root, 0.0, 0.0, width, measurer);
    tree.width = width;
    tree.height = height;
    log::trace!(target: "layout.convert", "layout at width {width}: height {height}");
}

fn resolve_width(style: &ComputedStyle, available: f32) -> Option<f32> {
    style
        .width
        .and_then(|l| l.to_px(style.font_size, Some(available), PX_PER_PT))
}

fn resolve_height(style: &ComputedStyle) -> Option<f32> {
    style
        .height
        .and_then(|l| l.to_px(style.font_size, None, PX_PER_PT))
}

/// Lays out block `id` at (`x`, `y`) and returns its margin-box height.
fn layout_block(
    tree: &mut BoxTree,
    id: BoxId,
    x: f32,
    y: f32,
    available: f32,
    measurer: &dyn TextMeasurer,
) -> f32 {
    let Some(b) = tree.get(id) else {
        return 0.0;
    };
    let style = b.style;
    let children = b.children.clone();
    let m = style.box_metrics;

    let bx = x + m.margin_left;
    let by = y + m.margin_top;
    let width = resolve_width(&style, available)
        .unwrap_or(available - m.margin_left - m.margin_right)
        .max(0.0);
    let content_x = bx + m.padding_left;
    let content_y = by + m.padding_top;
    let content_w = (width - m.padding_left - m.padding_right).max(0.0);

    let mut cursor_y = content_y;
    let mut run: Vec<BoxId> = Vec::new();
    for child in children {
        let is_block = matches!(tree.get(child).map(|c| &c.kind), Some(BoxKind::Block));
        if is_block {
            if !run.is_empty() {
                cursor_y += layout_inline_run(tree, &run, content_x, cursor_y, content_w, measurer);
                run.clear();
            }
            cursor_y += layout_block(tree, child, content_x, cursor_y, content_w, measurer);
        } else {
            run.push(child);
        }
    }
    if !run.is_empty() {
        cursor_y += layout_inline_run(tree, &run, content_x, cursor_y, content_w, measurer);
    }

    let height = resolve_height(&style)
        .unwrap_or(cursor_y - content_y + m.padding_top + m.padding_bottom);
    if let Some(b) = tree.get_mut(id) {
        b.rect = Rect {
            x: bx,
            y: by,
            width,
            height,
        };
    }
    m.margin_top + height + m.margin_bottom
}

struct LineCursor {
    left: f32,
    max_width: f32,
    x: f32,
    y: f32,
    line_height: f32,
}

impl LineCursor {
    fn new_line(&mut self) {
        self.y += self.line_height;
        self.x = self.left;
        self.line_height = 0.0;
    }

    /// Place an atomic `w`x`h` item, wrapping first if it does not fit.
    fn place(&mut self, w: f32, h: f32) -> Rect {
        if self.x > self.left && self.x + w > self.left + self.max_width {
            self.new_line();
        }
        let rect = Rect {
            x: self.x,
            y: self.y,
            width: w,
            height: h,
        };
        self.x += w;
        self.line_height = self.line_height.max(h);
        rect
    }
}

fn layout_inline_run(
    tree: &mut BoxTree,
    run: &[BoxId],
    x: f32,
    y: f32,
    width: f32,
    measurer: &dyn TextMeasurer,
) -> f32 {
    let mut line = LineCursor {
        left: x,
        max_width: width,
        x,
        y,
        line_height: 0.0,
    };
    for &id in run {
        place_inline(tree, id, &mut line, measurer);
    }
    line.y + line.line_height - y
}

fn gadget_size(kind: GadgetKind, style: &ComputedStyle, value: &str, measurer: &dyn TextMeasurer) -> (f32, f32) {
    let char_w = style.font_size * 0.5;
    let line_h = measurer.line_height(style);
    match kind {
        GadgetKind::Checkbox | GadgetKind::Radio => (style.font_size, style.font_size),
        GadgetKind::TextArea => (char_w * 40.0, line_h * 3.0),
        GadgetKind::Submit | GadgetKind::Button => {
            (measurer.measure(value, style) + 16.0, line_h + 6.0)
        }
        GadgetKind::Select => (char_w * 12.0, line_h + 6.0),
        GadgetKind::Hidden => (0.0, 0.0),
        GadgetKind::Text | GadgetKind::Password | GadgetKind::File => (char_w * 20.0, line_h + 6.0),
    }
}

fn place_inline(tree: &mut BoxTree, id: BoxId, line: &mut LineCursor, measurer: &dyn TextMeasurer) {
    let Some(b) = tree.get(id) else {
        return;
    };
    let style = b.style;
    let kind = b.kind.clone();
    let intrinsic = b.intrinsic;

    let rect = match kind {
        BoxKind::Text(text) => {
            let w = measurer.measure(&text, &style);
            let h = measurer.line_height(&style);
            if w > line.max_width && line.max_width > 0.0 {
                // Wider than a line: occupy whole lines of its own.
                if line.x > line.left {
                    line.new_line();
                }
                let lines = (w / line.max_width).ceil();
                let rect = Rect {
                    x: line.left,
                    y: line.y,
                    width: line.max_width,
                    height: h * lines,
                };
                line.y += h * (lines - 1.0);
                line.line_height = h;
                line.x = line.left + (w % line.max_width);
                rect
            } else {
                line.place(w, h)
            }
        }
        BoxKind::Replaced(_) | BoxKind::Iframe => {
            let is_iframe = matches!(kind, BoxKind::Iframe);
            let (w, h) = compute_replaced_size(&style, intrinsic, line.max_width, is_iframe);
            line.place(w, h)
        }
        BoxKind::Gadget(index) => {
            let (w, h) = match tree.gadgets().get(index) {
                Some(g) => gadget_size(g.kind, &style, &g.value, measurer),
                None => (0.0, 0.0),
            };
            line.place(w, h)
        }
        BoxKind::Inline => {
            let start = (line.x, line.y);
            let children = tree.children(id).to_vec();
            for child in children {
                let is_block = matches!(tree.get(child).map(|c| &c.kind), Some(BoxKind::Block));
                if is_block {
                    if line.x > line.left {
                        line.new_line();
                    }
                    line.y += layout_block(tree, child, line.left, line.y, line.max_width, measurer);
                } else {
                    place_inline(tree, child, line, measurer);
                }
            }
            union_of_children(tree, id).unwrap_or(Rect {
                x: start.0,
                y: start.1,
                width: 0.0,
                height: 0.0,
            })
        }
        BoxKind::Block => {
            if line.x > line.left {
                line.new_line();
            }
            line.y += layout_block(tree, id, line.left, line.y, line.max_width, measurer);
            return;
        }
    };
    if let Some(b) = tree.get_mut(id) {
        b.rect = rect;
    }
}

fn union_of_children(tree: &BoxTree, id: BoxId) -> Option<Rect> {
    let mut out: Option<Rect> = None;
    for &child in tree.children(id) {
        let Some(r) = tree.get(child).map(|c| c.rect) else {
            continue;
        };
        out = Some(match out {
            None => r,
            Some(u) => {
                let x0 = u.x.min(r.x);
                let y0 = u.y.min(r.y);
                let x1 = (u.x + u.width).max(r.x + r.width);
                let y1 = (u.y + u.height).max(r.y + r.height);
                Rect {
                    x: x0,
                    y: y0,
                    width: x1 - x0,
                    height: y1 - y0,
                }
            }
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::convert::convert_all;
    use crate::text::ApproxTextMeasurer;
    use crate::{BoxKind, relayout};
    use css::{MediaContext, SelectionContext, parse_stylesheet};
    use html::{BindingParams, parse_document};

    fn tree_for(src: &str) -> crate::BoxTree {
        let dom = parse_document(src.as_bytes(), BindingParams::default()).unwrap();
        let sel = SelectionContext::new(
            vec![parse_stylesheet("div, p, body, html { display: block }")],
            MediaContext::default(),
        )
        .unwrap();
        convert_all(&dom, dom.document_element().unwrap(), &sel, &ApproxTextMeasurer).unwrap()
    }

    #[test]
    fn blocks_stack_vertically() {
        let tree = tree_for("<div id=a>one</div><div id=b>two</div>");
        let (_, ya) = tree.id_offset("a").unwrap();
        let (_, yb) = tree.id_offset("b").unwrap();
        assert!(yb > ya);
        assert!(tree.height() >= yb);
    }

    #[test]
    fn narrow_width_wraps_inline_content() {
        let mut tree = tree_for("<p><span>aaaa</span> <span>bbbb</span> <span>cccc</span></p>");
        relayout(&mut tree, 800.0, &ApproxTextMeasurer);
        let wide = tree.height();
        relayout(&mut tree, 40.0, &ApproxTextMeasurer);
        assert!(tree.height() > wide);
        assert_eq!(tree.width(), 40.0);
    }

    #[test]
    fn image_uses_presentational_size() {
        let tree = tree_for("<p><img id=pic src=a.png width=120 height=60></p>");
        let id = tree.box_for_element_id("pic").unwrap();
        let b = tree.get(id).unwrap();
        assert!(matches!(b.kind, BoxKind::Replaced(_)));
        assert_eq!(b.rect.width, 120.0);
        assert_eq!(b.rect.height, 60.0);
    }
}
