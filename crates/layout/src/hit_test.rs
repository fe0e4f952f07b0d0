use crate::box_tree::{BoxId, BoxKind, BoxTree};
use crate::gadget::GadgetKind;
use crate::imagemap::ImageMaps;
use core_types::Rect;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormFeature {
    /// Index into `BoxTree::gadgets`.
    pub gadget: usize,
    pub kind: GadgetKind,
}

/// Everything interesting under a point, innermost box winning.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContextualContent {
    pub link_url: Option<String>,
    pub link_target: Option<String>,
    /// Index of the embedded object (image, object, iframe) under the point.
    pub object: Option<usize>,
    pub form_feature: Option<FormFeature>,
    pub title: Option<String>,
    pub main_box: Option<BoxId>,
}

fn point_in_rect(p: (f32, f32), r: Rect) -> bool {
    let (x, y) = p;
    x >= r.x && x <= r.x + r.width && y >= r.y && y <= r.y + r.height
}

/// Hit test in document coordinates (same system as `LayoutBox::rect`).
pub fn contextual_content(
    tree: &BoxTree,
    maps: Option<&ImageMaps>,
    x: f32,
    y: f32,
) -> ContextualContent {
    let mut out = ContextualContent::default();
    visit(tree, maps, tree.root(), (x, y), &mut out);
    out
}

fn visit(
    tree: &BoxTree,
    maps: Option<&ImageMaps>,
    id: BoxId,
    point: (f32, f32),
    out: &mut ContextualContent,
) {
    let Some(b) = tree.get(id) else {
        return;
    };
    // The root covers the whole canvas even when content is shorter.
    if id != tree.root() && !point_in_rect(point, b.rect) {
        // Inline containers may wrap; their children carry their own rects.
        if matches!(b.kind, BoxKind::Inline) {
            for &child in tree.children(id) {
                visit(tree, maps, child, point, out);
            }
        }
        return;
    }

    out.main_box = Some(id);
    if let Some(href) = &b.href {
        out.link_url = Some(href.clone());
        out.link_target = b.target.clone();
    }
    if let Some(title) = &b.title {
        out.title = Some(title.clone());
    }
    match b.kind {
        BoxKind::Replaced(_) | BoxKind::Iframe => {
            out.object = b.object;
            if let (Some(maps), Some(name)) = (maps, b.usemap.as_deref()) {
                let (lx, ly) = (point.0 - b.rect.x, point.1 - b.rect.y);
                if let Some((href, target)) = maps.lookup(name, lx, ly) {
                    out.link_url = Some(href.to_string());
                    out.link_target = target.map(str::to_string);
                }
            }
        }
        BoxKind::Gadget(index) => {
            if let Some(g) = tree.gadgets().get(index) {
                out.form_feature = Some(FormFeature {
                    gadget: index,
                    kind: g.kind,
                });
            }
        }
        _ => {}
    }

    for &child in tree.children(id) {
        visit(tree, maps, child, point, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::convert_all;
    use crate::text::ApproxTextMeasurer;
    use css::{MediaContext, SelectionContext, parse_stylesheet};
    use html::{BindingParams, parse_document};

    fn build(src: &str) -> (BoxTree, ImageMaps) {
        let dom = parse_document(src.as_bytes(), BindingParams::default()).unwrap();
        let sel = SelectionContext::new(
            vec![parse_stylesheet("html, body, div, p { display: block }")],
            MediaContext::default(),
        )
        .unwrap();
        let tree =
            convert_all(&dom, dom.document_element().unwrap(), &sel, &ApproxTextMeasurer).unwrap();
        (tree, ImageMaps::extract(&dom).unwrap())
    }

    fn center(tree: &BoxTree, element_id: &str) -> (f32, f32) {
        let b = tree.get(tree.box_for_element_id(element_id).unwrap()).unwrap();
        (b.rect.x + b.rect.width / 2.0, b.rect.y + b.rect.height / 2.0)
    }

    #[test]
    fn link_under_point() {
        let (tree, maps) = build(r#"<p><a id=l href="/next" target=t title=hint>next page</a></p>"#);
        let (x, y) = center(&tree, "l");
        let ctx = contextual_content(&tree, Some(&maps), x, y);
        assert_eq!(ctx.link_url.as_deref(), Some("/next"));
        assert_eq!(ctx.link_target.as_deref(), Some("t"));
        assert_eq!(ctx.title.as_deref(), Some("hint"));
    }

    #[test]
    fn form_gadget_under_point() {
        let (tree, _) = build(r#"<form><input id=q name=q></form>"#);
        let (x, y) = center(&tree, "q");
        let ctx = contextual_content(&tree, None, x, y);
        assert_eq!(ctx.form_feature.map(|f| f.kind), Some(GadgetKind::Text));
    }

    #[test]
    fn image_map_link() {
        let (tree, maps) = build(
            r##"<p><img id=i src=m.png usemap="#m" width=100 height=100></p>
            <map name=m><area shape=rect coords="0,0,50,100" href="/left"></map>"##,
        );
        let b = tree.get(tree.box_for_element_id("i").unwrap()).unwrap();
        let ctx = contextual_content(&tree, Some(&maps), b.rect.x + 10.0, b.rect.y + 10.0);
        assert_eq!(ctx.link_url.as_deref(), Some("/left"));
        let ctx = contextual_content(&tree, Some(&maps), b.rect.x + 90.0, b.rect.y + 10.0);
        assert_eq!(ctx.link_url, None);
    }

    #[test]
    fn empty_space_hits_only_the_root() {
        let (tree, maps) = build("<p>x</p>");
        let ctx = contextual_content(&tree, Some(&maps), 700.0, 5000.0);
        assert_eq!(ctx.main_box, Some(tree.root()));
        assert_eq!(ctx.link_url, None);
    }
}
