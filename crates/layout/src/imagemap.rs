//! Client-side image maps.
//!
//! Maps are collected from `<map name=...>` elements once the box tree
//! exists. Areas come from `<area>` children, or from `<a shape=...>` links
//! in legacy documents.

use html::{Dom, NodeId};
use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageMapError {
    /// A map or area element was removed while extraction ran.
    StaleNode(NodeId),
}

impl fmt::Display for ImageMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageMapError::StaleNode(id) => write!(f, "image map node {id:?} is gone"),
        }
    }
}

impl std::error::Error for ImageMapError {}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Rect { x0: f32, y0: f32, x1: f32, y1: f32 },
    Circle { x: f32, y: f32, r: f32 },
    Poly(Vec<(f32, f32)>),
    Default,
}

impl Shape {
    fn parse(shape: Option<&str>, coords: Option<&str>) -> Option<Shape> {
        let shape = shape.map(|s| s.trim().to_ascii_lowercase());
        let nums: Vec<f32> = coords
            .unwrap_or("")
            .split(|c: char| c == ',' || c.is_ascii_whitespace())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.trim_end_matches('%').parse::<f32>().ok())
            .collect();
        match shape.as_deref() {
            None | Some("rect") | Some("rectangle") => {
                let [a, b, c, d] = nums.get(..4)?.try_into().ok()?;
                Some(Shape::Rect {
                    x0: f32::min(a, c),
                    y0: f32::min(b, d),
                    x1: f32::max(a, c),
                    y1: f32::max(b, d),
                })
            }
            Some("circle") | Some("circ") => {
                let [x, y, r] = nums.get(..3)?.try_into().ok()?;
                Some(Shape::Circle { x, y, r })
            }
            Some("poly") | Some("polygon") => {
                if nums.len() < 6 {
                    return None;
                }
                Some(Shape::Poly(nums.chunks_exact(2).map(|p| (p[0], p[1])).collect()))
            }
            Some("default") => Some(Shape::Default),
            Some(_) => None,
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        match self {
            Shape::Rect { x0, y0, x1, y1 } => px >= *x0 && px <= *x1 && py >= *y0 && py <= *y1,
            Shape::Circle { x, y, r } => {
                let (dx, dy) = (px - x, py - y);
                dx * dx + dy * dy <= r * r
            }
            Shape::Poly(points) => {
                // Even-odd crossing test.
                let mut inside = false;
                let mut j = points.len() - 1;
                for i in 0..points.len() {
                    let (xi, yi) = points[i];
                    let (xj, yj) = points[j];
                    if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
                        inside = !inside;
                    }
                    j = i;
                }
                inside
            }
            Shape::Default => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapArea {
    pub shape: Shape,
    /// `None` for `nohref` areas, which block the point without linking.
    pub href: Option<String>,
    pub target: Option<String>,
    pub alt: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ImageMaps {
    maps: HashMap<String, Vec<MapArea>>,
}

impl ImageMaps {
    /// Collect every named map in the document.
    pub fn extract(dom: &Dom) -> Result<ImageMaps, ImageMapError> {
        let mut maps = HashMap::new();
        for map in dom.elements_named(dom.document(), "map") {
            let element = dom.element(map).ok_or(ImageMapError::StaleNode(map))?;
            let Some(name) = element
                .attr("name")
                .or_else(|| element.attr("id"))
                .map(|n| n.trim().trim_start_matches('#'))
                .filter(|n| !n.is_empty())
            else {
                continue;
            };
            if maps.contains_key(name) {
                continue;
            }
            let mut areas = Vec::new();
            for node in dom.descendants(map) {
                let Some(area) = dom.element(node) else {
                    continue;
                };
                let legacy_anchor = area.name == "a" && area.has_attr("shape");
                if area.name != "area" && !legacy_anchor {
                    continue;
                }
                let Some(shape) = Shape::parse(area.attr("shape"), area.attr("coords")) else {
                    continue;
                };
                areas.push(MapArea {
                    shape,
                    href: if area.has_attr("nohref") {
                        None
                    } else {
                        area.attr("href").map(|h| h.trim().to_string())
                    },
                    target: area.attr("target").map(str::to_string),
                    alt: area.attr("alt").map(str::to_string),
                });
            }
            log::trace!(target: "layout.convert", "image map {name:?}: {} areas", areas.len());
            maps.insert(name.to_string(), areas);
        }
        Ok(ImageMaps { maps })
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn areas(&self, name: &str) -> Option<&[MapArea]> {
        self.maps.get(name.trim_start_matches('#')).map(Vec::as_slice)
    }

    /// First area of map `name` containing (`x`, `y`), relative to the
    /// image's top-left corner. Returns `(href, target)`.
    pub fn lookup(&self, name: &str, x: f32, y: f32) -> Option<(&str, Option<&str>)> {
        let area = self.areas(name)?.iter().find(|a| a.shape.contains(x, y))?;
        area.href
            .as_deref()
            .map(|href| (href, area.target.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::{BindingParams, parse_document};

    fn maps(src: &str) -> ImageMaps {
        let dom = parse_document(src.as_bytes(), BindingParams::default()).unwrap();
        ImageMaps::extract(&dom).unwrap()
    }

    #[test]
    fn rect_and_circle_areas() {
        let maps = maps(
            r##"<map name="nav">
                <area shape=rect coords="0,0,10,10" href="/a">
                <area shape=circle coords="50,50,5" href="/b" target=side>
                <area shape=default href="/c">
            </map>"##,
        );
        assert_eq!(maps.lookup("#nav", 5.0, 5.0), Some(("/a", None)));
        assert_eq!(maps.lookup("nav", 52.0, 51.0), Some(("/b", Some("side"))));
        assert_eq!(maps.lookup("nav", 200.0, 200.0), Some(("/c", None)));
    }

    #[test]
    fn polygon_and_nohref() {
        let maps = maps(
            r#"<map name=m>
                <area shape=poly coords="0,0 20,0 0,20" nohref>
                <area shape=rect coords="0,0,100,100" href="/under">
            </map>"#,
        );
        assert_eq!(maps.lookup("m", 2.0, 2.0), None);
        assert_eq!(maps.lookup("m", 50.0, 50.0), Some(("/under", None)));
    }

    #[test]
    fn legacy_anchor_shapes() {
        let maps = maps(r#"<map name=old><a shape=rect coords="0,0,5,5" href="/x">x</a></map>"#);
        assert_eq!(maps.lookup("old", 1.0, 1.0), Some(("/x", None)));
    }

    #[test]
    fn malformed_coords_are_skipped() {
        let maps = maps(r#"<map name=m><area shape=rect coords="1,2" href=/a></map>"#);
        assert_eq!(maps.areas("m").map(<[MapArea]>::len), Some(0));
    }
}
