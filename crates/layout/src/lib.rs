//! Box tree construction, flow layout and hit testing.

pub mod box_tree;
pub mod convert;
pub mod flow;
pub mod gadget;
pub mod hit_test;
pub mod imagemap;
pub mod replaced;
pub mod text;

pub use box_tree::{BoxId, BoxKind, BoxTree, LayoutBox, ObjectRequest, ObjectRequestKind, ReplacedKind};
pub use convert::{BoxBuilder, ConvertError, StepResult, convert_all};
pub use gadget::{Gadget, GadgetKind, SelectOption};
pub use hit_test::{ContextualContent, FormFeature, contextual_content};
pub use imagemap::{ImageMapError, ImageMaps, MapArea, Shape};
pub use replaced::{IntrinsicSize, compute_replaced_size};
pub use text::{ApproxTextMeasurer, TextMeasurer};

/// Re-run flow layout for a new canvas width, keeping the boxes.
pub fn relayout(tree: &mut BoxTree, width: f32, measurer: &dyn TextMeasurer) {
    flow::layout_tree(tree, width, measurer);
}
