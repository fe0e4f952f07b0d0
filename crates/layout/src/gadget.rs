//! Form controls attached to boxes.

use html::{Dom, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GadgetKind {
    Text,
    Password,
    TextArea,
    File,
    Checkbox,
    Radio,
    Submit,
    Button,
    Hidden,
    Select,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectOption {
    pub text: String,
    pub value: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gadget {
    pub kind: GadgetKind,
    pub node: NodeId,
    pub name: Option<String>,
    pub value: String,
    pub checked: bool,
    pub options: Vec<SelectOption>,
    /// Enclosing `<form>` element.
    pub form: Option<NodeId>,
}

fn input_kind(type_attr: Option<&str>) -> GadgetKind {
    match type_attr.map(|t| t.trim().to_ascii_lowercase()).as_deref() {
        Some("password") => GadgetKind::Password,
        Some("file") => GadgetKind::File,
        Some("checkbox") => GadgetKind::Checkbox,
        Some("radio") => GadgetKind::Radio,
        Some("submit") | Some("image") | Some("reset") => GadgetKind::Submit,
        Some("button") => GadgetKind::Button,
        Some("hidden") => GadgetKind::Hidden,
        _ => GadgetKind::Text,
    }
}

impl Gadget {
    /// Gadget for a form-control element, or `None` for anything else.
    pub fn from_element(dom: &Dom, node: NodeId) -> Option<Self> {
        let element = dom.element(node)?;
        let kind = match element.name.as_str() {
            "input" => input_kind(element.attr("type")),
            "textarea" => GadgetKind::TextArea,
            "select" => GadgetKind::Select,
            "button" => GadgetKind::Button,
            _ => return None,
        };
        let mut form = dom.parent(node);
        while let Some(f) = form {
            if dom.is_element_named(f, "form") {
                break;
            }
            form = dom.parent(f);
        }
        let mut gadget = Self {
            kind,
            node,
            name: element.attr("name").map(str::to_string),
            value: String::new(),
            checked: false,
            options: Vec::new(),
            form,
        };
        gadget.sync_with_dom(dom);
        Some(gadget)
    }

    /// Re-read the control's value from the DOM. Returns whether anything
    /// changed.
    pub fn sync_with_dom(&mut self, dom: &Dom) -> bool {
        if !dom.is_live(self.node) {
            return false;
        }
        let before = (self.value.clone(), self.checked, self.options.clone());
        match self.kind {
            GadgetKind::TextArea => self.value = dom.text_content(self.node),
            GadgetKind::Select => {
                self.options = dom
                    .elements_named(self.node, "option")
                    .into_iter()
                    .map(|opt| {
                        let text = html::dom_utils::squash_whitespace(&dom.text_content(opt));
                        SelectOption {
                            value: dom.attr(opt, "value").map(str::to_string).unwrap_or_else(|| text.clone()),
                            text,
                            selected: dom.attr(opt, "selected").is_some(),
                        }
                    })
                    .collect();
                if !self.options.iter().any(|o| o.selected) {
                    if let Some(first) = self.options.first_mut() {
                        first.selected = true;
                    }
                }
                self.value = self
                    .options
                    .iter()
                    .find(|o| o.selected)
                    .map(|o| o.value.clone())
                    .unwrap_or_default();
            }
            GadgetKind::Checkbox | GadgetKind::Radio => {
                self.checked = dom.attr(self.node, "checked").is_some();
                self.value = dom.attr(self.node, "value").unwrap_or("on").to_string();
            }
            GadgetKind::Button => {
                self.value = match dom.attr(self.node, "value") {
                    Some(v) => v.to_string(),
                    None => html::dom_utils::squash_whitespace(&dom.text_content(self.node)),
                };
            }
            _ => self.value = dom.attr(self.node, "value").unwrap_or_default().to_string(),
        }
        before != (self.value.clone(), self.checked, self.options.clone())
    }

    pub fn has_box(&self) -> bool {
        self.kind != GadgetKind::Hidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textarea_tracks_text_content() {
        let mut dom = Dom::new();
        let form = dom.create_element("form");
        let area = dom.create_element("textarea");
        dom.append_child(dom.document(), form).unwrap();
        dom.append_child(form, area).unwrap();
        dom.set_text_content(area, "one").unwrap();
        let mut gadget = Gadget::from_element(&dom, area).unwrap();
        assert_eq!(gadget.value, "one");
        assert_eq!(gadget.form, Some(form));

        dom.set_text_content(area, "two").unwrap();
        assert!(gadget.sync_with_dom(&dom));
        assert_eq!(gadget.value, "two");
        assert!(!gadget.sync_with_dom(&dom));
    }

    #[test]
    fn select_defaults_to_first_option() {
        let mut dom = Dom::new();
        let select = dom.create_element("select");
        for label in ["a", "b"] {
            let opt = dom.create_element("option");
            dom.append_child(select, opt).unwrap();
            dom.set_text_content(opt, label).unwrap();
        }
        let gadget = Gadget::from_element(&dom, select).unwrap();
        assert_eq!(gadget.kind, GadgetKind::Select);
        assert_eq!(gadget.value, "a");
    }

    #[test]
    fn input_types() {
        let mut dom = Dom::new();
        let input = dom.create_element("input");
        dom.set_attr(input, "type", "CHECKBOX").unwrap();
        dom.set_attr(input, "checked", "").unwrap();
        let gadget = Gadget::from_element(&dom, input).unwrap();
        assert_eq!(gadget.kind, GadgetKind::Checkbox);
        assert!(gadget.checked);
        assert_eq!(gadget.value, "on");
    }
}
