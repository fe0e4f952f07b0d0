use html::{Dom, NodeId};
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    PostUrlEncoded,
    PostMultipart,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Form {
    pub node: NodeId,
    pub name: Option<String>,
    /// Absolute; the document URL when the attribute is missing or empty.
    pub action: Url,
    pub method: FormMethod,
    pub target: Option<String>,
    pub accept_charset: Option<String>,
    /// Charset of the document the form lives in.
    pub document_charset: String,
}

fn method_of(method: Option<&str>, enctype: Option<&str>) -> FormMethod {
    let post = method.is_some_and(|m| m.trim().eq_ignore_ascii_case("post"));
    if !post {
        return FormMethod::Get;
    }
    if enctype.is_some_and(|e| e.trim().eq_ignore_ascii_case("multipart/form-data")) {
        FormMethod::PostMultipart
    } else {
        FormMethod::PostUrlEncoded
    }
}

/// Every `<form>` in document order with its action made absolute.
pub fn collect_forms(
    dom: &Dom,
    document_url: &Url,
    base_url: &Url,
    base_target: Option<&str>,
    charset: &str,
) -> Vec<Form> {
    dom.elements_named(dom.document(), "form")
        .into_iter()
        .filter_map(|node| {
            let element = dom.element(node)?;
            let action = match element.attr("action").map(str::trim) {
                None | Some("") => document_url.clone(),
                Some(raw) => base_url.join(raw).unwrap_or_else(|err| {
                    log::debug!(
                        target: "content.convert",
                        "form action {raw:?} unresolvable ({err}); using document url"
                    );
                    document_url.clone()
                }),
            };
            Some(Form {
                node,
                name: element.attr("name").map(str::to_string),
                action,
                method: method_of(element.attr("method"), element.attr("enctype")),
                target: element
                    .attr("target")
                    .map(str::to_string)
                    .or_else(|| base_target.map(str::to_string)),
                accept_charset: element
                    .attr("accept-charset")
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string),
                document_charset: charset.to_string(),
            })
        })
        .collect()
}
