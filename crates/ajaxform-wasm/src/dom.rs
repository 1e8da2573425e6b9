// File: src/dom.rs
// Purpose: FormDom over a live HTMLFormElement

use ajaxform::{ControlValue, DomError, FormControl, FormDom, Matcher};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, HtmlCollection, HtmlFormElement, HtmlInputElement, HtmlOptionElement,
    HtmlSelectElement, HtmlTextAreaElement, NodeList,
};

/// A form in the page
///
/// File controls are reported with their name and type only; the bytes are
/// read by the browser when the transport builds a `FormData` from the form.
#[derive(Debug, Clone)]
pub struct WebForm {
    form: HtmlFormElement,
    document: Document,
}

impl WebForm {
    pub fn new(form: HtmlFormElement) -> Result<Self, DomError> {
        let document = form
            .owner_document()
            .ok_or_else(|| DomError::new("form is not attached to a document"))?;
        Ok(Self { form, document })
    }

    pub fn form_element(&self) -> &HtmlFormElement {
        &self.form
    }

    fn root(&self) -> &Element {
        self.form.as_ref()
    }

    fn contains(&self, node: &Element) -> bool {
        self.root().contains(Some(node.as_ref()))
    }
}

/// Message of a thrown JS value
pub fn js_message(value: &JsValue) -> String {
    if let Some(message) = value.as_string() {
        return message;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{:?}", value)
}

fn dom_error(value: JsValue) -> DomError {
    DomError::new(js_message(&value))
}

fn node_list(list: NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn collection(list: HtmlCollection) -> Vec<Element> {
    (0..list.length()).filter_map(|i| list.item(i)).collect()
}

/// Quote `s` as a CSS string
fn css_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

impl FormDom for WebForm {
    type Node = Element;

    fn form(&self) -> Element {
        self.root().clone()
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name().to_ascii_lowercase()
    }

    fn find_by_name_suffix(&self, suffix: &str) -> Result<Vec<Element>, DomError> {
        let selector = format!("[name$={}]", css_string(suffix));
        self.root()
            .query_selector_all(&selector)
            .map(node_list)
            .map_err(dom_error)
    }

    fn find_by_class(&self, class: &str) -> Result<Vec<Element>, DomError> {
        Ok(collection(self.root().get_elements_by_class_name(class)))
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn matches(&self, node: &Element, matcher: &Matcher) -> bool {
        match matcher {
            Matcher::Tag(tag) => node.tag_name().eq_ignore_ascii_case(tag),
            Matcher::Class(class) => node.class_list().contains(class),
        }
    }

    fn closest(&self, node: &Element, matcher: &Matcher) -> Option<Element> {
        node.closest(&matcher.to_css())
            .ok()
            .flatten()
            .filter(|found| self.contains(found))
    }

    fn parent(&self, node: &Element, matcher: &Matcher) -> Option<Element> {
        node.parent_element()
            .filter(|parent| self.matches(parent, matcher))
    }

    fn add_class(&mut self, node: &Element, class: &str) -> Result<(), DomError> {
        node.class_list().add_1(class).map_err(dom_error)
    }

    fn remove_class(&mut self, node: &Element, class: &str) -> Result<(), DomError> {
        node.class_list().remove_1(class).map_err(dom_error)
    }

    fn create_element(&mut self, tag: &str, class: &str, text: &str) -> Result<Element, DomError> {
        let element = self.document.create_element(tag).map_err(dom_error)?;
        if !class.is_empty() {
            element.set_class_name(class);
        }
        element.set_text_content(Some(text));
        Ok(element)
    }

    fn append_child(&mut self, parent: &Element, child: &Element) -> Result<(), DomError> {
        parent.append_child(child).map(|_| ()).map_err(dom_error)
    }

    fn prepend_child(&mut self, parent: &Element, child: &Element) -> Result<(), DomError> {
        parent.prepend_with_node_1(child).map_err(dom_error)
    }

    fn insert_after(&mut self, reference: &Element, node: &Element) -> Result<(), DomError> {
        reference.after_with_node_1(node).map_err(dom_error)
    }

    fn remove(&mut self, node: &Element) -> Result<(), DomError> {
        node.remove();
        Ok(())
    }

    fn controls(&self) -> Result<Vec<FormControl>, DomError> {
        let mut controls = Vec::new();

        for element in collection(self.form.elements()) {
            if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
                let name = input.name();
                if name.is_empty() || input.disabled() {
                    continue;
                }
                match input.type_().to_ascii_lowercase().as_str() {
                    "checkbox" | "radio" => {
                        if input.checked() {
                            controls.push(FormControl::text(name, input.value()));
                        }
                    }
                    "file" => {
                        let Some(files) = input.files() else {
                            continue;
                        };
                        for file in (0..files.length()).filter_map(|i| files.get(i)) {
                            controls.push(FormControl {
                                name: name.clone(),
                                value: ControlValue::File {
                                    filename: file.name(),
                                    content_type: file.type_(),
                                    data: Vec::new(),
                                },
                            });
                        }
                    }
                    "submit" | "button" | "reset" | "image" => {}
                    _ => controls.push(FormControl::text(name, input.value())),
                }
            } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
                let name = select.name();
                if name.is_empty() || select.disabled() {
                    continue;
                }
                for option in collection(select.selected_options()) {
                    if let Some(option) = option.dyn_ref::<HtmlOptionElement>() {
                        controls.push(FormControl::text(name.clone(), option.value()));
                    }
                }
            } else if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
                let name = textarea.name();
                if name.is_empty() || textarea.disabled() {
                    continue;
                }
                controls.push(FormControl::text(name, textarea.value()));
            }
        }

        Ok(controls)
    }
}
