// File: src/dom.rs
// Purpose: The DOM operations the renderer and session rely on

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DomError;

/// Declared kind of an input element, from its `type` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    File,
    Hidden,
    Checkbox,
    Radio,
    /// Text, select, textarea and every other visible control
    Other,
}

impl InputKind {
    pub fn from_type_attr(attr: Option<&str>) -> Self {
        attr.and_then(|t| t.parse().ok()).unwrap_or(InputKind::Other)
    }
}

impl FromStr for InputKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "file" => InputKind::File,
            "hidden" => InputKind::Hidden,
            "checkbox" => InputKind::Checkbox,
            "radio" => InputKind::Radio,
            _ => InputKind::Other,
        })
    }
}

/// Simple selector used for `closest` / `parent` lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Matcher {
    /// Element with this tag name
    Tag(String),
    /// Element carrying this class
    Class(String),
}

impl Matcher {
    pub fn tag(name: impl Into<String>) -> Self {
        Matcher::Tag(name.into())
    }

    pub fn class(name: impl Into<String>) -> Self {
        Matcher::Class(name.into())
    }

    /// Equivalent CSS selector
    pub fn to_css(&self) -> String {
        match self {
            Matcher::Tag(tag) => tag.clone(),
            Matcher::Class(class) => format!(".{}", class),
        }
    }
}

/// Value of a successful form control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlValue {
    Text(String),
    File {
        filename: String,
        content_type: String,
        data: Vec<u8>,
    },
}

/// A named control that would be submitted with the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormControl {
    pub name: String,
    pub value: ControlValue,
}

impl FormControl {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: ControlValue::Text(value.into()),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self.value, ControlValue::File { .. })
    }
}

/// A form element and the DOM primitives needed to annotate it
///
/// All lookups are scoped to the form returned by [`FormDom::form`].
/// `closest` considers the node itself first, then its ancestors; `parent`
/// returns the direct parent only if it satisfies the matcher.
pub trait FormDom {
    type Node: Clone + PartialEq;

    /// The form element itself
    fn form(&self) -> Self::Node;

    /// Tag name of a node, lowercase
    fn tag_name(&self, node: &Self::Node) -> String;

    /// Elements inside the form whose `name` attribute ends with `suffix`,
    /// in document order
    fn find_by_name_suffix(&self, suffix: &str) -> Result<Vec<Self::Node>, DomError>;

    /// Elements inside the form carrying `class`
    fn find_by_class(&self, class: &str) -> Result<Vec<Self::Node>, DomError>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn matches(&self, node: &Self::Node, matcher: &Matcher) -> bool;

    fn closest(&self, node: &Self::Node, matcher: &Matcher) -> Option<Self::Node>;

    fn parent(&self, node: &Self::Node, matcher: &Matcher) -> Option<Self::Node>;

    fn add_class(&mut self, node: &Self::Node, class: &str) -> Result<(), DomError>;

    fn remove_class(&mut self, node: &Self::Node, class: &str) -> Result<(), DomError>;

    /// Create a detached element holding `text` as text content
    fn create_element(&mut self, tag: &str, class: &str, text: &str) -> Result<Self::Node, DomError>;

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    fn prepend_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    /// Insert `node` as the next sibling of `reference`
    fn insert_after(&mut self, reference: &Self::Node, node: &Self::Node) -> Result<(), DomError>;

    fn remove(&mut self, node: &Self::Node) -> Result<(), DomError>;

    /// Controls that a normal submission of the form would send
    fn controls(&self) -> Result<Vec<FormControl>, DomError>;

    /// Declared kind of an input element
    fn input_kind(&self, node: &Self::Node) -> InputKind {
        InputKind::from_type_attr(self.attribute(node, "type").as_deref())
    }
}
