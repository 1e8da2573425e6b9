// File: src/memory.rs
// Purpose: In-memory form DOM, used for server-side rendering and tests

use std::fmt::Write;

use crate::dom::{ControlValue, FormControl, FormDom, Matcher};
use crate::error::DomError;

/// Handle to a node of a [`MemoryDom`]
pub type NodeId = usize;

const VOID_TAGS: &[&str] = &["input", "br", "hr", "img", "meta", "link"];

/// Element description used to build a [`MemoryDom`]
///
/// ```
/// use ajaxform::memory::{Element, MemoryDom};
///
/// let dom = MemoryDom::new(
///     Element::new("form")
///         .attr("action", "/register")
///         .child(Element::new("div").child(Element::input("email", "email"))),
/// );
/// assert!(dom.find_by_name("email").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    classes: Vec<String>,
    text: String,
    file: Option<FileData>,
    children: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FileData {
    filename: String,
    content_type: String,
    data: Vec<u8>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// `<input name=".." type="..">`
    pub fn input(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Element::new("input").attr("type", kind).attr("name", name)
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if name == "class" {
            for class in value.split_whitespace() {
                self = self.class(class);
            }
            return self;
        }
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
    }

    pub fn value(self, value: impl Into<String>) -> Self {
        self.attr("value", value)
    }

    pub fn checked(self) -> Self {
        self.attr("checked", "")
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Attach a selected file to a file input
    pub fn file(
        mut self,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        self.file = Some(FileData {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        });
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    attrs: Vec<(String, String)>,
    classes: Vec<String>,
    text: String,
    file: Option<FileData>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed DOM holding a single form
///
/// Slots of removed subtrees are reused by later insertions, so ids of
/// removed nodes must not be used again.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<NodeData>,
    free: Vec<NodeId>,
    root: NodeId,
}

impl MemoryDom {
    /// Build a DOM whose root is `root` (normally a `<form>`)
    pub fn new(root: Element) -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: 0,
        };
        dom.root = dom.insert_tree(root, None);
        dom
    }

    fn insert_tree(&mut self, element: Element, parent: Option<NodeId>) -> NodeId {
        let data = NodeData {
            tag: element.tag,
            attrs: element.attrs,
            classes: element.classes,
            text: element.text,
            file: element.file,
            parent,
            children: Vec::new(),
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id] = data;
                id
            }
            None => {
                self.nodes.push(data);
                self.nodes.len() - 1
            }
        };
        for child in element.children {
            let child_id = self.insert_tree(child, Some(id));
            self.nodes[id].children.push(child_id);
        }
        id
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes
            .get(id)
            .ok_or_else(|| DomError::new(format!("unknown node #{}", id)))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| DomError::new(format!("unknown node #{}", id)))
    }

    /// Attached descendants of the root in document order (root excluded)
    fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[self.root].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        out
    }

    fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        if let Some(parent) = self.node(id)?.parent {
            self.nodes[parent].children.retain(|c| *c != id);
            self.nodes[id].parent = None;
        }
        Ok(())
    }

    /// Put `id` and its subtree back on the free list
    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let node = &mut self.nodes[id];
            stack.append(&mut node.children);
            node.parent = None;
            self.free.push(id);
        }
    }

    /// Number of arena slots, live or free
    pub fn slots(&self) -> usize {
        self.nodes.len()
    }

    /// First element whose `name` attribute is exactly `name`
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.descendants()
            .into_iter()
            .find(|id| self.attribute(id, "name").as_deref() == Some(name))
    }

    pub fn classes(&self, id: NodeId) -> &[String] {
        self.nodes.get(id).map(|n| n.classes.as_slice()).unwrap_or(&[])
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).iter().any(|c| c == class)
    }

    pub fn text_of(&self, id: NodeId) -> &str {
        self.nodes.get(id).map(|n| n.text.as_str()).unwrap_or("")
    }

    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Texts of the elements carrying `class`, in document order
    pub fn texts_with_class(&self, class: &str) -> Vec<String> {
        self.descendants()
            .into_iter()
            .filter(|id| self.has_class(*id, class))
            .map(|id| self.nodes[id].text.clone())
            .collect()
    }

    /// Serialize the form as HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(self.root, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id];
        out.push('<');
        out.push_str(&node.tag);
        if !node.classes.is_empty() {
            out.push_str(" class=\"");
            push_escaped(out, &node.classes.join(" "));
            out.push('"');
        }
        for (name, value) in &node.attrs {
            out.push(' ');
            out.push_str(name);
            if !value.is_empty() {
                out.push_str("=\"");
                push_escaped(out, value);
                out.push('"');
            }
        }
        out.push('>');
        if VOID_TAGS.contains(&node.tag.as_str()) {
            return;
        }
        push_escaped(out, &node.text);
        for child in &node.children {
            self.write_html(*child, out);
        }
        out.push_str(&format!("</{}>", node.tag));
    }
}

fn push_escaped(out: &mut String, s: &str) {
    // Writing into a String never fails
    let _ = maud::Escaper::new(out).write_str(s);
}

impl FormDom for MemoryDom {
    type Node = NodeId;

    fn form(&self) -> NodeId {
        self.root
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.nodes
            .get(*node)
            .map(|n| n.tag.clone())
            .unwrap_or_default()
    }

    fn find_by_name_suffix(&self, suffix: &str) -> Result<Vec<NodeId>, DomError> {
        Ok(self
            .descendants()
            .into_iter()
            .filter(|id| {
                self.attribute(id, "name")
                    .map(|name| name.ends_with(suffix))
                    .unwrap_or(false)
            })
            .collect())
    }

    fn find_by_class(&self, class: &str) -> Result<Vec<NodeId>, DomError> {
        Ok(self
            .descendants()
            .into_iter()
            .filter(|id| self.has_class(*id, class))
            .collect())
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        let node = self.nodes.get(*node)?;
        if name == "class" {
            return Some(node.classes.join(" "));
        }
        node.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn matches(&self, node: &NodeId, matcher: &Matcher) -> bool {
        match matcher {
            Matcher::Tag(tag) => self.tag_name(node).eq_ignore_ascii_case(tag),
            Matcher::Class(class) => self.has_class(*node, class),
        }
    }

    fn closest(&self, node: &NodeId, matcher: &Matcher) -> Option<NodeId> {
        let mut current = Some(*node);
        while let Some(id) = current {
            if self.matches(&id, matcher) {
                return Some(id);
            }
            if id == self.root {
                return None;
            }
            current = self.parent_of(id);
        }
        None
    }

    fn parent(&self, node: &NodeId, matcher: &Matcher) -> Option<NodeId> {
        self.parent_of(*node).filter(|p| self.matches(p, matcher))
    }

    fn add_class(&mut self, node: &NodeId, class: &str) -> Result<(), DomError> {
        let node = self.node_mut(*node)?;
        if !node.classes.iter().any(|c| c == class) {
            node.classes.push(class.to_string());
        }
        Ok(())
    }

    fn remove_class(&mut self, node: &NodeId, class: &str) -> Result<(), DomError> {
        self.node_mut(*node)?.classes.retain(|c| c != class);
        Ok(())
    }

    fn create_element(&mut self, tag: &str, class: &str, text: &str) -> Result<NodeId, DomError> {
        let mut element = Element::new(tag).text(text);
        if !class.is_empty() {
            element = element.class(class);
        }
        Ok(self.insert_tree(element, None))
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        self.node(*parent)?;
        self.detach(*child)?;
        self.nodes[*parent].children.push(*child);
        self.nodes[*child].parent = Some(*parent);
        Ok(())
    }

    fn prepend_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        self.node(*parent)?;
        self.detach(*child)?;
        self.nodes[*parent].children.insert(0, *child);
        self.nodes[*child].parent = Some(*parent);
        Ok(())
    }

    fn insert_after(&mut self, reference: &NodeId, node: &NodeId) -> Result<(), DomError> {
        let parent = self
            .node(*reference)?
            .parent
            .ok_or_else(|| DomError::new("cannot insert after a detached node"))?;
        self.detach(*node)?;
        let siblings = &mut self.nodes[parent].children;
        let position = siblings
            .iter()
            .position(|c| c == reference)
            .map(|p| p + 1)
            .unwrap_or(siblings.len());
        siblings.insert(position, *node);
        self.nodes[*node].parent = Some(parent);
        Ok(())
    }

    fn remove(&mut self, node: &NodeId) -> Result<(), DomError> {
        if *node == self.root {
            return Err(DomError::new("cannot remove the form itself"));
        }
        self.detach(*node)?;
        self.release(*node);
        Ok(())
    }

    fn controls(&self) -> Result<Vec<FormControl>, DomError> {
        let mut controls = Vec::new();
        for id in self.descendants() {
            let node = &self.nodes[id];
            if !matches!(node.tag.as_str(), "input" | "select" | "textarea") {
                continue;
            }
            let Some(name) = self.attribute(&id, "name") else {
                continue;
            };
            if name.is_empty() || self.attribute(&id, "disabled").is_some() {
                continue;
            }

            let kind = self.attribute(&id, "type").unwrap_or_default().to_ascii_lowercase();
            match kind.as_str() {
                "checkbox" | "radio" => {
                    if self.attribute(&id, "checked").is_some() {
                        let value = self.attribute(&id, "value").unwrap_or_else(|| "on".to_string());
                        controls.push(FormControl::text(name, value));
                    }
                }
                "file" => {
                    if let Some(file) = &node.file {
                        controls.push(FormControl {
                            name,
                            value: ControlValue::File {
                                filename: file.filename.clone(),
                                content_type: file.content_type.clone(),
                                data: file.data.clone(),
                            },
                        });
                    }
                }
                "submit" | "button" | "reset" | "image" => {}
                _ => {
                    let value = if node.tag == "textarea" {
                        node.text.clone()
                    } else {
                        self.attribute(&id, "value").unwrap_or_default()
                    };
                    controls.push(FormControl::text(name, value));
                }
            }
        }
        Ok(controls)
    }
}
