// File: src/renderer.rs
// Purpose: Map an error tree onto a form DOM and render the messages

use tracing::{debug, warn};

use crate::config::{Capabilities, Config, RenderTheme};
use crate::dom::{FormDom, InputKind};
use crate::error::Result;
use crate::path::{has_index_segment, FieldPath, PathRules};
use crate::tree::{ErrorMap, ErrorTree, ErrorValue, GLOBAL_KEY};

/// Summary of one [`ErrorTreeRenderer::render`] pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Message elements inserted into the form
    pub rendered: usize,

    /// File-field messages dropped because files cannot be sent
    /// asynchronously in this environment
    pub skipped_files: usize,

    /// Lookup paths of messages that matched no element and were shown as
    /// form-level errors instead
    pub unresolved: Vec<String>,
}

impl RenderReport {
    pub fn has_visible_errors(&self) -> bool {
        self.rendered > 0
    }
}

/// Renders validation errors next to the inputs they belong to
///
/// The traversal is depth-first in document order. Each key of the error
/// map is turned into a lookup path (see [`FieldPath::child`]) and matched
/// against the end of the inputs' `name` attributes, so an outer name prefix
/// such as `user` in `user[email]` never has to appear in the tree.
#[derive(Debug, Clone, Default)]
pub struct ErrorTreeRenderer {
    theme: RenderTheme,
    rules: PathRules,
    capabilities: Capabilities,
}

impl ErrorTreeRenderer {
    pub fn new(theme: RenderTheme, rules: PathRules, capabilities: Capabilities) -> Self {
        Self {
            theme,
            rules,
            capabilities,
        }
    }

    pub fn from_config(config: &Config, capabilities: Capabilities) -> Self {
        Self::new(config.theme.clone(), config.rules.clone(), capabilities)
    }

    pub fn theme(&self) -> &RenderTheme {
        &self.theme
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Remove every error class and message element previously rendered
    pub fn reset<D: FormDom>(&self, dom: &mut D) -> Result<()> {
        for node in dom.find_by_class(&self.theme.error_class)? {
            dom.remove_class(&node, &self.theme.error_class)?;
        }
        for node in dom.find_by_class(&self.theme.message_class)? {
            dom.remove(&node)?;
        }
        Ok(())
    }

    /// Render the errors of `tree` into the form
    ///
    /// Does not clear earlier output; call [`reset`](Self::reset) first.
    pub fn render<D: FormDom>(&self, tree: &ErrorTree, dom: &mut D) -> Result<RenderReport> {
        let mut report = RenderReport::default();
        if let Some(errors) = tree.error_map() {
            self.render_map(errors, &FieldPath::root(), dom, &mut report)?;
        }
        debug!(
            rendered = report.rendered,
            skipped_files = report.skipped_files,
            unresolved = report.unresolved.len(),
            "rendered error tree"
        );
        Ok(report)
    }

    fn render_map<D: FormDom>(
        &self,
        errors: &ErrorMap,
        cursor: &FieldPath,
        dom: &mut D,
        report: &mut RenderReport,
    ) -> Result<()> {
        for (key, value) in errors {
            if key == GLOBAL_KEY {
                self.render_global(&value.messages(), dom, report)?;
                continue;
            }
            self.render_entry(key, value, cursor, dom, report)?;
        }
        Ok(())
    }

    fn render_entry<D: FormDom>(
        &self,
        key: &str,
        value: &ErrorValue,
        cursor: &FieldPath,
        dom: &mut D,
        report: &mut RenderReport,
    ) -> Result<()> {
        let path = cursor.child(key, value.is_nested(), &self.rules);
        let found = self.lookup(&path, dom)?;

        if !found.is_empty() {
            return self.render_field(&found, &value.messages(), dom, report);
        }

        // No single input for this key: the errors belong to its children
        match value {
            ErrorValue::Message(message) => {
                warn!(path = %path, "no input matches error path, showing it on the form");
                report.unresolved.push(path.to_string());
                self.render_global(&[message.as_str()], dom, report)
            }
            ErrorValue::Messages(messages) => {
                debug!(path = %path, "descending into repeated field");
                for (index, message) in messages.iter().enumerate() {
                    let item = ErrorValue::Message(message.clone());
                    self.render_entry(&index.to_string(), &item, &path, dom, report)?;
                }
                Ok(())
            }
            ErrorValue::Nested(children) => {
                debug!(path = %path, "descending into compound field");
                self.render_map(children, &path, dom, report)
            }
        }
    }

    /// Elements for `path`, preferring un-indexed names where the rules say so
    ///
    /// Forms rendered without a name prefix (`email` rather than
    /// `user[email]`) are matched through the unqualified form of the path.
    fn lookup<D: FormDom>(&self, path: &FieldPath, dom: &D) -> Result<Vec<D::Node>> {
        let mut found = dom.find_by_name_suffix(path.as_str())?;

        if found.is_empty() {
            if let Some(name) = path.unqualified() {
                found = dom
                    .find_by_name_suffix(&name)?
                    .into_iter()
                    .filter(|node| dom.attribute(node, "name").as_deref() == Some(name.as_str()))
                    .collect();
            }
        }

        if found.len() > 1 && self.rules.prefers_unindexed(path.as_str()) {
            // The last un-indexed match wins
            let top_level = found.iter().rev().find(|node| {
                let name = dom.attribute(node, "name").unwrap_or_default();
                !has_index_segment(&name)
            });
            if let Some(node) = top_level {
                return Ok(vec![node.clone()]);
            }
        }

        Ok(found)
    }

    fn render_field<D: FormDom>(
        &self,
        found: &[D::Node],
        messages: &[&str],
        dom: &mut D,
        report: &mut RenderReport,
    ) -> Result<()> {
        let Some(anchor) = found.first() else {
            return Ok(());
        };

        match dom.input_kind(anchor) {
            InputKind::File if !self.capabilities.async_file_upload => {
                debug!(count = messages.len(), "skipping file field errors");
                report.skipped_files += messages.len();
                Ok(())
            }
            InputKind::File => self.render_in_containers(found, messages, dom, report),
            InputKind::Hidden => self.render_global(messages, dom, report),
            InputKind::Checkbox | InputKind::Radio => {
                let groups = distinct(found.iter().filter_map(|n| dom.closest(n, &self.theme.choice_group)));
                if groups.is_empty() {
                    return self.render_in_containers(found, messages, dom, report);
                }
                for group in groups {
                    dom.add_class(&group, &self.theme.error_class)?;
                    let mut reference = group;
                    for message in messages {
                        let element = self.message_element(dom, message)?;
                        dom.insert_after(&reference, &element)?;
                        reference = element;
                        report.rendered += 1;
                    }
                }
                Ok(())
            }
            InputKind::Other => self.render_in_containers(found, messages, dom, report),
        }
    }

    /// Mark the nearest container of each match and append the messages
    fn render_in_containers<D: FormDom>(
        &self,
        found: &[D::Node],
        messages: &[&str],
        dom: &mut D,
        report: &mut RenderReport,
    ) -> Result<()> {
        let containers = distinct(found.iter().filter_map(|n| dom.closest(n, &self.theme.container)));
        if containers.is_empty() {
            return self.render_global(messages, dom, report);
        }

        for container in containers {
            dom.add_class(&container, &self.theme.error_class)?;
            // Messages of grouped inputs go below the whole group
            let target = if dom.matches(&container, &self.theme.input_group) {
                dom.parent(&container, &self.theme.container)
                    .unwrap_or_else(|| container.clone())
            } else {
                container.clone()
            };
            for message in messages {
                let element = self.message_element(dom, message)?;
                dom.append_child(&target, &element)?;
                report.rendered += 1;
            }
        }
        Ok(())
    }

    /// Prepend each message to the top of the form
    fn render_global<D: FormDom>(
        &self,
        messages: &[&str],
        dom: &mut D,
        report: &mut RenderReport,
    ) -> Result<()> {
        let form = dom.form();
        for message in messages {
            let element = self.message_element(dom, message)?;
            dom.prepend_child(&form, &element)?;
            report.rendered += 1;
        }
        Ok(())
    }

    fn message_element<D: FormDom>(&self, dom: &mut D, message: &str) -> Result<D::Node> {
        Ok(dom.create_element(&self.theme.message_tag, &self.theme.message_class, message)?)
    }
}

fn distinct<N: PartialEq>(nodes: impl Iterator<Item = N>) -> Vec<N> {
    let mut out: Vec<N> = Vec::new();
    for node in nodes {
        if !out.contains(&node) {
            out.push(node);
        }
    }
    out
}
