// File: src/form.rs
// Purpose: Validated form tree consumed by the error tree serializer

/// A node of a validated form, as exposed by the validation engine
///
/// The root node is the form itself; every other node is a field or a
/// sub-form. Children are yielded in declaration order together with the
/// key they are submitted under (a field name, or an index for collection
/// entries).
pub trait FormNode {
    /// Key of this node inside its parent (empty for the root)
    fn name(&self) -> &str;

    /// True when neither this node nor any descendant carries an error
    fn is_valid(&self) -> bool;

    fn is_root(&self) -> bool;

    /// Messages attached to this node itself
    fn errors(&self) -> &[String];

    fn children(&self) -> impl Iterator<Item = (&str, &Self)>;

    fn count(&self) -> usize;
}

/// Owned form tree
///
/// Built either by hand with the builder methods or from the flat
/// `field -> messages` maps returned by derive-based validators.
///
/// ```
/// use ajaxform::form::FormTree;
///
/// let form = FormTree::root()
///     .error("Too many attempts")
///     .child(FormTree::field("email").error("Invalid email"))
///     .child(
///         FormTree::field("address")
///             .child(FormTree::field("street").error("Street is required")),
///     );
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormTree {
    name: String,
    root: bool,
    errors: Vec<String>,
    children: Vec<FormTree>,
}

/// Keys that validators use for errors not tied to one field
const GLOBAL_FIELD_KEYS: &[&str] = &["_general", crate::tree::GLOBAL_KEY];

impl FormTree {
    /// Create the root form node
    pub fn root() -> Self {
        Self {
            root: true,
            ..Self::default()
        }
    }

    /// Create a field (or sub-form) node
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Attach a message to this node
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }

    /// Append a child node; a child is never a root
    pub fn child(mut self, mut child: FormTree) -> Self {
        child.root = false;
        self.children.push(child);
        self
    }

    /// Build a root form from flat `field -> messages` pairs
    ///
    /// Field keys may use bracket (`address[street]`, `items[0][sku]`) or dot
    /// (`address.street`) notation. `_general` and `__GLOBAL__` name errors of
    /// the form itself. Children are created in the order the pairs are
    /// yielded, so pass an ordered map when declaration order matters.
    pub fn from_field_errors<I, K, M, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = (K, M)>,
        K: AsRef<str>,
        M: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut form = Self::root();
        for (field, messages) in errors {
            let field = field.as_ref();
            let path = if GLOBAL_FIELD_KEYS.contains(&field) {
                Vec::new()
            } else {
                split_field_path(field)
            };
            for message in messages {
                form.add_error_at(&path, message);
            }
        }
        form
    }

    /// Attach a message to the node at `path`, creating missing nodes
    pub fn add_error_at<S: AsRef<str>>(&mut self, path: &[S], message: impl Into<String>) {
        let mut node = self;
        for segment in path {
            let segment = segment.as_ref();
            let position = match node.children.iter().position(|c| c.name == segment) {
                Some(position) => position,
                None => {
                    node.children.push(FormTree::field(segment));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[position];
        }
        node.errors.push(message.into());
    }
}

impl FormNode for FormTree {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.children.iter().all(FormTree::is_valid)
    }

    fn is_root(&self) -> bool {
        self.root
    }

    fn errors(&self) -> &[String] {
        &self.errors
    }

    fn children(&self) -> impl Iterator<Item = (&str, &Self)> {
        self.children.iter().map(|c| (c.name.as_str(), c))
    }

    fn count(&self) -> usize {
        self.children.len()
    }
}

/// Split `a[b][0]` or `a.b.0` into its segments, dropping empty `[]` parts
pub fn split_field_path(field: &str) -> Vec<String> {
    field
        .split(|c| c == '[' || c == ']' || c == '.')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
