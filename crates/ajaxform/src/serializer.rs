// File: src/serializer.rs
// Purpose: Walk a validated form and build the error tree document

use crate::error::{AjaxFormError, Result};
use crate::form::FormNode;
use crate::tree::{ErrorMap, ErrorTree, ErrorValue, GLOBAL_KEY};

/// Serialize the validation state of a root form into an [`ErrorTree`]
///
/// A valid form, or one whose walk yields no errors at all, gives
/// `{"status": "success"}`. Messages of the root form land under
/// [`GLOBAL_KEY`]; messages of any other node are positional entries that sit
/// next to the node's erroring children.
pub fn serialize<F: FormNode>(form: &F) -> Result<ErrorTree> {
    if !form.is_root() {
        return Err(AjaxFormError::NotARootForm(form.name().to_string()));
    }

    if form.is_valid() {
        return Ok(ErrorTree::success());
    }

    match collect(form) {
        Some(ErrorValue::Nested(map)) if !map.is_empty() => {
            tracing::debug!(fields = map.len(), "form has validation errors");
            Ok(ErrorTree::failure(map))
        }
        _ => Ok(ErrorTree::success()),
    }
}

/// Error subtree of one node, `None` when nothing below it failed
fn collect<F: FormNode>(node: &F) -> Option<ErrorValue> {
    let own = node.errors();

    let mut children = ErrorMap::new();
    if node.count() > 0 {
        for (name, child) in node.children() {
            if let Some(subtree) = collect(child) {
                children.insert(name.to_string(), subtree);
            }
        }
    }

    if node.is_root() {
        let mut map = ErrorMap::new();
        if !own.is_empty() {
            map.insert(GLOBAL_KEY.to_string(), ErrorValue::Messages(own.to_vec()));
        }
        map.extend(children);
        return (!map.is_empty()).then_some(ErrorValue::Nested(map));
    }

    if children.is_empty() {
        // A field with nothing but its own messages is a plain list
        return (!own.is_empty()).then(|| ErrorValue::Messages(own.to_vec()));
    }

    // Own messages take the lowest indices no erroring child is keyed by
    let mut map = ErrorMap::new();
    let mut index = 0usize;
    for message in own {
        while children.contains_key(index.to_string().as_str()) {
            index += 1;
        }
        map.insert(index.to_string(), ErrorValue::Message(message.clone()));
        index += 1;
    }
    map.extend(children);

    Some(ErrorValue::Nested(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormTree;
    use crate::tree::Status;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn to_json(tree: &ErrorTree) -> serde_json::Value {
        serde_json::to_value(tree).unwrap()
    }

    #[test]
    fn test_valid_form_is_success() {
        let form = FormTree::root().child(FormTree::field("email"));
        let tree = serialize(&form).unwrap();
        assert_eq!(to_json(&tree), json!({ "status": "success" }));
    }

    #[test]
    fn test_child_node_is_rejected() {
        let form = FormTree::field("email").error("Invalid");
        let err = serialize(&form).unwrap_err();
        assert!(matches!(err, AjaxFormError::NotARootForm(name) if name == "email"));
    }

    #[test]
    fn test_root_messages_go_under_global_key() {
        let form = FormTree::root()
            .error("Too many attempts")
            .child(FormTree::field("email").error("Invalid email"));

        let tree = serialize(&form).unwrap();
        assert_eq!(tree.status, Status::Failure);
        assert_eq!(
            to_json(&tree),
            json!({
                "status": "failure",
                "errors": {
                    "__GLOBAL__": ["Too many attempts"],
                    "email": ["Invalid email"]
                }
            })
        );
    }

    #[test]
    fn test_node_messages_sit_beside_children() {
        let form = FormTree::root().child(
            FormTree::field("address")
                .error("Address is incomplete")
                .child(FormTree::field("street").error("Street is required"))
                .child(FormTree::field("city")),
        );

        let tree = serialize(&form).unwrap();
        assert_eq!(
            to_json(&tree)["errors"],
            json!({
                "address": {
                    "0": "Address is incomplete",
                    "street": ["Street is required"]
                }
            })
        );
    }

    #[test]
    fn test_collection_entries_are_keyed_by_index() {
        let form = FormTree::root().child(
            FormTree::field("addresses")
                .child(FormTree::field("0").child(FormTree::field("street")))
                .child(FormTree::field("1").child(FormTree::field("street").error("required"))),
        );

        let tree = serialize(&form).unwrap();
        assert_eq!(
            to_json(&tree)["errors"],
            json!({ "addresses": { "1": { "street": ["required"] } } })
        );
    }

    #[test]
    fn test_own_messages_skip_indices_taken_by_children() {
        let form = FormTree::root().child(
            FormTree::field("phones")
                .error("At most one phone")
                .error("Duplicate numbers")
                .child(FormTree::field("0").child(FormTree::field("number").error("Too short")))
                .child(FormTree::field("2").child(FormTree::field("number").error("Not a number"))),
        );

        let tree = serialize(&form).unwrap();
        assert_eq!(
            to_json(&tree)["errors"],
            json!({
                "phones": {
                    "1": "At most one phone",
                    "3": "Duplicate numbers",
                    "0": { "number": ["Too short"] },
                    "2": { "number": ["Not a number"] }
                }
            })
        );
    }
}
