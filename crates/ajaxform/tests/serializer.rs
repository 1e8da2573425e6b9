/// Server to client: a validated form is serialized, sent as JSON and
/// rendered back onto markup generated from the same field names.

use ajaxform::{serialize, Element, ErrorTree, ErrorTreeRenderer, FormDom, FormTree, MemoryDom};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::json;

fn group(name: &str) -> Element {
    Element::new("div")
        .class("form-group")
        .child(Element::input(name, "text"))
}

fn registration_markup() -> MemoryDom {
    MemoryDom::new(
        Element::new("form")
            .child(group("user[email]"))
            .child(group("user[address][street]"))
            .child(group("user[address][zip]"))
            .child(group("user[phones][0][number]"))
            .child(group("user[phones][1][number]")),
    )
}

fn container_has_error(dom: &MemoryDom, name: &str) -> bool {
    let input = dom.find_by_name(name).expect("input exists");
    let container = dom.parent_of(input).expect("input has a container");
    dom.has_class(container, "form-error")
}

#[test]
fn test_tree_shape_mirrors_form_hierarchy() {
    let mut errors: IndexMap<&str, Vec<&str>> = IndexMap::new();
    errors.insert("_general", vec!["Please fix the errors below"]);
    errors.insert("email", vec!["Invalid email"]);
    errors.insert("address[zip]", vec!["Unknown zip code"]);
    errors.insert("phones[1][number]", vec!["Too short", "Digits only"]);

    let tree = serialize(&FormTree::from_field_errors(errors)).unwrap();

    assert_eq!(
        serde_json::to_value(&tree).unwrap(),
        json!({
            "status": "failure",
            "errors": {
                "__GLOBAL__": ["Please fix the errors below"],
                "email": ["Invalid email"],
                "address": {"zip": ["Unknown zip code"]},
                "phones": {"1": {"number": ["Too short", "Digits only"]}}
            }
        })
    );
}

#[test]
fn test_serialized_errors_render_next_to_their_inputs() {
    let mut errors: IndexMap<&str, Vec<&str>> = IndexMap::new();
    errors.insert("_general", vec!["Please fix the errors below"]);
    errors.insert("email", vec!["Invalid email"]);
    errors.insert("address.zip", vec!["Unknown zip code"]);
    errors.insert("phones[1][number]", vec!["Too short", "Digits only"]);

    let json = serialize(&FormTree::from_field_errors(errors))
        .unwrap()
        .to_json()
        .unwrap();

    let mut dom = registration_markup();
    let report = ErrorTreeRenderer::default()
        .render(&ErrorTree::from_json(&json).unwrap(), &mut dom)
        .unwrap();

    assert_eq!(report.rendered, 5);
    assert!(report.unresolved.is_empty());

    assert!(container_has_error(&dom, "user[email]"));
    assert!(container_has_error(&dom, "user[address][zip]"));
    assert!(container_has_error(&dom, "user[phones][1][number]"));
    assert!(!container_has_error(&dom, "user[address][street]"));
    assert!(!container_has_error(&dom, "user[phones][0][number]"));

    let first = dom.children_of(dom.form())[0];
    assert_eq!(dom.text_of(first), "Please fix the errors below");
}

#[test]
fn test_valid_form_round_trips_to_success() {
    let form = FormTree::root().child(FormTree::field("email"));
    let json = serialize(&form).unwrap().to_json().unwrap();
    assert_eq!(json, r#"{"status":"success"}"#);

    let mut dom = registration_markup();
    let pristine = dom.to_html();
    let report = ErrorTreeRenderer::default()
        .render(&ErrorTree::from_json(&json).unwrap(), &mut dom)
        .unwrap();

    assert_eq!(report.rendered, 0);
    assert_eq!(dom.to_html(), pristine);
}

#[test]
fn test_compound_field_messages_fall_back_to_form() {
    let form = FormTree::root().child(
        FormTree::field("address")
            .error("Address is incomplete")
            .child(FormTree::field("zip").error("Unknown zip code")),
    );

    let tree = serialize(&form).unwrap();
    assert_eq!(
        serde_json::to_value(&tree).unwrap(),
        json!({
            "status": "failure",
            "errors": {"address": {"0": "Address is incomplete", "zip": ["Unknown zip code"]}}
        })
    );

    let mut dom = registration_markup();
    let report = ErrorTreeRenderer::default().render(&tree, &mut dom).unwrap();

    assert_eq!(report.rendered, 2);
    assert_eq!(report.unresolved, vec!["[address][]".to_string()]);
    assert!(container_has_error(&dom, "user[address][zip]"));
}

#[test]
fn test_collection_messages_keep_indexed_child_errors() {
    let form = FormTree::root().child(
        FormTree::field("phones")
            .error("At most one phone")
            .child(FormTree::field("0").child(FormTree::field("number").error("Too short"))),
    );

    let json = serialize(&form).unwrap().to_json().unwrap();
    let tree = ErrorTree::from_json(&json).unwrap();
    assert_eq!(
        serde_json::to_value(&tree).unwrap(),
        json!({
            "status": "failure",
            "errors": {"phones": {"1": "At most one phone", "0": {"number": ["Too short"]}}}
        })
    );

    let mut dom = registration_markup();
    let report = ErrorTreeRenderer::default().render(&tree, &mut dom).unwrap();

    assert_eq!(report.rendered, 2);
    assert_eq!(report.unresolved, vec!["[phones][]".to_string()]);
    assert!(container_has_error(&dom, "user[phones][0][number]"));
    assert!(!container_has_error(&dom, "user[phones][1][number]"));
}
