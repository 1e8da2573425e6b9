//! Browser tests, run with `wasm-pack test --headless --firefox`

#![cfg(target_arch = "wasm32")]

use ajaxform_wasm::{ajax_validate, render_errors, reset_errors, WebForm};
use ajaxform::FormDom;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;
use web_sys::HtmlFormElement;

wasm_bindgen_test_configure!(run_in_browser);

fn mount(html: &str) -> HtmlFormElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let holder = document.create_element("div").unwrap();
    holder.set_inner_html(html);
    document.body().unwrap().append_child(&holder).unwrap();
    holder
        .query_selector("form")
        .unwrap()
        .unwrap()
        .dyn_into::<HtmlFormElement>()
        .unwrap()
}

const FORM: &str = r#"<form action="/register" method="post">
  <input type="hidden" name="user[_token]" value="t">
  <div class="form-group"><input type="email" name="user[email]" value="jane@example.com"></div>
  <div class="form-group"><div class="input-group"><input type="text" name="user[address][zip]"></div></div>
  <div class="form-group"><div class="field-box-set"><input type="checkbox" name="user[terms]"></div></div>
</form>"#;

#[wasm_bindgen_test]
fn render_and_reset_errors() {
    let form = mount(FORM);
    let json = r#"{"status":"failure","errors":{
        "__GLOBAL__":["Please correct the highlighted fields"],
        "email":["Invalid email"],
        "address":{"zip":["Zip code must be 5 digits"]},
        "terms":["You must accept the terms"]}}"#;

    let rendered = render_errors(form.clone(), JsValue::from_str(json), JsValue::UNDEFINED).unwrap();
    assert_eq!(rendered, 4);
    assert_eq!(form.get_elements_by_class_name("text-error").length(), 4);
    assert_eq!(form.get_elements_by_class_name("form-error").length(), 3);

    let first = form.first_element_child().unwrap();
    assert_eq!(first.text_content().unwrap(), "Please correct the highlighted fields");

    reset_errors(form.clone(), JsValue::UNDEFINED).unwrap();
    assert_eq!(form.get_elements_by_class_name("text-error").length(), 0);
    assert_eq!(form.get_elements_by_class_name("form-error").length(), 0);
}

#[wasm_bindgen_test]
fn messages_are_inserted_as_text() {
    let form = mount(FORM);
    let json = r#"{"status":"failure","errors":{"email":"<b>bold</b>"}}"#;

    render_errors(form.clone(), JsValue::from_str(json), JsValue::UNDEFINED).unwrap();
    let message = form.get_elements_by_class_name("text-error").item(0).unwrap();
    assert_eq!(message.text_content().unwrap(), "<b>bold</b>");
    assert_eq!(message.child_element_count(), 0);
}

#[wasm_bindgen_test]
fn controls_follow_form_submission_rules() {
    let form = mount(FORM);
    let dom = WebForm::new(form).unwrap();
    let names: Vec<String> = dom.controls().unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["user[_token]", "user[email]", "user[address][zip]"]);
}

#[wasm_bindgen_test]
fn ajax_validate_rejects_non_forms() {
    let document = web_sys::window().unwrap().document().unwrap();
    let div = document.create_element("div").unwrap();
    assert!(ajax_validate(div.into(), JsValue::UNDEFINED).is_err());
}

#[wasm_bindgen_test]
fn ajax_validate_attaches_to_form() {
    let form = mount(FORM);
    let validator = ajax_validate(form.into(), JsValue::UNDEFINED).unwrap();
    assert_eq!(validator.error_count(), 0);
    validator.detach().unwrap();
}

#[wasm_bindgen_test]
fn render_errors_follows_theme_option() {
    let form = mount(FORM);
    let options = js_sys::JSON::parse(
        r#"{"theme":{"error_class":"has-error","message_tag":"span","message_class":"help-block"}}"#,
    )
    .unwrap();
    let json = r#"{"status":"failure","errors":{"email":["Invalid email"]}}"#;

    let rendered = render_errors(form.clone(), JsValue::from_str(json), options.clone()).unwrap();
    assert_eq!(rendered, 1);
    assert_eq!(form.get_elements_by_class_name("has-error").length(), 1);
    let message = form.get_elements_by_class_name("help-block").item(0).unwrap();
    assert_eq!(message.tag_name(), "SPAN");
    assert_eq!(form.get_elements_by_class_name("text-error").length(), 0);

    reset_errors(form.clone(), options).unwrap();
    assert_eq!(form.get_elements_by_class_name("help-block").length(), 0);
}
