// File: src/options.rs
// Purpose: Read the JS options object into validator options and hooks

use ajaxform::{ClientConfig, Config, ErrorTree, Hooks, RenderReport, TransportError, ValidationRequest};
use js_sys::{Array, Function, Object, Reflect};
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};

/// What `beforeValidation` receives
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestInfo<'a> {
    url: &'a str,
    method: &'a str,
    multipart: bool,
}

/// Parse `url` / `src`, `method`, `dataType`, `theme` and `rules` from the
/// options object
///
/// Function-valued entries are callbacks and are read by [`hooks`].
pub fn client_config(options: &JsValue) -> Result<Config, JsValue> {
    let Some(object) = options.dyn_ref::<Object>() else {
        return Ok(Config::default());
    };

    let plain = Object::new();
    for entry in Object::entries(object).iter() {
        let pair: Array = entry.unchecked_into();
        let value = pair.get(1);
        if !value.is_function() {
            Reflect::set(&plain, &pair.get(0), &value)?;
        }
    }

    serde_wasm_bindgen::from_value::<ClientConfig>(plain.into())
        .map(Config::from)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse options: {}", e)))
}

fn callback(options: &JsValue, name: &str) -> Option<Function> {
    if !options.is_object() {
        return None;
    }
    Reflect::get(options, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

fn invoke(f: &Function, args: &[JsValue]) {
    let args: Array = args.iter().collect();
    if let Err(err) = f.apply(&JsValue::NULL, &args) {
        web_sys::console::error_1(&err);
    }
}

fn tree_to_js(tree: &ErrorTree) -> JsValue {
    tree.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

/// Session hooks calling `beforeValidation`, `afterValidation` and `ajaxError`
pub fn hooks(options: &JsValue) -> Hooks {
    let mut hooks = Hooks::new();

    if let Some(f) = callback(options, "beforeValidation") {
        hooks = hooks.before_send(move |request: &ValidationRequest| {
            let info = RequestInfo {
                url: &request.url,
                method: &request.method,
                multipart: request.payload.content_type().is_none(),
            };
            let info = serde_wasm_bindgen::to_value(&info).unwrap_or(JsValue::NULL);
            invoke(&f, &[info]);
        });
    }

    if let Some(f) = callback(options, "afterValidation") {
        hooks = hooks.after_validation(move |tree: &ErrorTree, report: &RenderReport| {
            invoke(&f, &[tree_to_js(tree), JsValue::from(report.rendered as u32)]);
        });
    }

    if let Some(f) = callback(options, "ajaxError") {
        hooks = hooks.on_transport_error(move |err: &TransportError| {
            let status = match err {
                TransportError::Status { status, .. } => *status,
                _ => 0,
            };
            invoke(&f, &[JsValue::from_str(&err.to_string()), JsValue::from(status)]);
        });
    }

    hooks
}
