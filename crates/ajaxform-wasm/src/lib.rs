//! ajaxform WASM
//!
//! Browser bindings: validate a form over AJAX before it is submitted and
//! render the server's error tree next to the offending inputs.
//!
//! ```javascript
//! import init, { ajaxValidate } from "./pkg/ajaxform_wasm.js";
//! await init();
//! const validator = ajaxValidate(document.querySelector("form"), {
//!     afterValidation: (errors, rendered) => console.log(rendered),
//! });
//! ```

pub mod dom;
pub mod options;
pub mod transport;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use ajaxform::{
    Capabilities, Config, ErrorMap, ErrorTree, ErrorTreeRenderer, Outcome, RequestId,
    TransportError, TransportResponse, ValidationSession,
};
use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlFormElement};

pub use dom::WebForm;
pub use transport::{XhrHandle, XhrTransport};

/// Set panic hook for better error messages in the browser
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

struct Attached {
    session: ValidationSession<XhrTransport>,
    dom: WebForm,
}

type Shared = Rc<RefCell<Option<Attached>>>;

/// Files can be sent asynchronously when the browser has `FormData`
pub fn detect_capabilities() -> Capabilities {
    let async_file_upload = web_sys::window()
        .and_then(|w| Reflect::get(&w, &JsValue::from_str("FormData")).ok())
        .map(|v| !v.is_undefined())
        .unwrap_or(false);
    Capabilities { async_file_upload }
}

fn renderer_for(config: &Config) -> ErrorTreeRenderer {
    ErrorTreeRenderer::from_config(config, detect_capabilities())
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsError::new(&err.to_string()).into()
}

/// The form behind `target`: a form element, or an array-like holding
/// exactly one
fn single_form(target: &JsValue) -> Result<HtmlFormElement, JsValue> {
    if let Some(form) = target.dyn_ref::<HtmlFormElement>() {
        return Ok(form.clone());
    }

    if target.is_object() {
        let length = Reflect::get(target, &JsValue::from_str("length"))
            .ok()
            .and_then(|l| l.as_f64());
        if length == Some(1.0) {
            if let Ok(first) = Reflect::get_u32(target, 0) {
                if let Some(form) = first.dyn_ref::<HtmlFormElement>() {
                    return Ok(form.clone());
                }
            }
        }
    }

    Err(js_error(
        "ajaxValidate expects exactly one <form> element",
    ))
}

/// Parse an error tree from a JSON string or a plain JS object
fn parse_tree(json: &JsValue) -> Result<ErrorTree, JsValue> {
    let text = match json.as_string() {
        Some(text) => text,
        None => js_sys::JSON::stringify(json)?
            .as_string()
            .unwrap_or_default(),
    };
    ErrorTree::from_json(&text).map_err(js_error)
}

fn parse_errors(errors: &JsValue) -> Result<ErrorMap, JsValue> {
    let text = match errors.as_string() {
        Some(text) => text,
        None => js_sys::JSON::stringify(errors)?
            .as_string()
            .unwrap_or_default(),
    };
    serde_json::from_str(&text).map_err(js_error)
}

fn on_complete(
    shared: &Weak<RefCell<Option<Attached>>>,
    id: RequestId,
    response: Result<TransportResponse, TransportError>,
) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    // Busy means this fired synchronously from an abort inside submit
    let Ok(mut guard) = shared.try_borrow_mut() else {
        return;
    };
    let Some(attached) = guard.as_mut() else {
        return;
    };

    match attached.session.complete(id, response, &mut attached.dom) {
        Ok(Some(Outcome::Submit)) => {
            let form = attached.dom.form_element().clone();
            drop(guard);
            // Does not fire `submit`, so validation is not triggered again
            if let Err(err) = form.submit() {
                web_sys::console::error_1(&err);
            }
        }
        Ok(_) => {}
        Err(err) => web_sys::console::error_1(&js_error(err)),
    }
}

/// Validator attached to one form by [`ajax_validate`]
#[wasm_bindgen]
pub struct AjaxValidator {
    shared: Shared,
    form: HtmlFormElement,
    on_submit: Closure<dyn FnMut(Event)>,
}

#[wasm_bindgen]
impl AjaxValidator {
    /// Messages rendered by the last handled response
    #[wasm_bindgen(js_name = errorCount)]
    pub fn error_count(&self) -> u32 {
        self.shared
            .try_borrow()
            .ok()
            .and_then(|guard| guard.as_ref().map(|a| a.session.error_count() as u32))
            .unwrap_or(0)
    }

    /// Remove rendered errors from the form
    pub fn reset(&self) -> Result<(), JsValue> {
        let mut guard = self.shared.try_borrow_mut().map_err(js_error)?;
        if let Some(attached) = guard.as_mut() {
            attached
                .session
                .renderer()
                .reset(&mut attached.dom)
                .map_err(js_error)?;
        }
        Ok(())
    }

    /// Render an `errors` map; true when at least one message is visible
    #[wasm_bindgen(js_name = handleErrors)]
    pub fn handle_errors(&self, errors: JsValue) -> Result<bool, JsValue> {
        let tree = ErrorTree::failure(parse_errors(&errors)?);
        let mut guard = self.shared.try_borrow_mut().map_err(js_error)?;
        let Some(attached) = guard.as_mut() else {
            return Ok(false);
        };
        let report = attached
            .session
            .renderer()
            .render(&tree, &mut attached.dom)
            .map_err(js_error)?;
        Ok(report.has_visible_errors())
    }

    /// Stop validating: abort the live request and restore normal submission
    pub fn detach(self) -> Result<(), JsValue> {
        self.form.remove_event_listener_with_callback(
            "submit",
            self.on_submit.as_ref().unchecked_ref(),
        )?;
        if let Some(mut attached) = self.shared.try_borrow_mut().map_err(js_error)?.take() {
            attached.session.abort();
        }
        Ok(())
    }
}

/// Attach AJAX validation to a form
///
/// `options` may set `url` (or `src`), `method`, `dataType`, the render
/// `theme` and lookup `rules`, and the callbacks `beforeValidation(request)`,
/// `afterValidation(errors, rendered)` and `ajaxError(message, status)`.
#[wasm_bindgen(js_name = ajaxValidate)]
pub fn ajax_validate(target: JsValue, options: JsValue) -> Result<AjaxValidator, JsValue> {
    let form = single_form(&target)?;
    let config = options::client_config(&options)?;
    let dom = WebForm::new(form.clone()).map_err(js_error)?;

    let shared: Shared = Rc::new(RefCell::new(None));
    let weak = Rc::downgrade(&shared);
    let transport = XhrTransport::new(
        form.clone(),
        Rc::new(move |id, response| on_complete(&weak, id, response)),
    );

    let session = ValidationSession::attach(&dom, config.validator.clone(), renderer_for(&config), transport)
        .map_err(js_error)?
        .with_hooks(options::hooks(&options));
    *shared.borrow_mut() = Some(Attached { session, dom });

    let weak = Rc::downgrade(&shared);
    let on_submit = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        event.prevent_default();
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let Ok(mut guard) = shared.try_borrow_mut() else {
            return;
        };
        if let Some(attached) = guard.as_mut() {
            if let Err(err) = attached.session.submit(&attached.dom) {
                web_sys::console::error_1(&js_error(err));
            }
        }
    });
    form.add_event_listener_with_callback("submit", on_submit.as_ref().unchecked_ref())?;

    Ok(AjaxValidator {
        shared,
        form,
        on_submit,
    })
}

/// Render an error tree (JSON string or object) into `form`
///
/// Earlier errors are left in place; call [`reset_errors`] first.
/// `options` may carry `theme` and `rules` as for [`ajax_validate`].
/// Returns the number of messages rendered.
#[wasm_bindgen(js_name = renderErrors)]
pub fn render_errors(form: HtmlFormElement, json: JsValue, options: JsValue) -> Result<u32, JsValue> {
    let tree = parse_tree(&json)?;
    let config = options::client_config(&options)?;
    let mut dom = WebForm::new(form).map_err(js_error)?;
    let report = renderer_for(&config).render(&tree, &mut dom).map_err(js_error)?;
    Ok(report.rendered as u32)
}

/// Remove every rendered error from `form`
#[wasm_bindgen(js_name = resetErrors)]
pub fn reset_errors(form: HtmlFormElement, options: JsValue) -> Result<(), JsValue> {
    let config = options::client_config(&options)?;
    let mut dom = WebForm::new(form).map_err(js_error)?;
    renderer_for(&config).reset(&mut dom).map_err(js_error)
}
