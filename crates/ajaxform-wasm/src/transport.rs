// File: src/transport.rs
// Purpose: XMLHttpRequest transport for the validation session

use std::rc::Rc;

use ajaxform::{
    FormPayload, RequestHandle, RequestId, Transport, TransportError, TransportResponse,
    ValidationRequest,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{FormData, HtmlFormElement, XmlHttpRequest};

use crate::dom::js_message;

/// Receives the result of every request the transport sent
pub type Completion = Rc<dyn Fn(RequestId, Result<TransportResponse, TransportError>)>;

pub struct XhrTransport {
    form: HtmlFormElement,
    on_complete: Completion,
}

impl XhrTransport {
    pub fn new(form: HtmlFormElement, on_complete: Completion) -> Self {
        Self { form, on_complete }
    }

    fn open(&self, request: &ValidationRequest, url: &str) -> Result<XmlHttpRequest, TransportError> {
        let xhr = XmlHttpRequest::new().map_err(rejected)?;
        xhr.open_with_async(&request.method, url, true)
            .map_err(rejected)?;
        xhr.set_request_header("Accept", request.accept)
            .map_err(rejected)?;
        xhr.set_request_header("X-Requested-With", "XMLHttpRequest")
            .map_err(rejected)?;
        Ok(xhr)
    }
}

fn rejected(value: wasm_bindgen::JsValue) -> TransportError {
    TransportError::Rejected(js_message(&value))
}

/// Methods whose url-encoded data travels in the query string
fn sends_query(method: &str) -> bool {
    matches!(method, "GET" | "HEAD")
}

fn with_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{}&{}", url, query)
    } else {
        format!("{}?{}", url, query)
    }
}

/// Status and body of a finished request; status 0 means it never reached
/// the server
fn finished(xhr: &XmlHttpRequest) -> Result<TransportResponse, TransportError> {
    let status = xhr.status().map_err(|e| TransportError::Network(js_message(&e)))?;
    if status == 0 {
        return Err(TransportError::Network("request did not complete".to_string()));
    }
    let body = xhr.response_text().ok().flatten().unwrap_or_default();
    Ok(TransportResponse { status, body })
}

impl Transport for XhrTransport {
    type Handle = XhrHandle;

    fn send(&mut self, id: RequestId, request: ValidationRequest) -> Result<XhrHandle, TransportError> {
        let xhr = match &request.payload {
            FormPayload::UrlEncoded(query) if sends_query(&request.method) => {
                let xhr = self.open(&request, &with_query(&request.url, query))?;
                xhr.send().map_err(rejected)?;
                xhr
            }
            FormPayload::UrlEncoded(body) => {
                let xhr = self.open(&request, &request.url)?;
                if let Some(content_type) = request.payload.content_type() {
                    xhr.set_request_header("Content-Type", content_type)
                        .map_err(rejected)?;
                }
                xhr.send_with_opt_str(Some(body)).map_err(rejected)?;
                xhr
            }
            FormPayload::Multipart(_) => {
                // The browser encodes the form itself, files included
                let data = FormData::new_with_form(&self.form).map_err(rejected)?;
                let xhr = self.open(&request, &request.url)?;
                xhr.send_with_opt_form_data(Some(&data)).map_err(rejected)?;
                xhr
            }
        };

        // loadend fires exactly once, after load, error, abort or timeout
        let on_complete = self.on_complete.clone();
        let target = xhr.clone();
        let listener = Closure::once_into_js(move || {
            on_complete(id, finished(&target));
        });
        xhr.set_onloadend(Some(listener.unchecked_ref()));

        Ok(XhrHandle { xhr })
    }
}

pub struct XhrHandle {
    xhr: XmlHttpRequest,
}

impl RequestHandle for XhrHandle {
    fn abort(&mut self) {
        if let Err(err) = self.xhr.abort() {
            web_sys::console::warn_1(&err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_query() {
        assert_eq!(with_query("/validate", ""), "/validate");
        assert_eq!(with_query("/validate", "a=1"), "/validate?a=1");
        assert_eq!(with_query("/validate?x=y", "a=1"), "/validate?x=y&a=1");
    }

    #[test]
    fn test_only_get_and_head_send_query() {
        assert!(sends_query("GET"));
        assert!(sends_query("HEAD"));
        assert!(!sends_query("POST"));
    }
}
