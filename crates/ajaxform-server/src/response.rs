// File: src/response.rs
// Purpose: JSON answer of an AJAX validation endpoint

use ajaxform::{serialize, ErrorTree, FormNode};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::debug;

/// The `{"status": ..., "errors": ...}` document as an axum response
///
/// Always `200 OK` unless changed: a failed validation is a successful
/// request, and the client only treats non-2xx answers as transport errors.
pub struct AjaxValidatorJson {
    tree: ErrorTree,
    headers: HeaderMap,
    status: StatusCode,
}

impl AjaxValidatorJson {
    pub fn new(tree: ErrorTree) -> Self {
        Self {
            tree,
            headers: HeaderMap::new(),
            status: StatusCode::OK,
        }
    }

    /// Serialize the validation state of a root form
    pub fn from_form<F: FormNode>(form: &F) -> ajaxform::Result<Self> {
        let tree = serialize(form)?;
        debug!(success = tree.is_success(), "validation response built");
        Ok(Self::new(tree))
    }

    pub fn success() -> Self {
        Self::new(ErrorTree::success())
    }

    pub fn tree(&self) -> &ErrorTree {
        &self.tree
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Add a header; invalid names or values are ignored
    pub fn header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(val)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, val);
        }
        self
    }

    pub fn no_cache(mut self) -> Self {
        self.headers.insert(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store"),
        );
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }
}

impl From<ErrorTree> for AjaxValidatorJson {
    fn from(tree: ErrorTree) -> Self {
        Self::new(tree)
    }
}

impl IntoResponse for AjaxValidatorJson {
    fn into_response(self) -> Response {
        (self.status, self.headers, axum::Json(self.tree)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ajaxform::FormTree;

    #[test]
    fn test_from_form_rejects_non_root() {
        let field = FormTree::field("email").error("Invalid");
        assert!(matches!(
            AjaxValidatorJson::from_form(&field),
            Err(ajaxform::AjaxFormError::NotARootForm(name)) if name == "email"
        ));
    }

    #[test]
    fn test_builder_sets_status_and_headers() {
        let response = AjaxValidatorJson::success()
            .status(StatusCode::ACCEPTED)
            .header("x-validator", "ajaxform")
            .header("bad header", "ignored")
            .no_cache()
            .into_response();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["x-validator"], "ajaxform");
        assert_eq!(response.headers()["cache-control"], "no-store");
        assert_eq!(response.headers()["content-type"], "application/json");
        assert!(response.headers().get("bad header").is_none());
    }
}
