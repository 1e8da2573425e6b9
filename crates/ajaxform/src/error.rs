// File: src/error.rs
// Purpose: Error types for the serializer, renderer, session and transports

use thiserror::Error;

/// Failure reported by a [`FormDom`](crate::dom::FormDom) implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("DOM operation failed: {0}")]
pub struct DomError(pub String);

impl DomError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors raised by the library itself
///
/// `NotAForm` and `NotARootForm` are contract violations: the caller handed
/// us something that is not a form, and nothing sensible can be done at
/// runtime.
#[derive(Debug, Error)]
pub enum AjaxFormError {
    #[error("validator must be attached to exactly one <form> element, got <{0}>")]
    NotAForm(String),

    #[error("error tree serialization must start at the root form, got child `{0}`")]
    NotARootForm(String),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error("failed to decode error tree: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AjaxFormError>;

/// Failures of the request collaborator, handed verbatim to the
/// `on_transport_error` hook
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server answered {status}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    Malformed(String),

    #[error("request could not be sent: {0}")]
    Rejected(String),
}
