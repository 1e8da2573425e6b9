// File: src/session.rs
// Purpose: One AJAX validation lifecycle per attached form

use std::fmt;

use tracing::{debug, info, warn};

use crate::config::{DataType, ValidatorOptions};
use crate::dom::FormDom;
use crate::error::{AjaxFormError, Result, TransportError};
use crate::payload::FormPayload;
use crate::renderer::{ErrorTreeRenderer, RenderReport};
use crate::tree::ErrorTree;

/// Identifies one submit of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything a transport needs to issue the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    pub url: String,
    pub method: String,
    /// Value for the `Accept` header
    pub accept: &'static str,
    pub payload: FormPayload,
}

/// Raw answer of the validation endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// A request that is still running
pub trait RequestHandle {
    /// Stop the request; its completion must never reach the session
    fn abort(&mut self);
}

/// The HTTP collaborator
///
/// `send` starts the request and returns immediately. When the request
/// finishes, the host hands the result back through
/// [`ValidationSession::complete`] together with the id it was sent with.
pub trait Transport {
    type Handle: RequestHandle;

    fn send(
        &mut self,
        id: RequestId,
        request: ValidationRequest,
    ) -> std::result::Result<Self::Handle, TransportError>;
}

type BeforeSend = Box<dyn FnMut(&ValidationRequest)>;
type AfterValidation = Box<dyn FnMut(&ErrorTree, &RenderReport)>;
type OnTransportError = Box<dyn FnMut(&TransportError)>;

/// Lifecycle callbacks
#[derive(Default)]
pub struct Hooks {
    before_send: Option<BeforeSend>,
    after_validation: Option<AfterValidation>,
    on_transport_error: Option<OnTransportError>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called right before the request is handed to the transport
    pub fn before_send(mut self, f: impl FnMut(&ValidationRequest) + 'static) -> Self {
        self.before_send = Some(Box::new(f));
        self
    }

    /// Called after errors were rendered and the submission was held back
    pub fn after_validation(mut self, f: impl FnMut(&ErrorTree, &RenderReport) + 'static) -> Self {
        self.after_validation = Some(Box::new(f));
        self
    }

    /// Called with network errors, non-2xx answers and undecodable bodies
    pub fn on_transport_error(mut self, f: impl FnMut(&TransportError) + 'static) -> Self {
        self.on_transport_error = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before_send", &self.before_send.is_some())
            .field("after_validation", &self.after_validation.is_some())
            .field("on_transport_error", &self.on_transport_error.is_some())
            .finish()
    }
}

/// What the host should do once a response was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Validation passed (or nothing could be shown): submit the form normally
    Submit,
    /// Errors are on screen; keep the user on the form
    Blocked(RenderReport),
    /// The request failed; the error went to `on_transport_error`
    TransportFailed(TransportError),
}

/// Validation state of one attached form
///
/// At most one request is live at a time: a new [`submit`](Self::submit)
/// aborts the previous one, and a late answer to an aborted request is
/// ignored by [`complete`](Self::complete).
pub struct ValidationSession<T: Transport> {
    url: String,
    method: String,
    data_type: DataType,
    renderer: ErrorTreeRenderer,
    hooks: Hooks,
    transport: T,
    in_flight: Option<(RequestId, T::Handle)>,
    next_id: u64,
    error_count: usize,
}

impl<T: Transport> ValidationSession<T> {
    /// Attach validation to the form held by `dom`
    ///
    /// Fails with [`AjaxFormError::NotAForm`] when the root is not a `<form>`.
    pub fn attach<D: FormDom>(
        dom: &D,
        options: ValidatorOptions,
        renderer: ErrorTreeRenderer,
        transport: T,
    ) -> Result<Self> {
        let form = dom.form();
        let tag = dom.tag_name(&form);
        if !tag.eq_ignore_ascii_case("form") {
            return Err(AjaxFormError::NotAForm(tag));
        }

        let url = options
            .url
            .filter(|u| !u.is_empty())
            .or_else(|| dom.attribute(&form, "action"))
            .unwrap_or_default();
        let method = options
            .method
            .filter(|m| !m.is_empty())
            .or_else(|| dom.attribute(&form, "method"))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "GET".to_string())
            .to_ascii_uppercase();

        debug!(url = %url, method = %method, "attached form validator");

        Ok(Self {
            url,
            method,
            data_type: options.data_type,
            renderer,
            hooks: Hooks::default(),
            transport,
            in_flight: None,
            next_id: 0,
            error_count: 0,
        })
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Errors rendered by the last handled response
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn pending(&self) -> Option<RequestId> {
        self.in_flight.as_ref().map(|(id, _)| *id)
    }

    pub fn renderer(&self) -> &ErrorTreeRenderer {
        &self.renderer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Start validating the current form contents
    ///
    /// Returns `None` when the transport refused the request; the error has
    /// then been passed to `on_transport_error`.
    pub fn submit<D: FormDom>(&mut self, dom: &D) -> Result<Option<RequestId>> {
        self.abort();
        self.error_count = 0;

        let payload = FormPayload::build(dom.controls()?, self.renderer.capabilities());
        let request = ValidationRequest {
            url: self.url.clone(),
            method: self.method.clone(),
            accept: self.data_type.accept(),
            payload,
        };

        if let Some(hook) = self.hooks.before_send.as_mut() {
            hook(&request);
        }

        self.next_id += 1;
        let id = RequestId(self.next_id);

        match self.transport.send(id, request) {
            Ok(handle) => {
                debug!(request = %id, "validation request sent");
                self.in_flight = Some((id, handle));
                Ok(Some(id))
            }
            Err(err) => {
                warn!(request = %id, error = %err, "validation request could not be sent");
                self.report_transport_error(&err);
                Ok(None)
            }
        }
    }

    /// Abort the live request, if any
    pub fn abort(&mut self) {
        if let Some((id, mut handle)) = self.in_flight.take() {
            debug!(request = %id, "aborting previous validation request");
            handle.abort();
        }
    }

    /// Handle the result of request `id`
    ///
    /// Returns `Ok(None)` without touching anything when `id` is not the
    /// live request (it was aborted or already handled).
    pub fn complete<D: FormDom>(
        &mut self,
        id: RequestId,
        response: std::result::Result<TransportResponse, TransportError>,
        dom: &mut D,
    ) -> Result<Option<Outcome>> {
        match &self.in_flight {
            Some((live, _)) if *live == id => {}
            _ => {
                debug!(request = %id, "ignoring response of a superseded request");
                return Ok(None);
            }
        }
        self.in_flight = None;

        let tree = match response.and_then(decode) {
            Ok(tree) => tree,
            Err(err) => {
                warn!(request = %id, error = %err, "validation request failed");
                self.report_transport_error(&err);
                return Ok(Some(Outcome::TransportFailed(err)));
            }
        };

        self.renderer.reset(dom)?;
        self.error_count = 0;

        if tree.is_success() {
            return Ok(Some(Outcome::Submit));
        }

        let report = self.renderer.render(&tree, dom)?;
        self.error_count = report.rendered;

        if !report.has_visible_errors() {
            info!(
                request = %id,
                skipped_files = report.skipped_files,
                "validation failed but no error could be shown, submitting"
            );
            return Ok(Some(Outcome::Submit));
        }

        if let Some(hook) = self.hooks.after_validation.as_mut() {
            hook(&tree, &report);
        }

        Ok(Some(Outcome::Blocked(report)))
    }

    fn report_transport_error(&mut self, err: &TransportError) {
        if let Some(hook) = self.hooks.on_transport_error.as_mut() {
            hook(err);
        }
    }
}

impl<T: Transport> fmt::Debug for ValidationSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationSession")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("pending", &self.pending())
            .field("error_count", &self.error_count)
            .finish()
    }
}

fn decode(response: TransportResponse) -> std::result::Result<ErrorTree, TransportError> {
    if !(200..300).contains(&response.status) {
        return Err(TransportError::Status {
            status: response.status,
            body: response.body,
        });
    }
    serde_json::from_str(&response.body).map_err(|e| TransportError::Malformed(e.to_string()))
}
