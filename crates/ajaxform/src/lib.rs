// ajaxform - AJAX form validation
// Server side: serialize a validated form into a nested error tree.
// Client side: map that tree onto the form's inputs and render the messages.

pub mod config;
pub mod dom;
pub mod error;
pub mod form;
pub mod memory;
pub mod path;
pub mod payload;
pub mod renderer;
pub mod serializer;
pub mod session;
pub mod tree;

pub use config::{Capabilities, ClientConfig, Config, DataType, RenderTheme, ValidatorOptions};
pub use dom::{ControlValue, FormControl, FormDom, InputKind, Matcher};
pub use error::{AjaxFormError, DomError, Result, TransportError};
pub use form::{FormNode, FormTree};
pub use memory::{Element, MemoryDom};
pub use path::{AliasRule, FieldPath, PathRules};
pub use payload::FormPayload;
pub use renderer::{ErrorTreeRenderer, RenderReport};
pub use serializer::serialize;
pub use session::{
    Hooks, Outcome, RequestHandle, RequestId, Transport, TransportResponse, ValidationRequest,
    ValidationSession,
};
pub use tree::{ErrorMap, ErrorTree, ErrorValue, Status, GLOBAL_KEY};
