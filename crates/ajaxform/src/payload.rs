// File: src/payload.rs
// Purpose: Request bodies for a validation submit

use crate::config::Capabilities;
use crate::dom::{ControlValue, FormControl};

pub const URL_ENCODED: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Body of a validation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    /// `a=1&b=2`, file controls left out
    UrlEncoded(String),
    /// Every control including files; the transport picks the boundary
    Multipart(Vec<FormControl>),
}

impl FormPayload {
    /// Encode the controls the way the environment can submit them
    pub fn build(controls: Vec<FormControl>, capabilities: Capabilities) -> Self {
        if capabilities.async_file_upload {
            FormPayload::Multipart(controls)
        } else {
            FormPayload::UrlEncoded(url_encode(&controls))
        }
    }

    /// Content type to send, `None` when the transport must generate one
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            FormPayload::UrlEncoded(_) => Some(URL_ENCODED),
            FormPayload::Multipart(_) => None,
        }
    }
}

/// jQuery-style serialization: spaces become `+`, files are skipped
pub fn url_encode(controls: &[FormControl]) -> String {
    controls
        .iter()
        .filter_map(|control| match &control.value {
            ControlValue::Text(value) => Some(format!(
                "{}={}",
                encode_component(&control.name),
                encode_component(value)
            )),
            ControlValue::File { .. } => None,
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_component(s: &str) -> String {
    urlencoding::encode(s).replace("%20", "+")
}
