// File: src/tree.rs
// Purpose: Wire model of the validation result exchanged between server and browser

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Key under which errors of the form itself (not of a field) are listed
pub const GLOBAL_KEY: &str = "__GLOBAL__";

/// Errors keyed by field name or collection index, in document order
pub type ErrorMap = IndexMap<String, ErrorValue>;

/// Overall outcome of a validation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
}

/// Validation errors at one point of the form tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, try_from = "JsonValue")]
pub enum ErrorValue {
    /// A single message for a scalar field
    Message(String),
    /// Several messages for the same field
    Messages(Vec<String>),
    /// A composite field whose children carry their own errors
    Nested(ErrorMap),
}

impl ErrorValue {
    pub fn message(message: impl Into<String>) -> Self {
        ErrorValue::Message(message.into())
    }

    /// True for a plain message string
    pub fn is_message(&self) -> bool {
        matches!(self, ErrorValue::Message(_))
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, ErrorValue::Nested(_))
    }

    /// All leaf messages, depth-first in document order
    pub fn messages(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_messages(&mut out);
        out
    }

    fn collect_messages<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ErrorValue::Message(m) => out.push(m),
            ErrorValue::Messages(list) => out.extend(list.iter().map(String::as_str)),
            ErrorValue::Nested(map) => {
                for value in map.values() {
                    value.collect_messages(out);
                }
            }
        }
    }
}

impl TryFrom<JsonValue> for ErrorValue {
    type Error = String;

    // Servers that encode "list or map" containers the PHP way send an array
    // whenever keys happen to be 0..n, so arrays of non-strings are read as
    // positional maps.
    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::String(s) => Ok(ErrorValue::Message(s)),
            JsonValue::Array(items) => {
                if items.iter().all(JsonValue::is_string) {
                    let messages = items
                        .into_iter()
                        .filter_map(|v| match v {
                            JsonValue::String(s) => Some(s),
                            _ => None,
                        })
                        .collect();
                    return Ok(ErrorValue::Messages(messages));
                }

                let mut map = ErrorMap::new();
                for (index, item) in items.into_iter().enumerate() {
                    if item.is_null() {
                        continue;
                    }
                    map.insert(index.to_string(), ErrorValue::try_from(item)?);
                }
                Ok(ErrorValue::Nested(map))
            }
            JsonValue::Object(object) => {
                let mut map = ErrorMap::with_capacity(object.len());
                for (key, item) in object {
                    map.insert(key, ErrorValue::try_from(item)?);
                }
                Ok(ErrorValue::Nested(map))
            }
            other => Err(format!(
                "expected a message, a list of messages or a map, got `{}`",
                other
            )),
        }
    }
}

impl From<&str> for ErrorValue {
    fn from(s: &str) -> Self {
        ErrorValue::Message(s.to_string())
    }
}

impl From<String> for ErrorValue {
    fn from(s: String) -> Self {
        ErrorValue::Message(s)
    }
}

impl From<Vec<String>> for ErrorValue {
    fn from(list: Vec<String>) -> Self {
        ErrorValue::Messages(list)
    }
}

impl From<ErrorMap> for ErrorValue {
    fn from(map: ErrorMap) -> Self {
        ErrorValue::Nested(map)
    }
}

/// The document a validation endpoint answers with
///
/// ```json
/// { "status": "failure", "errors": { "email": "Invalid email" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorTree {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<ErrorMap>,
}

impl ErrorTree {
    pub fn success() -> Self {
        Self {
            status: Status::Success,
            errors: None,
        }
    }

    pub fn failure(errors: ErrorMap) -> Self {
        Self {
            status: Status::Failure,
            errors: Some(errors),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Errors to render; empty for a successful result
    pub fn error_map(&self) -> Option<&ErrorMap> {
        match self.status {
            Status::Success => None,
            Status::Failure => self.errors.as_ref(),
        }
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_success_omits_errors() {
        let json = ErrorTree::success().to_json().unwrap();
        assert_eq!(json, r#"{"status":"success"}"#);
    }

    #[test]
    fn test_failure_document_keeps_key_order() {
        let tree = ErrorTree::from_json(
            r#"{"status":"failure","errors":{"zip":"bad","__GLOBAL__":["Too many attempts"],"email":"Invalid email"}}"#,
        )
        .unwrap();

        let keys: Vec<&str> = tree
            .error_map()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["zip", GLOBAL_KEY, "email"]);
    }

    #[test]
    fn test_array_of_maps_reads_as_positional_map() {
        let tree = ErrorTree::from_json(
            r#"{"status":"failure","errors":{"addresses":[null,{"street":["required"]}]}}"#,
        )
        .unwrap();

        let addresses = &tree.error_map().unwrap()["addresses"];
        let ErrorValue::Nested(map) = addresses else {
            panic!("expected nested map, got {:?}", addresses);
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["1"]);
        assert_eq!(
            map["1"],
            ErrorValue::Nested(ErrorMap::from([(
                "street".to_string(),
                ErrorValue::Messages(vec!["required".to_string()])
            )]))
        );
    }

    #[test]
    fn test_numbers_are_rejected() {
        let result = ErrorTree::from_json(r#"{"status":"failure","errors":{"age":42}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_success_status_hides_stray_errors() {
        let tree = ErrorTree::from_json(r#"{"status":"success","errors":{"a":"b"}}"#).unwrap();
        assert!(tree.error_map().is_none());
    }

    #[test]
    fn test_messages_flatten_depth_first() {
        let value = ErrorValue::try_from(serde_json::json!({
            "0": "own",
            "street": ["required", "too short"],
            "geo": { "lat": "invalid" }
        }))
        .unwrap();

        assert_eq!(
            value.messages(),
            vec!["own", "required", "too short", "invalid"]
        );
    }
}
