// File: src/request.rs
// Purpose: Decode submitted form bodies into field maps

use std::collections::HashMap;

use axum::extract::multipart::{Multipart, MultipartError};
use serde_json::Value as JsonValue;

/// True for `multipart/form-data` content types
pub fn is_multipart(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

/// Decode a request body into `name -> value` pairs
///
/// Understands `application/x-www-form-urlencoded` (with `+` for spaces) and
/// JSON objects; any other content type, or a body that fails to decode,
/// yields an empty map. Repeated names keep their last value.
pub fn decode_form_body(content_type: Option<&str>, body: &[u8]) -> HashMap<String, String> {
    let Some(ct) = content_type else {
        return HashMap::new();
    };

    if ct.contains("application/json") {
        serde_json::from_slice::<JsonValue>(body)
            .map(fields_from_json)
            .unwrap_or_default()
    } else if ct.contains("application/x-www-form-urlencoded") {
        let form_str = String::from_utf8_lossy(body);
        form_str
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) => (decode_component(k), decode_component(v)),
                None => (decode_component(pair), String::new()),
            })
            .collect()
    } else {
        HashMap::new()
    }
}

/// Drain a multipart body into `name -> value` pairs
///
/// File parts are not buffered: they map to the uploaded file name, or to
/// an empty string when no file was chosen. Repeated names keep their last
/// value.
pub async fn decode_multipart(mut multipart: Multipart) -> Result<HashMap<String, String>, MultipartError> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = match field.file_name() {
            Some(file_name) => file_name.to_string(),
            None => field.text().await?,
        };
        fields.insert(name, value);
    }
    Ok(fields)
}

fn decode_component(s: &str) -> String {
    let spaced = s.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|c| c.into_owned())
        .unwrap_or(spaced)
}

fn fields_from_json(value: JsonValue) -> HashMap<String, String> {
    let JsonValue::Object(map) = value else {
        return HashMap::new();
    };
    map.into_iter()
        .filter_map(|(k, v)| match v {
            JsonValue::Null => None,
            JsonValue::String(s) => Some((k, s)),
            other => Some((k, other.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_url_encoded_body() {
        let fields = decode_form_body(
            Some("application/x-www-form-urlencoded; charset=UTF-8"),
            b"user%5Bname%5D=Jane+Doe&note=a%26b&flag",
        );
        assert_eq!(fields["user[name]"], "Jane Doe");
        assert_eq!(fields["note"], "a&b");
        assert_eq!(fields["flag"], "");
    }

    #[test]
    fn test_json_body() {
        let fields = decode_form_body(
            Some("application/json"),
            br#"{"email":"a@b.c","age":42,"bio":null}"#,
        );
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["email"], "a@b.c");
        assert_eq!(fields["age"], "42");
    }

    #[rstest]
    #[case(Some("multipart/form-data; boundary=B"), true)]
    #[case(Some("application/x-www-form-urlencoded"), false)]
    #[case(None, false)]
    fn test_is_multipart(#[case] content_type: Option<&str>, #[case] expected: bool) {
        assert_eq!(is_multipart(content_type), expected);
    }

    #[rstest]
    #[case(None, "a=1")]
    #[case(Some("text/plain"), "a=1")]
    #[case(Some("application/json"), "not json")]
    #[case(Some("application/json"), "[1, 2]")]
    fn test_unusable_body_is_empty(#[case] content_type: Option<&str>, #[case] body: &str) {
        assert!(decode_form_body(content_type, body.as_bytes()).is_empty());
    }
}
