// File: src/routes.rs
// Purpose: Demo registration form validated over AJAX

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use ajaxform::{Config, FormTree, Matcher, RenderTheme};
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use indexmap::IndexMap;
use maud::{html, Markup, DOCTYPE};
use tower_http::services::ServeDir;
use tracing::info;

use crate::error::AppError;
use crate::request::{decode_form_body, decode_multipart, is_multipart};
use crate::response::AjaxValidatorJson;

/// Value of the hidden anti-forgery field rendered into the demo form
pub const DEMO_TOKEN: &str = "demo-token";

/// Number of phone rows in the demo form
const PHONE_ROWS: usize = 2;

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

/// Router with the demo page, its validation endpoint and the wasm bundle
///
/// The bundle produced by `wasm-pack build --target web` is served from
/// `pkg_dir` under `/pkg`.
pub fn app(pkg_dir: impl Into<PathBuf>) -> Router {
    app_with_config(pkg_dir, Config::default())
}

/// Same as [`app`], with the page markup and the browser renderer
/// following `config`
pub fn app_with_config(pkg_dir: impl Into<PathBuf>, config: Config) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };
    Router::new()
        .route("/", get(index_handler))
        .route("/register", get(index_handler).post(register_handler))
        .nest_service("/pkg", ServeDir::new(pkg_dir.into()))
        .with_state(state)
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    Ok(Html(registration_page(&state.config)?.into_string()))
}

async fn register_handler(request: Request) -> Result<Response, AppError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map(str::to_string);

    let fields = if is_multipart(content_type.as_deref()) {
        let multipart = match Multipart::from_request(request, &()).await {
            Ok(multipart) => multipart,
            Err(rejection) => return Ok(rejection.into_response()),
        };
        match decode_multipart(multipart).await {
            Ok(fields) => fields,
            Err(err) => return Ok(err.into_response()),
        }
    } else {
        let body = match Bytes::from_request(request, &()).await {
            Ok(body) => body,
            Err(rejection) => return Ok(rejection.into_response()),
        };
        decode_form_body(content_type.as_deref(), &body)
    };

    let errors = validate_registration(&fields);
    info!(fields = fields.len(), errors = errors.len(), "registration validated");

    let form = FormTree::from_field_errors(errors);
    Ok(AjaxValidatorJson::from_form(&form)?.no_cache().into_response())
}

/// Field errors of a submitted registration, keyed without the `user` prefix
pub fn validate_registration(fields: &HashMap<String, String>) -> IndexMap<String, Vec<String>> {
    let mut errors: IndexMap<String, Vec<String>> = IndexMap::new();
    let value = |name: &str| fields.get(name).map(|v| v.trim()).unwrap_or_default();

    if value("user[_token]") != DEMO_TOKEN {
        errors.insert(
            "_token".to_string(),
            vec!["Your session expired, reload the page".to_string()],
        );
    }

    if value("user[name]").is_empty() {
        errors.insert("name".to_string(), vec!["Name is required".to_string()]);
    }

    let email = value("user[email]");
    if email.is_empty() {
        errors.insert("email".to_string(), vec!["Email is required".to_string()]);
    } else if !email.contains('@') || !email.contains('.') {
        errors.insert("email".to_string(), vec!["Invalid email format".to_string()]);
    }

    let password = value("user[password]");
    let mut password_errors = Vec::new();
    if password.chars().count() < 8 {
        password_errors.push("Password must be at least 8 characters".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        password_errors.push("Password must contain a digit".to_string());
    }
    if !password_errors.is_empty() {
        errors.insert("password".to_string(), password_errors);
    }

    if value("user[address][street]").is_empty() {
        errors.insert(
            "address[street]".to_string(),
            vec!["Street is required".to_string()],
        );
    }
    let zip = value("user[address][zip]");
    if zip.len() != 5 || !zip.chars().all(|c| c.is_ascii_digit()) {
        errors.insert(
            "address[zip]".to_string(),
            vec!["Zip code must be 5 digits".to_string()],
        );
    }

    for row in 0..PHONE_ROWS {
        let number = value(&format!("user[phones][{}][number]", row));
        if !number.is_empty() && (number.len() < 7 || !number.chars().all(|c| c.is_ascii_digit())) {
            errors.insert(
                format!("phones[{}][number]", row),
                vec!["Phone numbers use at least 7 digits".to_string()],
            );
        }
    }

    if value("user[terms]") != "on" {
        errors.insert(
            "terms".to_string(),
            vec!["You must accept the terms".to_string()],
        );
    }

    if !errors.is_empty() {
        errors.insert(
            "_general".to_string(),
            vec!["Please correct the highlighted fields".to_string()],
        );
    }

    errors
}

/// Wrapper classes the renderer will look for, taken from the theme
struct Layout {
    group: String,
    input_group: String,
    choice_group: String,
}

impl Layout {
    fn from_theme(theme: &RenderTheme) -> Self {
        let group = match &theme.container {
            Matcher::Class(class) => format!("form-group {}", class),
            Matcher::Tag(_) => "form-group".to_string(),
        };
        Self {
            group,
            input_group: class_or(&theme.input_group, "input-group"),
            choice_group: class_or(&theme.choice_group, "field-box-set"),
        }
    }
}

fn class_or(matcher: &Matcher, fallback: &str) -> String {
    match matcher {
        Matcher::Class(class) => class.clone(),
        Matcher::Tag(_) => fallback.to_string(),
    }
}

fn text_field(layout: &Layout, label: &str, name: &str, kind: &str) -> Markup {
    html! {
        div class=(layout.group) {
            label for=(name) { (label) }
            input type=(kind) class="form-control" id=(name) name=(name);
        }
    }
}

fn registration_page(config: &Config) -> Result<Markup, serde_json::Error> {
    let layout = Layout::from_theme(&config.theme);
    let client = serde_json::to_string(&config.client())?;

    Ok(html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { "ajaxform demo" }
                link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@3.4.1/dist/css/bootstrap.min.css";
            }
            body {
                div class="container" {
                    h1 { "Register" }
                    form id="registration" action="/register" method="post" data-ajaxform=(client) {
                        input type="hidden" name="user[_token]" value=(DEMO_TOKEN);
                        (text_field(&layout, "Name", "user[name]", "text"))
                        (text_field(&layout, "Email", "user[email]", "email"))
                        (text_field(&layout, "Password", "user[password]", "password"))
                        fieldset {
                            legend { "Address" }
                            (text_field(&layout, "Street", "user[address][street]", "text"))
                            div class=(layout.group) {
                                label for="user[address][zip]" { "Zip code" }
                                div class=(layout.input_group) {
                                    span class="input-group-addon" { "#" }
                                    input type="text" class="form-control" id="user[address][zip]" name="user[address][zip]";
                                }
                            }
                        }
                        fieldset {
                            legend { "Phones" }
                            @for row in 0..PHONE_ROWS {
                                (text_field(&layout, &format!("Phone {}", row + 1), &format!("user[phones][{}][number]", row), "tel"))
                            }
                        }
                        div class=(layout.group) {
                            div class=(layout.choice_group) {
                                label {
                                    input type="checkbox" name="user[terms]";
                                    " I accept the terms"
                                }
                            }
                        }
                        button type="submit" class="btn btn-primary" { "Register" }
                    }
                }
                script type="module" {
                    (maud::PreEscaped(r#"
import init, { ajaxValidate } from "/pkg/ajaxform_wasm.js";
await init();
const form = document.getElementById("registration");
ajaxValidate(form, {
  ...JSON.parse(form.dataset.ajaxform),
  afterValidation: (errors, rendered) => console.debug("validation errors shown", rendered),
  ajaxError: (error) => console.error("validation request failed", error),
});
"#))
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid_fields() -> HashMap<String, String> {
        [
            ("user[_token]", DEMO_TOKEN),
            ("user[name]", "Jane"),
            ("user[email]", "jane@example.com"),
            ("user[password]", "hunter2hunter2"),
            ("user[address][street]", "1 Main St"),
            ("user[address][zip]", "12345"),
            ("user[phones][0][number]", "5551234"),
            ("user[terms]", "on"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_valid_registration_has_no_errors() {
        assert!(validate_registration(&valid_fields()).is_empty());
    }

    #[test]
    fn test_invalid_registration_keys() {
        let mut fields = valid_fields();
        fields.insert("user[email]".to_string(), "nope".to_string());
        fields.insert("user[phones][1][number]".to_string(), "12ab".to_string());
        fields.remove("user[terms]");

        let errors = validate_registration(&fields);
        let keys: Vec<&str> = errors.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["email", "phones[1][number]", "terms", "_general"]);
    }

    #[test]
    fn test_page_contains_form_fields() {
        let page = registration_page(&Config::default()).unwrap().into_string();
        assert!(page.contains(r#"action="/register""#));
        assert!(page.contains(r#"name="user[address][zip]""#));
        assert!(page.contains(r#"class="field-box-set""#));
        assert!(page.contains("data-ajaxform="));
    }

    #[test]
    fn test_page_follows_configured_theme() {
        let mut config = Config::default();
        config.theme.container = Matcher::class("row");
        config.theme.choice_group = Matcher::class("checkbox-list");
        config.theme.error_class = "has-error".to_string();

        let page = registration_page(&config).unwrap().into_string();
        assert!(page.contains(r#"class="form-group row""#));
        assert!(page.contains(r#"class="checkbox-list""#));
        assert!(!page.contains("field-box-set"));
        // The client settings are embedded as escaped JSON
        assert!(page.contains("&quot;error_class&quot;:&quot;has-error&quot;"));
    }
}
