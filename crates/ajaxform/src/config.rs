// File: src/config.rs
// Purpose: Validator options, render theme and ajaxform.toml loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::dom::Matcher;
use crate::path::PathRules;

/// Options given by the code attaching a validator to a form
///
/// `url` and `method` fall back to the form's `action` and `method`
/// attributes when left empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorOptions {
    #[serde(default, alias = "src")]
    pub url: Option<String>,

    #[serde(default)]
    pub method: Option<String>,

    #[serde(default)]
    pub data_type: DataType,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            url: None,
            method: None,
            data_type: DataType::Json,
        }
    }
}

impl ValidatorOptions {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }
}

/// Expected format of the validation response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Json,
}

impl DataType {
    /// Value for the `Accept` header
    pub fn accept(&self) -> &'static str {
        match self {
            DataType::Json => "application/json, text/javascript, */*; q=0.01",
        }
    }
}

/// What the host environment can do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Files can be sent asynchronously (multipart payloads)
    pub async_file_upload: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            async_file_upload: true,
        }
    }
}

/// Markup used to decorate erroring fields; defaults target Bootstrap 3
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderTheme {
    /// Class added to the container of an erroring field
    #[serde(default = "default_error_class")]
    pub error_class: String,

    /// Tag of a message element
    #[serde(default = "default_message_tag")]
    pub message_tag: String,

    /// Class of a message element
    #[serde(default = "default_message_class")]
    pub message_class: String,

    /// Nearest enclosing field container
    #[serde(default = "default_container")]
    pub container: Matcher,

    /// Container of a checkbox or radio group
    #[serde(default = "default_choice_group")]
    pub choice_group: Matcher,

    /// Compound wrapper such as `.input-group`
    #[serde(default = "default_input_group")]
    pub input_group: Matcher,
}

fn default_error_class() -> String {
    "form-error".to_string()
}

fn default_message_tag() -> String {
    "p".to_string()
}

fn default_message_class() -> String {
    "text-error".to_string()
}

fn default_container() -> Matcher {
    Matcher::tag("div")
}

fn default_choice_group() -> Matcher {
    Matcher::class("field-box-set")
}

fn default_input_group() -> Matcher {
    Matcher::class("input-group")
}

impl Default for RenderTheme {
    fn default() -> Self {
        Self {
            error_class: default_error_class(),
            message_tag: default_message_tag(),
            message_class: default_message_class(),
            container: default_container(),
            choice_group: default_choice_group(),
            input_group: default_input_group(),
        }
    }
}

/// Contents of `ajaxform.toml`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: RenderTheme,

    #[serde(default)]
    pub rules: PathRules,

    #[serde(default)]
    pub validator: ValidatorOptions,
}

/// Environment variable naming an alternative config file
pub const CONFIG_ENV: &str = "AJAXFORM_CONFIG";

/// Default config file, relative to the working directory
pub const CONFIG_FILE: &str = "ajaxform.toml";

impl Config {
    /// Read and parse `path`; a missing or blank file gives the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(?path, "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read config file: {:?}", path))
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load from `$AJAXFORM_CONFIG`, falling back to `./ajaxform.toml`
    pub fn load_default() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(path),
            None => Self::load(CONFIG_FILE),
        }
    }

    /// The part of the configuration the browser binding needs
    pub fn client(&self) -> ClientConfig {
        ClientConfig {
            validator: self.validator.clone(),
            theme: self.theme.clone(),
            rules: self.rules.clone(),
        }
    }
}

/// Settings handed to the browser binding
///
/// Same content as [`Config`], with the validator options at the top level
/// so the object doubles as the options argument of `ajaxValidate`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(flatten)]
    pub validator: ValidatorOptions,

    #[serde(default)]
    pub theme: RenderTheme,

    #[serde(default)]
    pub rules: PathRules,
}

impl From<ClientConfig> for Config {
    fn from(client: ClientConfig) -> Self {
        Self {
            theme: client.theme,
            rules: client.rules,
            validator: client.validator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::AliasRule;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.theme.error_class, "form-error");
        assert_eq!(config.theme.message_tag, "p");
        assert_eq!(config.theme.container, Matcher::tag("div"));
        assert_eq!(config.rules.alias_for("[phoneNumber]"), Some("[phone]"));
        assert_eq!(config.validator.data_type, DataType::Json);
    }

    #[test]
    fn test_empty_config() {
        let config = toml::from_str::<Config>("").unwrap_or_default();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_custom_theme_and_rules() {
        let toml = r#"
            [theme]
            error_class = "has-error"
            message_tag = "span"
            message_class = "help-block"
            choice_group = { class = "checkbox-list" }

            [rules]
            aliases = [{ path = "[birthday]", suffix = "[date]" }]

            [validator]
            url = "/validate"
            method = "post"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.theme.error_class, "has-error");
        assert_eq!(config.theme.choice_group, Matcher::class("checkbox-list"));
        assert_eq!(config.theme.input_group, Matcher::class("input-group"));
        assert_eq!(config.rules.aliases, vec![AliasRule::new("[birthday]", "[date]")]);
        assert_eq!(config.rules.prefer_unindexed, vec!["[name]".to_string()]);
        assert_eq!(config.validator.url.as_deref(), Some("/validate"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load("does-not-exist/ajaxform.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_reads_file() {
        let path = std::env::temp_dir().join(format!("ajaxform-{}.toml", std::process::id()));
        fs::write(&path, "[theme]\nerror_class = \"has-error\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.theme.error_class, "has-error");
        assert_eq!(config.rules, PathRules::default());
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let path = std::env::temp_dir().join(format!("ajaxform-bad-{}.toml", std::process::id()));
        fs::write(&path, "[theme\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(err.to_string().starts_with("Failed to parse config file"));
    }

    #[test]
    fn test_client_config_round_trips_through_json() {
        let mut config = Config::default();
        config.theme.error_class = "has-error".to_string();
        config.validator = ValidatorOptions::default().url("/check");

        let json = serde_json::to_value(config.client()).unwrap();
        assert_eq!(json["url"], "/check");
        assert_eq!(json["dataType"], "json");
        assert_eq!(json["theme"]["error_class"], "has-error");

        let back: ClientConfig = serde_json::from_value(json).unwrap();
        assert_eq!(Config::from(back), config);
    }

    #[test]
    fn test_options_accept_camel_case() {
        let options: ValidatorOptions =
            serde_json::from_str(r#"{"src":"/check","dataType":"json"}"#).unwrap();
        assert_eq!(options.url.as_deref(), Some("/check"));
        assert_eq!(options.method, None);
    }
}
