// File: src/path.rs
// Purpose: Field-name cursor used to map error tree keys onto input names

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static INDEX_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").unwrap());
static TRAILING_INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]$").unwrap());

/// True for a non-negative integer key such as `"0"` or `"12"`
pub fn is_index(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// True when `name` contains a bracketed integer segment like `[3]`
pub fn has_index_segment(name: &str) -> bool {
    INDEX_SEGMENT.is_match(name)
}

/// A path that is named differently in the markup than in the error tree
///
/// When the cursor equals `path` and a repeated scalar error is found, the
/// element is looked up with `suffix` appended instead of `[]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    pub path: String,
    pub suffix: String,
}

impl AliasRule {
    pub fn new(path: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            suffix: suffix.into(),
        }
    }
}

/// Naming exceptions applied while building lookup paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRules {
    /// Compatibility aliases for repeated scalar fields
    #[serde(default = "default_aliases")]
    pub aliases: Vec<AliasRule>,

    /// Suffixes for which a match outside any collection wins over
    /// collection items carrying a sub-field of the same name
    #[serde(default = "default_prefer_unindexed")]
    pub prefer_unindexed: Vec<String>,
}

fn default_aliases() -> Vec<AliasRule> {
    vec![AliasRule::new("[phoneNumber]", "[phone]")]
}

fn default_prefer_unindexed() -> Vec<String> {
    vec!["[name]".to_string()]
}

impl Default for PathRules {
    fn default() -> Self {
        Self {
            aliases: default_aliases(),
            prefer_unindexed: default_prefer_unindexed(),
        }
    }
}

impl PathRules {
    /// Rules with no exceptions at all
    pub fn none() -> Self {
        Self {
            aliases: Vec::new(),
            prefer_unindexed: Vec::new(),
        }
    }

    pub fn alias_for(&self, path: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|rule| rule.path == path)
            .map(|rule| rule.suffix.as_str())
    }

    pub fn prefers_unindexed(&self, name: &str) -> bool {
        self.prefer_unindexed.iter().any(|s| s == name)
    }
}

/// The field-name path accumulated while walking an error tree,
/// e.g. `[address][street]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lookup path for the entry `key` below this one
    ///
    /// - an index whose value is a nested map is a collection element: a
    ///   trailing `[n]` is replaced by `[key]`, otherwise `[key]` is appended
    /// - an index whose value is a message is one instance of a repeated
    ///   field: `[]` is appended, unless an alias rule names another suffix
    /// - any other key appends `[key]`
    pub fn child(&self, key: &str, nested: bool, rules: &PathRules) -> FieldPath {
        let path = if is_index(key) && nested {
            if TRAILING_INDEX.is_match(&self.0) {
                TRAILING_INDEX
                    .replace(&self.0, format!("[{}]", key).as_str())
                    .into_owned()
            } else {
                format!("{}[{}]", self.0, key)
            }
        } else if is_index(key) {
            match rules.alias_for(&self.0) {
                Some(suffix) => format!("{}{}", self.0, suffix),
                None => format!("{}[]", self.0),
            }
        } else {
            format!("{}[{}]", self.0, key)
        };

        FieldPath(path)
    }

    /// The same path as an unqualified input name: `[address][street]`
    /// becomes `address[street]`
    pub fn unqualified(&self) -> Option<String> {
        let rest = self.0.strip_prefix('[')?;
        let end = rest.find(']')?;
        let (head, tail) = rest.split_at(end);
        if head.is_empty() {
            return None;
        }
        Some(format!("{}{}", head, &tail[1..]))
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        FieldPath(s.to_string())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
