//! Normalized per-field settings and the settings extractor.
//!
//! A raw schema node mixes setting keys (`type`, `editable`, ...) with child
//! field declarations. [`extract_settings`] reads only the setting keys and
//! fills in defaults; anything malformed is dropped with a warning.

use std::fmt;

use regex::Regex;

use crate::diagnostics::Diagnostics;
use crate::value::{Kind, Object, Value};

/// Keys recognized as settings in a schema node.
pub const SETTING_NAMES: [&str; 7] = [
    "type",
    "editable",
    "allow_nulls",
    "allow_delete",
    "min",
    "max",
    "regex",
];

/// Declared type of a governed field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    #[default]
    Object,
    /// A type name the engine does not enforce. Fields declared with it
    /// become read-only.
    Other(String),
}

impl FieldType {
    /// Parses a schema `type` setting.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_check_core::FieldType;
    ///
    /// assert_eq!(FieldType::from_name("number"), FieldType::Number);
    /// assert_eq!(FieldType::from_name("date"), FieldType::Other("date".into()));
    /// ```
    pub fn from_name(name: &str) -> Self {
        match name {
            "string" => FieldType::String,
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            "array" => FieldType::Array,
            "object" => FieldType::Object,
            other => FieldType::Other(other.to_string()),
        }
    }

    /// The value kind this type accepts, if it is enforced.
    pub fn kind(&self) -> Option<Kind> {
        match self {
            FieldType::String => Some(Kind::String),
            FieldType::Number => Some(Kind::Number),
            FieldType::Boolean => Some(Kind::Boolean),
            FieldType::Array => Some(Kind::Array),
            FieldType::Object => Some(Kind::Object),
            FieldType::Other(_) => None,
        }
    }

    /// Leaf types get a getter and an initial-value check; composite types
    /// only get a shallow setter.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            FieldType::String | FieldType::Number | FieldType::Boolean
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Other(name) => name,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully-defaulted settings for one field.
#[derive(Debug, Clone)]
pub struct Settings {
    pub field_type: FieldType,
    pub editable: bool,
    pub allow_nulls: bool,
    pub allow_delete: bool,
    /// Only set for number fields.
    pub min: Option<f64>,
    /// Only set for number fields.
    pub max: Option<f64>,
    /// Only set for string fields.
    pub regex: Option<Regex>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            field_type: FieldType::Object,
            editable: true,
            allow_nulls: false,
            allow_delete: false,
            min: None,
            max: None,
            regex: None,
        }
    }
}

/// Reads the setting keys of a raw schema node.
///
/// Never fails: values of the wrong shape fall back to defaults and are
/// reported on the warning channel. Object values are skipped silently since
/// they declare child fields.
///
/// # Examples
///
/// ```
/// use schema_check_core::{FieldType, NoopDiagnostics, Value, extract_settings};
///
/// let node = Value::from(serde_json::json!({"type": "number", "min": 5, "editable": false}));
/// let settings = extract_settings(node.as_object().unwrap(), "life", &NoopDiagnostics);
///
/// assert_eq!(settings.field_type, FieldType::Number);
/// assert_eq!(settings.min, Some(5.0));
/// assert!(!settings.editable);
/// assert!(!settings.allow_nulls);
/// ```
pub fn extract_settings(node: &Object, field: &str, diagnostics: &dyn Diagnostics) -> Settings {
    let field_type = match setting(node, "type") {
        None => FieldType::Object,
        Some(Value::String(name)) => {
            let field_type = FieldType::from_name(name);
            if let FieldType::Other(name) = &field_type {
                diagnostics.warn(
                    field,
                    &format!("unrecognized type '{name}'; field will be read-only"),
                );
            }
            field_type
        }
        Some(other) => {
            diagnostics.warn(
                field,
                &format!("'type' must be a string, got '{}'; using 'object'", other.kind()),
            );
            FieldType::Object
        }
    };

    let mut settings = Settings {
        editable: flag(node, "editable", true, field, diagnostics),
        allow_nulls: flag(node, "allow_nulls", false, field, diagnostics),
        allow_delete: flag(node, "allow_delete", false, field, diagnostics),
        ..Settings::default()
    };

    if field_type == FieldType::Number {
        settings.min = bound(node, "min", field, diagnostics);
        settings.max = bound(node, "max", field, diagnostics);
    } else {
        for name in ["min", "max"] {
            if setting(node, name).is_some() {
                diagnostics.warn(
                    field,
                    &format!("'{name}' only applies to number fields; ignored"),
                );
            }
        }
    }

    match setting(node, "regex") {
        Some(Value::Pattern(regex)) if field_type == FieldType::String => {
            settings.regex = Some(regex.clone());
        }
        Some(Value::Pattern(_)) => {
            diagnostics.warn(field, "'regex' only applies to string fields; ignored");
        }
        Some(other) => {
            diagnostics.warn(
                field,
                &format!("'regex' must be a pattern, got '{}'; ignored", other.kind()),
            );
        }
        None => {}
    }

    settings.field_type = field_type;
    settings
}

/// A setting value, skipping nulls and child declarations.
fn setting<'a>(node: &'a Object, name: &str) -> Option<&'a Value> {
    match node.get(name)? {
        Value::Null | Value::Object(_) => None,
        value => Some(value),
    }
}

fn flag(
    node: &Object,
    name: &str,
    default: bool,
    field: &str,
    diagnostics: &dyn Diagnostics,
) -> bool {
    match setting(node, name) {
        Some(Value::Bool(value)) => *value,
        Some(other) => {
            diagnostics.warn(
                field,
                &format!("'{name}' must be a boolean, got '{}'; ignored", other.kind()),
            );
            default
        }
        None => default,
    }
}

fn bound(node: &Object, name: &str, field: &str, diagnostics: &dyn Diagnostics) -> Option<f64> {
    match setting(node, name)? {
        Value::Number(n) => Some(*n),
        other => {
            diagnostics.warn(
                field,
                &format!("'{name}' must be a number, got '{}'; ignored", other.kind()),
            );
            None
        }
    }
}
