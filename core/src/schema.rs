//! Parsed schema trees.
//!
//! A raw schema node plays two roles at once: its setting keys describe the
//! field itself, and any key holding a composite record declares a child
//! field of the field's own value. [`SchemaNode`] separates the two once, at
//! parse time, so the engine never re-scans ambiguous keys.

use crate::diagnostics::Diagnostics;
use crate::error::SchemaError;
use crate::settings::{SETTING_NAMES, Settings, extract_settings};
use crate::value::{Object, Value, compile_patterns};

/// Settings for one field plus the declarations of its nested fields.
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    pub settings: Settings,
    /// Child declarations in schema order. They apply to the field's value.
    pub children: Vec<(String, SchemaNode)>,
}

impl SchemaNode {
    /// Parses a raw node for the field at `path`.
    ///
    /// A node that is not a composite record is treated as a node with
    /// default settings and no children.
    pub fn parse(raw: &Value, path: &str, diagnostics: &dyn Diagnostics) -> Self {
        let Value::Object(raw) = raw else {
            diagnostics.warn(
                path,
                &format!(
                    "schema node must be an object, got '{}'; using defaults",
                    raw.kind()
                ),
            );
            return Self::default();
        };
        Self::parse_object(raw, path, diagnostics)
    }

    fn parse_object(raw: &Object, path: &str, diagnostics: &dyn Diagnostics) -> Self {
        let settings = extract_settings(raw, path, diagnostics);
        let children = raw
            .iter()
            .filter_map(|(name, value)| match value {
                Value::Object(child) => {
                    let child_path = join_path(path, name);
                    let node = Self::parse_object(child, &child_path, diagnostics);
                    Some((name.to_string(), node))
                }
                _ => {
                    if !SETTING_NAMES.contains(&name) {
                        diagnostics.warn(
                            path,
                            &format!("unknown setting '{name}' ignored"),
                        );
                    }
                    None
                }
            })
            .collect();
        Self { settings, children }
    }

    /// Looks up a child declaration by name.
    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        self.children
            .iter()
            .find(|(child, _)| child == name)
            .map(|(_, node)| node)
    }
}

/// A parsed top-level schema: one node per declared field, in schema order.
///
/// # Examples
///
/// ```
/// use schema_check_core::{FieldType, NoopDiagnostics, Schema};
///
/// let schema = Schema::from_json(
///     serde_json::json!({
///         "name": {"type": "string", "regex": {"$regex": "^(jim|jan)$"}},
///         "skills": {"sword": {"type": "number"}}
///     }),
///     &NoopDiagnostics,
/// )
/// .unwrap();
///
/// let name = schema.field("name").unwrap();
/// assert!(name.settings.regex.is_some());
/// let skills = schema.field("skills").unwrap();
/// assert_eq!(skills.settings.field_type, FieldType::Object);
/// assert_eq!(skills.child("sword").unwrap().settings.field_type, FieldType::Number);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, SchemaNode)>,
}

impl Schema {
    /// Parses a raw schema value.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::SchemaNotObject`] if `raw` is not a composite
    /// record.
    pub fn parse(raw: &Value, diagnostics: &dyn Diagnostics) -> Result<Self, SchemaError> {
        let Value::Object(raw) = raw else {
            return Err(SchemaError::SchemaNotObject(raw.kind()));
        };
        let fields = raw
            .iter()
            .map(|(name, node)| (name.to_string(), SchemaNode::parse(node, name, diagnostics)))
            .collect();
        Ok(Self { fields })
    }

    /// Parses a JSON schema, compiling `{"$regex": "<source>"}` literals into
    /// patterns.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidPattern`] if a pattern literal does not
    /// compile, or [`SchemaError::SchemaNotObject`] if the JSON is not an
    /// object.
    pub fn from_json(
        json: serde_json::Value,
        diagnostics: &dyn Diagnostics,
    ) -> Result<Self, SchemaError> {
        let raw = compile_patterns(json, "", "").map_err(|failure| {
            diagnostics.error(&failure.path, "pattern literal does not compile");
            SchemaError::InvalidPattern {
                field: failure.path,
                message: failure.source.to_string(),
            }
        })?;
        Self::parse(&raw, diagnostics)
    }

    /// Iterates over the declared top-level fields in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.fields.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn field(&self, name: &str) -> Option<&SchemaNode> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, node)| node)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub(crate) fn join_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{parent}.{field}")
    }
}
