//! Schema application.
//!
//! [`SchemaChecker::check`] validates its inputs, then applies every declared
//! top-level field to the target object. Applying a field installs a guard on
//! it (see [`Object`]) and recurses into the field's own value for nested
//! declarations. After the check returns, enforcement happens on every
//! [`Object::set`] and [`Object::remove`] of a governed field.

use std::sync::Arc;

use crate::diagnostics::{Diagnostics, NoopDiagnostics};
use crate::error::SchemaError;
use crate::options::CheckOptions;
use crate::schema::{Schema, SchemaNode, join_path};
use crate::validator::{Policy, Validator};
use crate::value::{Guard, Kind, Object, Value};

/// Applies schemas to objects with a fixed set of options and a diagnostics
/// observer.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use schema_check_core::{CheckOptions, SchemaChecker, TracingDiagnostics, Value, WriteOutcome};
///
/// let checker = SchemaChecker::new()
///     .with_options(CheckOptions::silent())
///     .with_diagnostics(Arc::new(TracingDiagnostics));
///
/// let mut object = Value::from(serde_json::json!({"life": 5}));
/// let schema = Value::from(serde_json::json!({"life": {"type": "number", "max": 10}}));
/// let object = checker.check(&mut object, &schema).unwrap().as_object_mut().unwrap();
///
/// assert_eq!(object.set("life", 11).unwrap(), WriteOutcome::Rejected);
/// assert_eq!(object.get("life"), Some(&Value::from(5)));
/// ```
#[derive(Debug, Clone)]
pub struct SchemaChecker {
    options: CheckOptions,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Default for SchemaChecker {
    fn default() -> Self {
        Self {
            options: CheckOptions::default(),
            diagnostics: Arc::new(NoopDiagnostics),
        }
    }
}

impl SchemaChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn options(&self) -> CheckOptions {
        self.options
    }

    /// Applies a raw schema to `target` in place and hands the same reference
    /// back.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::TargetNotObject`] / [`SchemaError::SchemaNotObject`]
    ///   if either input is not a composite record.
    /// - [`SchemaError::InitialTypeMismatch`] if a leaf field's current value
    ///   does not match its declared type.
    /// - [`SchemaError::MissingField`] if a nested declaration names a field
    ///   the object does not have.
    ///
    /// Fields applied before the error stay governed.
    pub fn check<'a>(
        &self,
        target: &'a mut Value,
        schema: &Value,
    ) -> Result<&'a mut Value, SchemaError> {
        if !matches!(target, Value::Object(_)) {
            self.diagnostics
                .error("", "object to check must be of type 'object'");
            return Err(SchemaError::TargetNotObject(target.kind()));
        }
        let schema = Schema::parse(schema, self.diagnostics.as_ref()).inspect_err(|_| {
            self.diagnostics.error("", "schema must be of type 'object'");
        })?;
        if let Value::Object(object) = &mut *target {
            self.apply(object, &schema)?;
        }
        Ok(target)
    }

    /// Applies a parsed schema to `target`, field by field in schema order.
    ///
    /// # Errors
    ///
    /// Same as [`check`](Self::check), minus the input-shape checks.
    pub fn apply(&self, target: &mut Object, schema: &Schema) -> Result<(), SchemaError> {
        if self.options.is_strict {
            self.diagnostics
                .info("", "strict mode requested; undeclared fields are not rejected yet");
        }
        for (field, node) in schema.fields() {
            self.apply_field(target, field, field, node)?;
        }
        Ok(())
    }

    fn apply_field(
        &self,
        target: &mut Object,
        field: &str,
        path: &str,
        node: &SchemaNode,
    ) -> Result<(), SchemaError> {
        let settings = &node.settings;

        if settings.field_type.is_leaf() {
            let current = target.get(field);
            let actual = current.map_or(Kind::Unknown, Value::kind);
            let null_allowed = settings.allow_nulls && current.is_some_and(Value::is_null);
            if settings.field_type.kind() != Some(actual) && !null_allowed {
                self.diagnostics.error(
                    path,
                    &format!(
                        "declared type '{}' does not match current value of type '{actual}'",
                        settings.field_type
                    ),
                );
                return Err(SchemaError::InitialTypeMismatch {
                    field: path.to_string(),
                    expected: settings.field_type.clone(),
                    actual,
                });
            }
        }

        let policy = Policy::new(self.options, self.diagnostics.clone());
        let setter = if settings.editable {
            Validator::build(settings, path, policy.clone())
        } else {
            None
        };
        target.install(
            field,
            Guard {
                path: path.to_string(),
                settings: settings.clone(),
                setter,
                policy,
            },
        );
        self.diagnostics.info(
            path,
            &format!("governed as '{}'", settings.field_type),
        );

        let Some((first_child, _)) = node.children.first() else {
            return Ok(());
        };
        let Some(nested) = target.nested_mut(field) else {
            let child_path = join_path(path, first_child);
            self.diagnostics
                .error(&child_path, "nested fields declared on a value that is not an object");
            return Err(SchemaError::MissingField(child_path));
        };
        for (child, child_node) in &node.children {
            let child_path = join_path(path, child);
            if !nested.contains_key(child) {
                self.diagnostics
                    .error(&child_path, "schema references a field the object does not have");
                return Err(SchemaError::MissingField(child_path));
            }
            self.apply_field(nested, child, &child_path, child_node)?;
        }
        Ok(())
    }
}

/// Applies `schema` to `target` in place and returns the same reference.
///
/// Uses [`CheckOptions::default`] when `options` is `None` and discards
/// diagnostics; build a [`SchemaChecker`] to observe them.
///
/// # Errors
///
/// See [`SchemaChecker::check`].
///
/// # Examples
///
/// ```
/// use schema_check_core::{Value, WriteError, check};
///
/// let mut hero = Value::from(serde_json::json!({
///     "name": "test",
///     "skills": {"sword": 5, "specialization": "magic"}
/// }));
/// let schema = Value::from(serde_json::json!({
///     "name": {"type": "string"},
///     "skills": {
///         "sword": {"type": "number"},
///         "specialization": {"type": "string"}
///     }
/// }));
///
/// let hero = check(&mut hero, &schema, None).unwrap().as_object_mut().unwrap();
/// hero.set("name", "john").unwrap();
///
/// let mut skills = hero.object_mut("skills").unwrap();
/// skills.set("sword", 10).unwrap();
/// assert!(matches!(skills.set("sword", "10"), Err(WriteError::TypeMismatch { .. })));
/// assert_eq!(skills.get("sword"), Some(&Value::from(10)));
/// ```
pub fn check<'a>(
    target: &'a mut Value,
    schema: &Value,
    options: Option<CheckOptions>,
) -> Result<&'a mut Value, SchemaError> {
    SchemaChecker::new()
        .with_options(options.unwrap_or_default())
        .check(target, schema)
}
