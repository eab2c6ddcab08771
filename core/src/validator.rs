//! Per-type write validators.
//!
//! [`Validator::build`] turns a field's [`Settings`] into the setter installed
//! on the governed field. Every write runs the same sequence: accept an
//! explicit null when nulls are allowed, check the value's kind against the
//! declared type, then check the type's own constraints (pattern for strings,
//! bounds for numbers). A violation is handed to the write policy, which either
//! returns it or drops the write and reports it on the error channel.

use std::sync::Arc;

use regex::Regex;

use crate::diagnostics::Diagnostics;
use crate::error::WriteError;
use crate::options::CheckOptions;
use crate::settings::{FieldType, Settings};
use crate::value::Value;

/// Result of a write that did not return an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The value was stored.
    Committed,
    /// The value violated the schema and was dropped (silent mode).
    Rejected,
    /// The field has no setter; the write was dropped.
    Ignored,
}

impl WriteOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, WriteOutcome::Committed)
    }
}

/// How write-time violations are handled for one schema application.
#[derive(Debug, Clone)]
pub(crate) struct Policy {
    options: CheckOptions,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Policy {
    pub(crate) fn new(options: CheckOptions, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            options,
            diagnostics,
        }
    }

    pub(crate) fn diagnostics(&self) -> &dyn Diagnostics {
        self.diagnostics.as_ref()
    }

    /// Returns the violation in throwing mode, otherwise reports it and turns
    /// the write into a no-op.
    pub(crate) fn reject(
        &self,
        field: &str,
        error: WriteError,
    ) -> Result<WriteOutcome, WriteError> {
        if self.options.throw_error {
            return Err(error);
        }
        self.diagnostics.error(field, &error.to_string());
        Ok(WriteOutcome::Rejected)
    }
}

#[derive(Debug, Clone)]
enum Rule {
    String { pattern: Option<Regex> },
    Number { min: Option<f64>, max: Option<f64> },
    Boolean,
    Array,
    Object,
}

impl Rule {
    fn field_type(&self) -> FieldType {
        match self {
            Rule::String { .. } => FieldType::String,
            Rule::Number { .. } => FieldType::Number,
            Rule::Boolean => FieldType::Boolean,
            Rule::Array => FieldType::Array,
            Rule::Object => FieldType::Object,
        }
    }
}

/// Setter installed on an editable governed field.
#[derive(Debug, Clone)]
pub struct Validator {
    field: String,
    allow_nulls: bool,
    rule: Rule,
    policy: Policy,
}

impl Validator {
    /// Builds the setter for `field`. Unrecognized types get no setter.
    pub(crate) fn build(settings: &Settings, field: &str, policy: Policy) -> Option<Self> {
        let rule = match &settings.field_type {
            FieldType::String => Rule::String {
                pattern: settings.regex.clone(),
            },
            FieldType::Number => Rule::Number {
                min: settings.min,
                max: settings.max,
            },
            FieldType::Boolean => Rule::Boolean,
            FieldType::Array => Rule::Array,
            FieldType::Object => Rule::Object,
            FieldType::Other(_) => return None,
        };
        Some(Self {
            field: field.to_string(),
            allow_nulls: settings.allow_nulls,
            rule,
            policy,
        })
    }

    /// Dotted path of the field this validator guards.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The type this validator enforces.
    pub fn expected(&self) -> FieldType {
        self.rule.field_type()
    }

    /// Checks `value` without storing it or applying the policy.
    ///
    /// # Errors
    ///
    /// Returns the first violation found: type first, then the type's own
    /// constraint.
    pub fn validate(&self, value: &Value) -> Result<(), WriteError> {
        if self.allow_nulls && value.is_null() {
            return Ok(());
        }
        match &self.rule {
            Rule::String { pattern } => validate_string(&self.field, value, pattern.as_ref()),
            Rule::Number { min, max } => validate_number(&self.field, value, *min, *max),
            Rule::Boolean => validate_kind(&self.field, value, FieldType::Boolean),
            Rule::Array => validate_kind(&self.field, value, FieldType::Array),
            Rule::Object => validate_kind(&self.field, value, FieldType::Object),
        }
    }

    /// Validates `value` and stores it in `shadow`. A rejected value leaves
    /// `shadow` untouched.
    pub(crate) fn assign(
        &self,
        shadow: &mut Option<Value>,
        value: Value,
    ) -> Result<WriteOutcome, WriteError> {
        match self.validate(&value) {
            Ok(()) => {
                *shadow = Some(value);
                Ok(WriteOutcome::Committed)
            }
            Err(error) => self.policy.reject(&self.field, error),
        }
    }
}

fn validate_kind(field: &str, value: &Value, expected: FieldType) -> Result<(), WriteError> {
    let actual = value.kind();
    if expected.kind() == Some(actual) {
        return Ok(());
    }
    Err(WriteError::TypeMismatch {
        field: field.to_string(),
        expected,
        actual,
    })
}

fn validate_string(field: &str, value: &Value, pattern: Option<&Regex>) -> Result<(), WriteError> {
    validate_kind(field, value, FieldType::String)?;
    if let (Some(pattern), Some(text)) = (pattern, value.as_str()) {
        if !pattern.is_match(text) {
            return Err(WriteError::PatternMismatch {
                field: field.to_string(),
                pattern: pattern.as_str().to_string(),
            });
        }
    }
    Ok(())
}

fn validate_number(
    field: &str,
    value: &Value,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(), WriteError> {
    validate_kind(field, value, FieldType::Number)?;
    let Some(n) = value.as_f64() else {
        return Ok(());
    };
    if let Some(min) = min {
        if n < min {
            return Err(WriteError::BelowMinimum {
                field: field.to_string(),
                value: n,
                min,
            });
        }
    }
    if let Some(max) = max {
        if n > max {
            return Err(WriteError::AboveMaximum {
                field: field.to_string(),
                value: n,
                max,
            });
        }
    }
    Ok(())
}
