//! Error types for schema application and governed writes.
//!
//! [`SchemaError`] covers problems found while applying a schema and is
//! always returned. [`WriteError`] covers rejected writes to governed fields
//! and is only returned in throwing mode; in silent mode the write is dropped
//! instead.

use thiserror::Error;

use crate::settings::FieldType;
use crate::value::Kind;

/// Errors raised while applying a schema. Never suppressible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The object handed to the checker is not a composite record.
    #[error("object to check must be of type 'object', got '{0}'")]
    TargetNotObject(Kind),

    /// The schema handed to the checker is not a composite record.
    #[error("schema must be of type 'object', got '{0}'")]
    SchemaNotObject(Kind),

    /// A field's value at apply time does not match its declared type.
    #[error("field '{field}' is declared as '{expected}' but its current value is '{actual}'")]
    InitialTypeMismatch {
        field: String,
        expected: FieldType,
        actual: Kind,
    },

    /// A nested schema declares a field the object does not have.
    #[error("schema references field '{0}' which the object does not have")]
    MissingField(String),

    /// A `{"$regex": ...}` literal failed to compile. `field` is the path of
    /// the schema node holding it.
    #[error("invalid pattern for field '{field}': {message}")]
    InvalidPattern { field: String, message: String },
}

/// A write rejected by a governed field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WriteError {
    #[error("property {field} must be type '{expected}', tried to set value of type '{actual}'")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        actual: Kind,
    },

    #[error("property {field} must match pattern '{pattern}'")]
    PatternMismatch { field: String, pattern: String },

    #[error("property {field} must be at least {min}, tried to set {value}")]
    BelowMinimum { field: String, value: f64, min: f64 },

    #[error("property {field} must be at most {max}, tried to set {value}")]
    AboveMaximum { field: String, value: f64, max: f64 },

    #[error("property {field} cannot be deleted")]
    NotDeletable { field: String },
}

impl WriteError {
    /// Path of the field that rejected the write.
    pub fn field(&self) -> &str {
        match self {
            WriteError::TypeMismatch { field, .. }
            | WriteError::PatternMismatch { field, .. }
            | WriteError::BelowMinimum { field, .. }
            | WriteError::AboveMaximum { field, .. }
            | WriteError::NotDeletable { field } => field,
        }
    }
}
