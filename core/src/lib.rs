//! Declarative schema enforcement for mutable data objects.
//!
//! A schema is applied once to an object; from then on every write to a
//! governed field is checked against the field's declared type and
//! constraints:
//!
//! - [`check`] / [`SchemaChecker`]: apply a schema to an [`Object`] in place.
//! - [`Object::set`] / [`Object::remove`]: writes that governed fields
//!   validate, returning a [`WriteOutcome`] or a [`WriteError`].
//! - [`Schema`] / [`SchemaNode`]: the parsed schema tree, with
//!   [`Settings`] normalized by [`extract_settings`].
//! - [`Diagnostics`]: observer for rejected writes, ignored settings and
//!   tracing detail.
//!
//! Violations fall in two groups. Problems found while applying a schema
//! ([`SchemaError`]) are always returned. Rejected writes ([`WriteError`])
//! are returned in throwing mode (the default) and dropped in silent mode
//! ([`CheckOptions::throw_error`] set to `false`).
//!
//! # Example
//!
//! ```
//! use schema_check_core::*;
//!
//! let mut hero = Value::from(serde_json::json!({"name": "jim", "life": 5}));
//! let schema = Schema::from_json(
//!     serde_json::json!({
//!         "name": {"type": "string", "regex": {"$regex": "^(jim|jan)$"}},
//!         "life": {"type": "number", "min": 0, "max": 10, "editable": true}
//!     }),
//!     &NoopDiagnostics,
//! )
//! .unwrap();
//!
//! let hero = hero.as_object_mut().unwrap();
//! SchemaChecker::new().apply(hero, &schema).unwrap();
//!
//! assert!(hero.set("name", "jan").unwrap().is_committed());
//! assert!(hero.set("name", "joe").is_err());
//! assert!(hero.set("life", 11).is_err());
//! assert_eq!(hero.get("name"), Some(&Value::from("jan")));
//! ```
//!
//! Element-wise validation of array and object fields is not performed:
//! composite fields only check the kind of the value written to them.

mod diagnostics;
mod engine;
mod error;
mod options;
mod schema;
mod settings;
mod validator;
mod value;

pub use diagnostics::{
    Diagnostic, Diagnostics, Level, NoopDiagnostics, RecordingDiagnostics, TracingDiagnostics,
};
pub use engine::{SchemaChecker, check};
pub use error::{SchemaError, WriteError};
pub use options::CheckOptions;
pub use schema::{Schema, SchemaNode};
pub use settings::{FieldType, SETTING_NAMES, Settings, extract_settings};
pub use validator::{Validator, WriteOutcome};
pub use value::{
    Kind, Object, ObjectMut, PATTERN_KEY, Value, classify, from_json_with_patterns,
};
