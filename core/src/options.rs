//! Options for a single schema application.

use serde::{Deserialize, Serialize};

/// Options threaded through every validator installed by one check.
///
/// Missing keys take their defaults and unrecognized keys are ignored when
/// deserializing.
///
/// # Examples
///
/// ```
/// use schema_check_core::CheckOptions;
///
/// let options: CheckOptions =
///     serde_json::from_str(r#"{"throw_error": false, "colour": "blue"}"#).unwrap();
/// assert!(!options.throw_error);
/// assert!(!options.is_strict);
/// assert!(CheckOptions::default().throw_error);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckOptions {
    /// Reject fields the schema does not declare. Reserved: accepted but not
    /// enforced yet.
    pub is_strict: bool,
    /// Return an error for rejected writes instead of dropping them.
    pub throw_error: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            is_strict: false,
            throw_error: true,
        }
    }
}

impl CheckOptions {
    /// Options for silent mode: rejected writes are dropped.
    pub fn silent() -> Self {
        Self {
            throw_error: false,
            ..Self::default()
        }
    }

    pub fn with_throw_error(mut self, throw_error: bool) -> Self {
        self.throw_error = throw_error;
        self
    }

    pub fn with_strict(mut self, is_strict: bool) -> Self {
        self.is_strict = is_strict;
        self
    }
}
