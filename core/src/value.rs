//! Dynamic value model for governed objects.
//!
//! [`Value`] is the heterogeneous value stored in an [`Object`] field, and
//! [`Object`] is the record the schema engine governs: an insertion-ordered
//! set of fields where each field is either a plain value or a governed slot
//! holding a shadow value behind a validator.
//!
//! Values convert from [`serde_json::Value`] and back with [`Value::to_json`].
//! JSON has no pattern type, so [`from_json_with_patterns`] recognizes the
//! `{"$regex": "<source>"}` form and compiles it into [`Value::Pattern`].

use std::fmt;
use std::ops::Deref;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::WriteError;
use crate::schema::join_path;
use crate::settings::Settings;
use crate::validator::{Policy, Validator, WriteOutcome};

/// Object key marking a pattern literal in JSON input.
pub const PATTERN_KEY: &str = "$regex";

/// Semantic kind of a value, as seen by the type classifier.
///
/// # Examples
///
/// ```
/// use schema_check_core::{Kind, Value, classify};
///
/// assert_eq!(classify(&Value::from("jim")), Kind::String);
/// assert_eq!(classify(&Value::from(5)), Kind::Number);
/// assert_eq!(classify(&Value::Null), Kind::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    /// Null, patterns and anything else without a schema type.
    Unknown,
}

impl Kind {
    /// Lowercase name used in error messages and schema `type` settings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dynamically typed value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Object),
    /// A compiled pattern. Never mistaken for a composite record.
    Pattern(Regex),
}

/// Returns the semantic kind of `value`.
///
/// `Object` is reserved for genuine composite records: arrays, null and
/// patterns are never classified as objects. Total over all inputs.
pub fn classify(value: &Value) -> Kind {
    match value {
        Value::Object(_) => Kind::Object,
        Value::String(_) => Kind::String,
        Value::Number(_) => Kind::Number,
        Value::Bool(_) => Kind::Boolean,
        Value::Array(_) => Kind::Array,
        Value::Null | Value::Pattern(_) => Kind::Unknown,
    }
}

impl Value {
    /// Shorthand for [`classify`].
    pub fn kind(&self) -> Kind {
        classify(self)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_pattern(&self) -> Option<&Regex> {
        match self {
            Value::Pattern(regex) => Some(regex),
            _ => None,
        }
    }

    /// Converts into JSON. Patterns become their source string and
    /// non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(object) => object.to_json(),
            Value::Pattern(regex) => serde_json::Value::String(regex.as_str().to_string()),
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Pattern(a), Value::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<Regex> for Value {
    fn from(regex: Regex) -> Self {
        Value::Pattern(regex)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(map.into_iter().collect()),
        }
    }
}

/// Converts JSON into a [`Value`], compiling `{"$regex": "<source>"}` objects
/// into [`Value::Pattern`].
///
/// # Errors
///
/// Returns the [`regex::Error`] of the first pattern source that fails to
/// compile.
///
/// # Examples
///
/// ```
/// use schema_check_core::{Kind, from_json_with_patterns};
///
/// let value = from_json_with_patterns(serde_json::json!({"$regex": "^(jim|jan)$"})).unwrap();
/// assert!(value.as_pattern().unwrap().is_match("jan"));
/// assert_eq!(value.kind(), Kind::Unknown);
/// ```
pub fn from_json_with_patterns(json: serde_json::Value) -> Result<Value, regex::Error> {
    compile_patterns(json, "", "").map_err(|failure| failure.source)
}

/// A pattern literal that failed to compile, with the dotted path of the
/// object holding it.
#[derive(Debug)]
pub(crate) struct PatternFailure {
    pub(crate) path: String,
    pub(crate) source: regex::Error,
}

/// Converts `json` found at `path` inside an object at `parent`.
pub(crate) fn compile_patterns(
    json: serde_json::Value,
    parent: &str,
    path: &str,
) -> Result<Value, PatternFailure> {
    match json {
        serde_json::Value::Object(map) => {
            if map.len() == 1 {
                if let Some(serde_json::Value::String(source)) = map.get(PATTERN_KEY) {
                    return Regex::new(source).map(Value::Pattern).map_err(|source| {
                        PatternFailure {
                            path: parent.to_string(),
                            source,
                        }
                    });
                }
            }
            map.into_iter()
                .map(|(key, value)| {
                    let child = join_path(path, &key);
                    Ok((key, compile_patterns(value, path, &child)?))
                })
                .collect::<Result<Object, PatternFailure>>()
                .map(Value::Object)
        }
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| compile_patterns(item, parent, path))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(Value::from(other)),
    }
}

/// A governed field: the shadow value plus the guard installed by the engine.
#[derive(Debug, Clone)]
pub(crate) struct Governed {
    pub(crate) shadow: Option<Value>,
    pub(crate) guard: Guard,
}

/// Everything the engine installs on a field besides its value.
#[derive(Debug, Clone)]
pub(crate) struct Guard {
    pub(crate) path: String,
    pub(crate) settings: Settings,
    pub(crate) setter: Option<Validator>,
    pub(crate) policy: Policy,
}

impl Governed {
    fn write(&mut self, value: Value) -> Result<WriteOutcome, WriteError> {
        match &self.guard.setter {
            Some(setter) => setter.assign(&mut self.shadow, value),
            None => {
                self.guard
                    .policy
                    .diagnostics()
                    .info(&self.guard.path, "write ignored: field has no setter");
                Ok(WriteOutcome::Ignored)
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Plain(Value),
    Governed(Governed),
}

impl Slot {
    fn value(&self) -> Option<&Value> {
        match self {
            Slot::Plain(value) => Some(value),
            Slot::Governed(governed) => governed.shadow.as_ref(),
        }
    }

    fn value_mut(&mut self) -> Option<&mut Value> {
        match self {
            Slot::Plain(value) => Some(value),
            Slot::Governed(governed) => governed.shadow.as_mut(),
        }
    }

    fn into_value(self) -> Option<Value> {
        match self {
            Slot::Plain(value) => Some(value),
            Slot::Governed(governed) => governed.shadow,
        }
    }
}

/// An insertion-ordered record of named fields.
///
/// Fields start out plain: reads return the stored value and writes replace
/// it. Once a schema is applied, governed fields read their shadow value and
/// route every write through the installed validator.
///
/// # Examples
///
/// ```
/// use schema_check_core::{Object, Value, WriteOutcome};
///
/// let mut object: Object = [("name", Value::from("test"))].into_iter().collect();
/// assert_eq!(object.set("life", 5).unwrap(), WriteOutcome::Committed);
/// assert_eq!(object.get("life"), Some(&Value::from(5)));
/// assert_eq!(object.keys().collect::<Vec<_>>(), vec!["name", "life"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Object {
    fields: Vec<(String, Slot)>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|(name, _)| name == field)
    }

    fn slot(&self, field: &str) -> Option<&Slot> {
        self.position(field).map(|i| &self.fields[i].1)
    }

    /// Reads a field. Governed fields return their shadow value; a governed
    /// field that never held a value reads as `None`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.slot(field).and_then(Slot::value)
    }

    /// Write handle to a nested object, so that its own governed fields can
    /// be written. The nested object's fields enforce their own schema and
    /// the handle never hands out the nested object itself.
    pub fn object_mut(&mut self, field: &str) -> Option<ObjectMut<'_>> {
        self.nested_mut(field).map(ObjectMut::from)
    }

    /// Raw mutable access to a nested object, for the engine only.
    pub(crate) fn nested_mut(&mut self, field: &str) -> Option<&mut Object> {
        self.value_mut(field).and_then(Value::as_object_mut)
    }

    /// Raw mutable access bypassing the field's own setter.
    pub(crate) fn value_mut(&mut self, field: &str) -> Option<&mut Value> {
        let index = self.position(field)?;
        self.fields[index].1.value_mut()
    }

    /// Writes a field.
    ///
    /// Plain and unknown fields accept any value. Governed fields validate the
    /// value first; see [`WriteOutcome`] for the non-error results.
    ///
    /// # Errors
    ///
    /// Returns a [`WriteError`] when a governed field rejects the value and
    /// the schema was applied in throwing mode. The shadow value is left
    /// untouched.
    pub fn set(
        &mut self,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<WriteOutcome, WriteError> {
        let value = value.into();
        match self.position(field) {
            Some(index) => match &mut self.fields[index].1 {
                Slot::Governed(governed) => governed.write(value),
                Slot::Plain(current) => {
                    *current = value;
                    Ok(WriteOutcome::Committed)
                }
            },
            None => {
                self.fields.push((field.to_string(), Slot::Plain(value)));
                Ok(WriteOutcome::Committed)
            }
        }
    }

    /// Removes a field and returns its value.
    ///
    /// Governed fields are removable only when declared with
    /// `allow_delete: true`. Otherwise the removal is a write-time violation:
    /// an error in throwing mode, a no-op returning `Ok(None)` in silent mode.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::NotDeletable`] for a protected governed field in
    /// throwing mode.
    pub fn remove(&mut self, field: &str) -> Result<Option<Value>, WriteError> {
        let Some(index) = self.position(field) else {
            return Ok(None);
        };
        if let Slot::Governed(governed) = &self.fields[index].1 {
            let guard = &governed.guard;
            if !guard.settings.allow_delete {
                let error = WriteError::NotDeletable {
                    field: guard.path.clone(),
                };
                return guard.policy.reject(&guard.path, error).map(|_| None);
            }
        }
        let (_, slot) = self.fields.remove(index);
        Ok(slot.into_value())
    }

    /// Installs a guard on `field`, moving its current value (plain or
    /// previously shadowed) into the new shadow slot.
    pub(crate) fn install(&mut self, field: &str, guard: Guard) {
        match self.position(field) {
            Some(index) => {
                let slot = &mut self.fields[index].1;
                let shadow = std::mem::replace(slot, Slot::Plain(Value::Null)).into_value();
                *slot = Slot::Governed(Governed { shadow, guard });
            }
            None => self.fields.push((
                field.to_string(),
                Slot::Governed(Governed {
                    shadow: None,
                    guard,
                }),
            )),
        }
    }

    /// Returns `true` if the object has the field, governed or not.
    pub fn contains_key(&self, field: &str) -> bool {
        self.position(field).is_some()
    }

    /// Returns `true` if a schema installed a guard on the field.
    pub fn is_governed(&self, field: &str) -> bool {
        matches!(self.slot(field), Some(Slot::Governed(_)))
    }

    /// Returns the normalized settings governing `field`, if any.
    pub fn settings(&self, field: &str) -> Option<&Settings> {
        match self.slot(field)? {
            Slot::Governed(governed) => Some(&governed.guard.settings),
            Slot::Plain(_) => None,
        }
    }

    /// Returns the setter guarding `field`, if the field is governed and
    /// editable. Useful to validate a value without writing it.
    pub fn validator(&self, field: &str) -> Option<&Validator> {
        match self.slot(field)? {
            Slot::Governed(governed) => governed.guard.setter.as_ref(),
            Slot::Plain(_) => None,
        }
    }

    /// Iterates over all field names in insertion order, including governed
    /// fields that hold no value.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over fields that hold a value, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .filter_map(|(name, slot)| slot.value().map(|value| (name.as_str(), value)))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts the visible values into a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// Write handle to a nested [`Object`], returned by [`Object::object_mut`].
///
/// Reads go through [`Deref`]. Writes are limited to [`set`](Self::set) and
/// [`remove`](Self::remove), which run the same guards as on the object
/// itself, so nested governed fields cannot be dropped by replacing the
/// whole nested object:
///
/// ```compile_fail
/// use schema_check_core::{Object, Value, check};
///
/// let mut hero = Value::from(serde_json::json!({"skills": {"sword": 5}}));
/// let schema = Value::from(serde_json::json!({"skills": {"sword": {"type": "number"}}}));
/// let hero = check(&mut hero, &schema, None).unwrap().as_object_mut().unwrap();
///
/// let mut skills = hero.object_mut("skills").unwrap();
/// *skills = Object::new();
/// ```
#[derive(Debug)]
pub struct ObjectMut<'a> {
    object: &'a mut Object,
}

impl<'a> ObjectMut<'a> {
    /// See [`Object::set`].
    ///
    /// # Errors
    ///
    /// Same as [`Object::set`].
    pub fn set(
        &mut self,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<WriteOutcome, WriteError> {
        self.object.set(field, value)
    }

    /// See [`Object::remove`].
    ///
    /// # Errors
    ///
    /// Same as [`Object::remove`].
    pub fn remove(&mut self, field: &str) -> Result<Option<Value>, WriteError> {
        self.object.remove(field)
    }

    pub fn object_mut(&mut self, field: &str) -> Option<ObjectMut<'_>> {
        self.object.object_mut(field)
    }

    /// Like [`object_mut`](Self::object_mut), but keeps the original borrow,
    /// for walking down a path.
    pub fn into_object_mut(self, field: &str) -> Option<ObjectMut<'a>> {
        let Self { object } = self;
        object.object_mut(field)
    }
}

impl Deref for ObjectMut<'_> {
    type Target = Object;

    fn deref(&self) -> &Object {
        self.object
    }
}

impl<'a> From<&'a mut Object> for ObjectMut<'a> {
    fn from(object: &'a mut Object) -> Self {
        Self { object }
    }
}

impl PartialEq for Object {
    /// Field order is not significant; only the visible values are compared.
    fn eq(&self, other: &Self) -> bool {
        self.iter().count() == other.iter().count()
            && self
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut object = Object::new();
        for (name, value) in iter {
            let name = name.into();
            let slot = Slot::Plain(value.into());
            match object.position(&name) {
                Some(index) => object.fields[index].1 = slot,
                None => object.fields.push((name, slot)),
            }
        }
        object
    }
}
