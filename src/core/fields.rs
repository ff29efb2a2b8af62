//! Structured field values and the copy-on-write field container
//!
//! This module provides:
//! - `FieldValue`: tagged union of every value a field may carry
//! - `Fields`: key/value mapping shared between entries until one of them writes

use super::error::{LoggerError, Result};
use crate::formatters::{FieldLabel, FieldMap};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

/// Error carried by an entry or a field.
pub type ErrorValue = Arc<dyn std::error::Error + Send + Sync>;

/// A value with no textual or serialized form.
///
/// Useful to hand arbitrary data to hooks; formatters reject it.
#[derive(Clone)]
pub struct OpaqueValue {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl OpaqueValue {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Value type for structured logging fields
#[derive(Debug, Clone)]
pub enum FieldValue {
    String(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Null,
    Error(ErrorValue),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
    Opaque(OpaqueValue),
}

impl FieldValue {
    /// Wrap an error value.
    pub fn error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FieldValue::Error(Arc::new(err))
    }

    /// Wrap an arbitrary value that has no textual representation.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        FieldValue::Opaque(OpaqueValue {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to serde_json::Value for JSON serialization
    ///
    /// Fails for opaque values and non-finite floats, which JSON cannot carry.
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        use serde_json::Value;

        Ok(match self {
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::UInt(u) => Value::from(*u),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .ok_or_else(|| {
                    LoggerError::formatter("json", format!("float {} is not representable", f))
                })?,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Null => Value::Null,
            FieldValue::Error(e) => Value::String(e.to_string()),
            FieldValue::List(items) => Value::Array(
                items
                    .iter()
                    .map(FieldValue::to_json_value)
                    .collect::<Result<Vec<_>>>()?,
            ),
            FieldValue::Map(map) => {
                let mut obj = serde_json::Map::new();
                for (key, value) in map {
                    obj.insert(key.clone(), value.to_json_value()?);
                }
                Value::Object(obj)
            }
            FieldValue::Opaque(o) => {
                return Err(LoggerError::formatter(
                    "json",
                    format!("value of type {} has no serialized form", o.type_name()),
                ))
            }
        })
    }

    /// Render as unquoted text. Nested structures are rendered as compact JSON.
    pub fn to_text(&self) -> Result<String> {
        Ok(match self {
            FieldValue::String(s) => s.clone(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::UInt(u) => u.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Null => "null".to_string(),
            FieldValue::Error(e) => e.to_string(),
            FieldValue::List(_) | FieldValue::Map(_) => {
                serde_json::to_string(&self.to_json_value()?)?
            }
            FieldValue::Opaque(o) => {
                return Err(LoggerError::formatter(
                    "text",
                    format!("value of type {} has no textual form", o.type_name()),
                ))
            }
        })
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Opaque(o) => write!(f, "<{}>", o.type_name()),
            other => match other.to_text() {
                Ok(text) => f.write_str(&text),
                Err(_) => f.write_str("<unrepresentable>"),
            },
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        use FieldValue::*;
        match (self, other) {
            (String(a), String(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (Null, Null) => true,
            (Error(a), Error(b)) => a.to_string() == b.to_string(),
            (List(a), List(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            (Opaque(a), Opaque(b)) => Arc::ptr_eq(&a.value, &b.value),
            _ => false,
        }
    }
}

impl PartialEq<str> for FieldValue {
    fn eq(&self, other: &str) -> bool {
        matches!(self, FieldValue::String(s) if s == other)
    }
}

impl PartialEq<&str> for FieldValue {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<i64> for FieldValue {
    fn eq(&self, other: &i64) -> bool {
        match self {
            FieldValue::Int(i) => i == other,
            FieldValue::UInt(u) => i64::try_from(*u).map_or(false, |u| u == *other),
            _ => false,
        }
    }
}

impl PartialEq<i32> for FieldValue {
    fn eq(&self, other: &i32) -> bool {
        *self == i64::from(*other)
    }
}

impl PartialEq<f64> for FieldValue {
    fn eq(&self, other: &f64) -> bool {
        matches!(self, FieldValue::Float(f) if f == other)
    }
}

impl PartialEq<bool> for FieldValue {
    fn eq(&self, other: &bool) -> bool {
        matches!(self, FieldValue::Bool(b) if b == other)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::String(s.clone())
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(i: $t) -> Self {
                FieldValue::Int(i as i64)
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(u: $t) -> Self {
                FieldValue::UInt(u as u64)
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for FieldValue {
    fn from(f: f32) -> Self {
        FieldValue::Float(f as f64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<FieldValue>> From<BTreeMap<K, V>> for FieldValue {
    fn from(map: BTreeMap<K, V>) -> Self {
        FieldValue::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<ErrorValue> for FieldValue {
    fn from(err: ErrorValue) -> Self {
        FieldValue::Error(err)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::UInt(u)
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => FieldValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(obj) => {
                FieldValue::Map(obj.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Key/value fields attached to an entry.
///
/// Clones share storage; the first write to a shared container copies it, so
/// an entry derived from another never observes (or causes) later changes on
/// its parent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    inner: Arc<HashMap<String, FieldValue>>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.insert(key, value);
        self
    }

    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<FieldValue>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        Arc::make_mut(&mut self.inner).insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        if !self.inner.contains_key(key) {
            return None;
        }
        Arc::make_mut(&mut self.inner).remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.inner.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> std::collections::hash_map::Iter<'_, String, FieldValue> {
        self.inner.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// True when both containers point at the same storage.
    pub fn shares_storage_with(&self, other: &Fields) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Merge `overlay` over `self` into a new container; overlay keys win.
    #[must_use]
    pub fn merge(&self, overlay: &Fields) -> Fields {
        if overlay.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return overlay.clone();
        }
        let mut merged = HashMap::with_capacity(self.len() + overlay.len());
        for (key, value) in self.iter().chain(overlay.iter()) {
            merged.insert(key.clone(), value.clone());
        }
        Fields {
            inner: Arc::new(merged),
        }
    }

    /// Move user fields that would collide with a built-in output label into
    /// the data namespace, e.g. `level` becomes `data.level`.
    ///
    /// Pure and idempotent: renamed keys no longer match any label, and a
    /// rename never replaces a field that already holds the target key.
    #[must_use]
    pub fn prefix_field_clashes(&self, field_map: &FieldMap) -> Fields {
        let renames = self.clash_renames(field_map);
        if renames.is_empty() {
            return self.clone();
        }

        let mut renamed = (*self.inner).clone();
        for (from, to) in renames {
            if let Some(value) = renamed.remove(&from) {
                renamed.insert(to, value);
            }
        }
        Fields {
            inner: Arc::new(renamed),
        }
    }

    /// `(original, renamed)` key pairs that [`Fields::prefix_field_clashes`]
    /// applies, in label order.
    ///
    /// When `data.<key>` is already taken the data label is prepended again
    /// until the key is free.
    pub fn clash_renames(&self, field_map: &FieldMap) -> Vec<(String, String)> {
        let data_label = field_map.resolve(FieldLabel::Data);
        let mut renames: Vec<(String, String)> = Vec::new();

        for label in FieldLabel::ALL {
            let key = field_map.resolve(label);
            if !self.contains_key(key) || renames.iter().any(|(from, _)| from == key) {
                continue;
            }
            let mut target = format!("{}.{}", data_label, key);
            while self.contains_key(&target) || renames.iter().any(|(_, to)| *to == target) {
                target = format!("{}.{}", data_label, target);
            }
            renames.push((key.to_string(), target));
        }
        renames
    }
}

impl Index<&str> for Fields {
    type Output = FieldValue;

    fn index(&self, key: &str) -> &FieldValue {
        match self.inner.get(key) {
            Some(value) => value,
            None => panic!("no field named {:?}", key),
        }
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = std::collections::hash_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Fields {
            inner: Arc::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl From<HashMap<String, FieldValue>> for Fields {
    fn from(map: HashMap<String, FieldValue>) -> Self {
        Fields {
            inner: Arc::new(map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_creation() {
        let fields = Fields::new();
        assert!(fields.is_empty());

        let fields = Fields::new()
            .with("user_id", 123)
            .with("username", "john_doe")
            .with("active", true);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["user_id"], 123);
        assert_eq!(fields["username"], "john_doe");
        assert_eq!(fields["active"], true);
    }

    #[test]
    fn test_merge_overlay_wins() {
        let base = Fields::new().with("a", 1).with("b", "base");
        let overlay = Fields::new().with("b", "overlay").with("c", 3.5);

        let merged = base.merge(&overlay);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged["b"], "overlay");
        assert_eq!(merged["c"], 3.5);

        // base untouched
        assert_eq!(base.len(), 2);
        assert_eq!(base["b"], "base");
    }

    #[test]
    fn test_copy_on_write() {
        let base = Fields::new().with("shared", "yes");
        let mut derived = base.clone();
        assert!(derived.shares_storage_with(&base));

        derived.insert("extra", 1);
        assert!(!derived.shares_storage_with(&base));
        assert!(!base.contains_key("extra"));
        assert_eq!(derived.len(), 2);
    }

    #[test]
    fn test_prefix_field_clashes() {
        let fields = Fields::new()
            .with("level", "something")
            .with("msg", "hello")
            .with("herp", "derp");
        let renamed = fields.prefix_field_clashes(&FieldMap::default());

        assert!(!renamed.contains_key("level"));
        assert!(!renamed.contains_key("msg"));
        assert_eq!(renamed["data.level"], "something");
        assert_eq!(renamed["data.msg"], "hello");
        assert_eq!(renamed["herp"], "derp");

        // source untouched
        assert!(fields.contains_key("level"));
    }

    #[test]
    fn test_prefix_field_clashes_idempotent() {
        let fields = Fields::new().with("level", 1).with("data", "nested");
        let once = fields.prefix_field_clashes(&FieldMap::default());
        let twice = once.prefix_field_clashes(&FieldMap::default());

        assert_eq!(once, twice);
        assert!(twice.contains_key("data.level"));
        assert!(twice.contains_key("data.data"));
        assert!(!twice.contains_key("data.data.level"));
    }

    #[test]
    fn test_prefix_field_clashes_keeps_namespaced_field() {
        let fields = Fields::new().with("level", "A").with("data.level", "B");
        let renamed = fields.prefix_field_clashes(&FieldMap::default());

        assert_eq!(renamed.len(), 2);
        assert_eq!(renamed["data.level"], "B");
        assert_eq!(renamed["data.data.level"], "A");
        assert_eq!(renamed.prefix_field_clashes(&FieldMap::default()), renamed);
        assert_eq!(
            fields.clash_renames(&FieldMap::default()),
            vec![("level".to_string(), "data.data.level".to_string())]
        );
    }

    #[test]
    fn test_prefix_field_clashes_remapped_labels() {
        let map = FieldMap::new()
            .with(FieldLabel::Level, "@level")
            .with(FieldLabel::Data, "@data");
        let fields = Fields::new().with("@level", "x").with("level", "y");
        let renamed = fields.prefix_field_clashes(&map);

        assert_eq!(renamed["@data.@level"], "x");
        // "level" is no longer a label once remapped
        assert_eq!(renamed["level"], "y");
    }

    #[test]
    fn test_json_value_conversion() {
        let value = FieldValue::from(vec![1, 2, 3]);
        assert_eq!(value.to_json_value().unwrap(), serde_json::json!([1, 2, 3]));

        let nested = FieldValue::from(serde_json::json!({"a": {"b": true}}));
        assert_eq!(
            nested.to_json_value().unwrap(),
            serde_json::json!({"a": {"b": true}})
        );

        let err = FieldValue::Float(f64::NAN).to_json_value().unwrap_err();
        assert!(matches!(err, LoggerError::FormatterError { .. }));
    }

    #[test]
    fn test_opaque_is_unrepresentable() {
        struct Handle;
        let value = FieldValue::opaque(Handle);

        assert!(value.to_json_value().is_err());
        assert!(value.to_text().is_err());
        assert!(value.to_string().contains("Handle"));
    }

    #[test]
    fn test_error_value_text() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "wild walrus");
        let value = FieldValue::error(err);
        assert_eq!(value.to_text().unwrap(), "wild walrus");
        assert_eq!(
            value.to_json_value().unwrap(),
            serde_json::Value::String("wild walrus".into())
        );
    }
}
