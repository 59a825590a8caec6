use std::collections::BTreeMap;

use crate::types::Type;

/// Typed protocol value.
///
/// Converters see two container families:
/// - sequences: `List`, `Set`, `Tuple` (ordered elements)
/// - collections: `Map`, `Object` (string-keyed entries)
///
/// Numbers are held as `f64`; integral numbers go on the wire as integers.
/// `Unknown` is the protocol's placeholder for a value that is not known yet
/// (it carries the declared type, if any).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Set(Vec<Value>),
    Tuple(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(BTreeMap<String, Value>),
    Unknown(Type),
}

impl Value {
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
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

    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Tuple(_) => "tuple",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Unknown(_) => "unknown",
        }
    }

    /// Infer the concrete type of this value.
    ///
    /// - A bare null is `Dynamic`.
    /// - A list whose elements share no common type is typed as a tuple,
    ///   a map whose values share no common type as an object.
    /// - A set whose elements share no common type is a set of `Dynamic`
    ///   (each element then carries its own type on the wire).
    pub fn ty(&self) -> Type {
        match self {
            Value::Null => Type::Dynamic,
            Value::Bool(_) => Type::Bool,
            Value::Number(_) => Type::Number,
            Value::String(_) => Type::String,
            Value::List(items) => match common_type(items.iter()) {
                Some(t) => Type::list(t),
                None => Type::Tuple(items.iter().map(Value::ty).collect()),
            },
            Value::Set(items) => Type::set(common_type(items.iter()).unwrap_or(Type::Dynamic)),
            Value::Tuple(items) => Type::Tuple(items.iter().map(Value::ty).collect()),
            Value::Map(entries) => match common_type(entries.values()) {
                Some(t) => Type::map(t),
                None => Type::Object(attribute_types(entries)),
            },
            Value::Object(entries) => Type::Object(attribute_types(entries)),
            Value::Unknown(ty) => ty.clone(),
        }
    }

    /// Build a value from plain JSON.
    ///
    /// Arrays become tuples and objects become objects, since plain JSON
    /// says nothing about homogeneity.
    pub fn from_json(raw: &serde_json::Value) -> Self {
        match raw {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Tuple(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), Value::from_json(v))).collect())
            }
        }
    }

    /// Render as plain JSON. Unknown and non-finite values become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Unknown(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => match integral(*n) {
                Some(i) => serde_json::Value::from(i),
                None => serde_json::Number::from_f64(*n)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            },
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) | Value::Set(items) | Value::Tuple(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) | Value::Object(entries) => serde_json::Value::Object(
                entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// `Some(i)` when `n` is a whole number exactly representable as `i64`.
pub fn integral(n: f64) -> Option<i64> {
    // 2^63 is exactly representable as f64, i64::MAX is not.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if n.fract() == 0.0 && n >= -LIMIT && n < LIMIT {
        Some(n as i64)
    } else {
        None
    }
}

fn common_type<'a>(mut items: impl Iterator<Item = &'a Value>) -> Option<Type> {
    items.try_fold(Type::Dynamic, |acc, v| acc.unify(&v.ty()))
}

fn attribute_types(entries: &BTreeMap<String, Value>) -> BTreeMap<String, Type> {
    entries.iter().map(|(k, v)| (k.clone(), v.ty())).collect()
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn homogeneous_list_is_a_list_type() {
        let v = Value::List(vec![Value::Number(1.0), Value::Null, Value::Number(3.0)]);
        assert_eq!(v.ty(), Type::list(Type::Number));
    }

    #[test]
    fn heterogeneous_list_falls_back_to_tuple() {
        let v = Value::List(vec![Value::Number(1.0), Value::from("a")]);
        assert_eq!(v.ty(), Type::Tuple(vec![Type::Number, Type::String]));
    }

    #[test]
    fn heterogeneous_map_falls_back_to_object() {
        let v = Value::Map([("a".to_string(), Value::from(true)), ("b".to_string(), Value::from("x"))].into());
        assert!(matches!(v.ty(), Type::Object(attrs) if attrs.len() == 2));
    }

    #[test]
    fn empty_list_is_list_of_dynamic() {
        assert_eq!(Value::List(vec![]).ty(), Type::list(Type::Dynamic));
    }

    #[test]
    fn plain_json_round_trip() {
        let raw = json!({"name": "x", "n": 5, "f": 2.5, "items": [true, null]});
        let v = Value::from_json(&raw);
        assert_eq!(v.to_json(), raw);
        assert!(matches!(v, Value::Object(_)));
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(Value::Number(5.0).to_json().to_string(), "5");
        assert_eq!(Value::Number(0.5).to_json().to_string(), "0.5");
        assert_eq!(Value::Number(f64::INFINITY).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn integral_bounds() {
        assert_eq!(integral(-3.0), Some(-3));
        assert_eq!(integral(1.5), None);
        assert_eq!(integral(1e19), None);
        assert_eq!(integral(f64::NAN), None);
    }
}
