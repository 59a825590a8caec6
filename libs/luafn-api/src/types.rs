use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Concrete type of a protocol value.
///
/// Serialized with the protocol's JSON type notation:
/// - `"string"`, `"number"`, `"bool"`, `"dynamic"`
/// - `["list", T]`, `["set", T]`, `["map", T]`
/// - `["object", {"attr": T, ...}]` (an optional third element listing
///   optional attributes is accepted and ignored)
/// - `["tuple", [T, ...]]`
///
/// `Dynamic` is the type-erased pseudo-type: a value declared as dynamic
/// carries its own concrete type on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Dynamic,
    Bool,
    Number,
    String,
    List(Box<Type>),
    Set(Box<Type>),
    Map(Box<Type>),
    Object(BTreeMap<String, Type>),
    Tuple(Vec<Type>),
}

/// A type description that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParseError(String);

impl fmt::Display for TypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid type description: {}", self.0)
    }
}

impl std::error::Error for TypeParseError {}

impl Type {
    pub fn list(element: Type) -> Self {
        Type::List(Box::new(element))
    }

    pub fn set(element: Type) -> Self {
        Type::Set(Box::new(element))
    }

    pub fn map(element: Type) -> Self {
        Type::Map(Box::new(element))
    }

    /// Parse the JSON type notation.
    pub fn from_json(raw: &serde_json::Value) -> Result<Self, TypeParseError> {
        match raw {
            serde_json::Value::String(name) => match name.as_str() {
                "string" => Ok(Type::String),
                "number" => Ok(Type::Number),
                "bool" => Ok(Type::Bool),
                "dynamic" => Ok(Type::Dynamic),
                other => Err(TypeParseError(format!("unsupported primitive type {other:?}"))),
            },
            serde_json::Value::Array(parts) => {
                let kind = parts
                    .first()
                    .and_then(|k| k.as_str())
                    .ok_or_else(|| TypeParseError("structural type without a kind".into()))?;
                match kind {
                    "list" | "set" | "map" => {
                        let [_, element] = parts.as_slice() else {
                            return Err(TypeParseError(format!("{kind} type needs exactly one element type")));
                        };
                        let element = Box::new(Type::from_json(element)?);
                        Ok(match kind {
                            "list" => Type::List(element),
                            "set" => Type::Set(element),
                            _ => Type::Map(element),
                        })
                    }
                    "object" => {
                        let attrs = match parts.as_slice() {
                            [_, serde_json::Value::Object(attrs)]
                            | [_, serde_json::Value::Object(attrs), serde_json::Value::Array(_)] => attrs,
                            _ => return Err(TypeParseError("object type needs an attribute map".into())),
                        };
                        let attrs = attrs
                            .iter()
                            .map(|(name, ty)| Ok((name.clone(), Type::from_json(ty)?)))
                            .collect::<Result<BTreeMap<_, _>, TypeParseError>>()?;
                        Ok(Type::Object(attrs))
                    }
                    "tuple" => {
                        let [_, serde_json::Value::Array(elements)] = parts.as_slice() else {
                            return Err(TypeParseError("tuple type needs an element type list".into()));
                        };
                        let elements = elements
                            .iter()
                            .map(Type::from_json)
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok(Type::Tuple(elements))
                    }
                    other => Err(TypeParseError(format!("unsupported structural type {other:?}"))),
                }
            }
            other => Err(TypeParseError(format!("unexpected {other}"))),
        }
    }

    /// Parse the JSON type notation from raw bytes (as carried on the wire).
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, TypeParseError> {
        let raw: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| TypeParseError(e.to_string()))?;
        Self::from_json(&raw)
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            Type::Dynamic => json!("dynamic"),
            Type::Bool => json!("bool"),
            Type::Number => json!("number"),
            Type::String => json!("string"),
            Type::List(e) => json!(["list", e.to_json()]),
            Type::Set(e) => json!(["set", e.to_json()]),
            Type::Map(e) => json!(["map", e.to_json()]),
            Type::Object(attrs) => {
                let attrs: serde_json::Map<String, serde_json::Value> = attrs
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.to_json()))
                    .collect();
                json!(["object", attrs])
            }
            Type::Tuple(elements) => {
                let elements: Vec<serde_json::Value> = elements.iter().map(Type::to_json).collect();
                json!(["tuple", elements])
            }
        }
    }

    pub fn to_json_bytes(&self) -> Vec<u8> {
        self.to_json().to_string().into_bytes()
    }

    /// Most specific type both `self` and `other` conform to.
    ///
    /// `Dynamic` (the type of a bare null) unifies with anything.
    /// Returns `None` when the two types have no common shape.
    pub fn unify(&self, other: &Type) -> Option<Type> {
        match (self, other) {
            (Type::Dynamic, t) | (t, Type::Dynamic) => Some(t.clone()),
            (Type::List(a), Type::List(b)) => a.unify(b).map(Type::list),
            (Type::Set(a), Type::Set(b)) => a.unify(b).map(Type::set),
            (Type::Map(a), Type::Map(b)) => a.unify(b).map(Type::map),
            (Type::Object(a), Type::Object(b)) if a.len() == b.len() && a.keys().eq(b.keys()) => a
                .iter()
                .zip(b.values())
                .map(|((name, x), y)| x.unify(y).map(|t| (name.clone(), t)))
                .collect::<Option<BTreeMap<_, _>>>()
                .map(Type::Object),
            (Type::Tuple(a), Type::Tuple(b)) if a.len() == b.len() => a
                .iter()
                .zip(b)
                .map(|(x, y)| x.unify(y))
                .collect::<Option<Vec<_>>>()
                .map(Type::Tuple),
            (a, b) if a == b => Some(a.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Dynamic => f.write_str("dynamic"),
            Type::Bool => f.write_str("bool"),
            Type::Number => f.write_str("number"),
            Type::String => f.write_str("string"),
            Type::List(e) => write!(f, "list of {e}"),
            Type::Set(e) => write!(f, "set of {e}"),
            Type::Map(e) => write!(f, "map of {e}"),
            Type::Object(_) => f.write_str("object"),
            Type::Tuple(_) => f.write_str("tuple"),
        }
    }
}

impl Serialize for Type {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Type::from_json(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_structural_types() {
        let raw = json!(["object", {"tags": ["set", "string"], "pos": ["tuple", ["number", "bool"]]}]);
        let ty = Type::from_json(&raw).unwrap();

        let mut attrs = BTreeMap::new();
        attrs.insert("tags".to_string(), Type::set(Type::String));
        attrs.insert("pos".to_string(), Type::Tuple(vec![Type::Number, Type::Bool]));
        assert_eq!(ty, Type::Object(attrs));
        assert_eq!(ty.to_json(), raw);
    }

    #[test]
    fn accepts_optional_attribute_list() {
        let raw = json!(["object", {"a": "string"}, ["a"]]);
        assert!(matches!(Type::from_json(&raw), Ok(Type::Object(_))));
    }

    #[test]
    fn rejects_capsule_and_garbage() {
        assert!(Type::from_json(&json!("capsule")).is_err());
        assert!(Type::from_json(&json!(["list"])).is_err());
        assert!(Type::from_json(&json!(["frob", "string"])).is_err());
        assert!(Type::from_json(&json!(42)).is_err());
    }

    #[test]
    fn unify_treats_dynamic_as_wildcard() {
        let a = Type::list(Type::Dynamic);
        let b = Type::list(Type::Number);
        assert_eq!(a.unify(&b), Some(Type::list(Type::Number)));
        assert_eq!(Type::String.unify(&Type::Number), None);
        assert_eq!(
            Type::Tuple(vec![Type::Number]).unify(&Type::Tuple(vec![Type::Number, Type::Bool])),
            None
        );
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(Type::list(Type::map(Type::Bool)).to_string(), "list of map of bool");
    }
}
