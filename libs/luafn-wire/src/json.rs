use std::collections::BTreeMap;

use luafn_api::value::integral;
use luafn_api::{Type, Value};
use serde_json::Value as Json;

use crate::error::{Format, WireError};

const FMT: Format = Format::Json;

// ═══════════════════════════════════════════════════════════════
//  Decode
// ═══════════════════════════════════════════════════════════════

pub fn decode(bytes: &[u8], ty: &Type) -> Result<Value, WireError> {
    let raw: Json = serde_json::from_slice(bytes).map_err(|e| WireError::decode(FMT, e.to_string()))?;
    from_json(&raw, ty)
}

fn from_json(raw: &Json, ty: &Type) -> Result<Value, WireError> {
    if *ty == Type::Dynamic {
        return from_dynamic(raw);
    }

    match (raw, ty) {
        (Json::Null, _) => Ok(Value::Null),
        (Json::Bool(b), Type::Bool) => Ok(Value::Bool(*b)),
        (Json::Number(n), Type::Number) => n
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| WireError::decode(FMT, format!("number {n} out of range"))),
        (Json::String(s), Type::Number) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| !n.is_nan())
            .map(Value::Number)
            .ok_or_else(|| WireError::decode(FMT, format!("{s:?} is not a number"))),
        (Json::String(s), Type::String) => Ok(Value::String(s.clone())),
        (Json::Array(items), Type::List(e)) => elements(items, |_| &**e).map(Value::List),
        (Json::Array(items), Type::Set(e)) => elements(items, |_| &**e).map(Value::Set),
        (Json::Array(items), Type::Tuple(types)) => {
            if items.len() != types.len() {
                return Err(WireError::decode(
                    FMT,
                    format!("tuple of {} elements carries {}", types.len(), items.len()),
                ));
            }
            elements(items, |i| &types[i]).map(Value::Tuple)
        }
        (Json::Object(map), Type::Map(e)) => map
            .iter()
            .map(|(k, v)| Ok((k.clone(), from_json(v, e).map_err(|err| err.at(format!(".{k}")))?)))
            .collect::<Result<BTreeMap<_, _>, WireError>>()
            .map(Value::Map),
        (Json::Object(map), Type::Object(attrs)) => {
            if let Some(extra) = map.keys().find(|k| !attrs.contains_key(*k)) {
                return Err(WireError::decode(FMT, format!("unsupported attribute {extra:?}")));
            }
            attrs
                .iter()
                .map(|(k, t)| {
                    let v = map
                        .get(k)
                        .ok_or_else(|| WireError::decode(FMT, format!("missing attribute {k:?}")))?;
                    Ok((k.clone(), from_json(v, t).map_err(|err| err.at(format!(".{k}")))?))
                })
                .collect::<Result<BTreeMap<_, _>, WireError>>()
                .map(Value::Object)
        }
        (raw, ty) => Err(WireError::decode(FMT, format!("{ty} required, got {}", kind(raw)))),
    }
}

/// A dynamic value is `{"value": ..., "type": ...}`, or `null` for a bare null.
fn from_dynamic(raw: &Json) -> Result<Value, WireError> {
    match raw {
        Json::Null => Ok(Value::Null),
        Json::Object(map) => {
            let (Some(ty), Some(value)) = (map.get("type"), map.get("value")) else {
                return Err(WireError::decode(FMT, "dynamic value needs \"type\" and \"value\" fields"));
            };
            let ty = Type::from_json(ty).map_err(|e| WireError::decode(FMT, e.to_string()))?;
            if ty == Type::Dynamic {
                return Err(WireError::decode(FMT, "dynamic value cannot declare type dynamic"));
            }
            from_json(value, &ty)
        }
        other => Err(WireError::decode(FMT, format!("malformed dynamic value, got {}", kind(other)))),
    }
}

fn elements<'t>(items: &[Json], element_type: impl Fn(usize) -> &'t Type) -> Result<Vec<Value>, WireError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| from_json(item, element_type(i)).map_err(|e| e.at(format!("[{i}]"))))
        .collect()
}

fn kind(raw: &Json) -> &'static str {
    match raw {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

// ═══════════════════════════════════════════════════════════════
//  Encode
// ═══════════════════════════════════════════════════════════════

pub fn encode(value: &Value, ty: &Type) -> Result<Vec<u8>, WireError> {
    let raw = to_json(value, ty)?;
    serde_json::to_vec(&raw).map_err(|e| WireError::encode(FMT, e.to_string()))
}

fn to_json(value: &Value, ty: &Type) -> Result<Json, WireError> {
    if let Value::Unknown(_) = value {
        return Err(WireError::encode(FMT, "value is not known"));
    }
    if *ty == Type::Dynamic {
        if value.is_null() {
            return Ok(Json::Null);
        }
        let concrete = value.ty();
        let inner = to_json(value, &concrete)?;
        return Ok(serde_json::json!({ "value": inner, "type": concrete.to_json() }));
    }

    match (value, ty) {
        (Value::Null, _) => Ok(Json::Null),
        (Value::Bool(b), Type::Bool) => Ok(Json::Bool(*b)),
        (Value::Number(n), Type::Number) => match integral(*n) {
            Some(i) => Ok(Json::from(i)),
            None => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .ok_or_else(|| WireError::encode(FMT, format!("{n} cannot be represented in JSON"))),
        },
        (Value::String(s), Type::String) => Ok(Json::String(s.clone())),
        (Value::List(items) | Value::Set(items) | Value::Tuple(items), Type::List(e) | Type::Set(e)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| to_json(item, e).map_err(|err| err.at(format!("[{i}]"))))
            .collect::<Result<Vec<_>, _>>()
            .map(Json::Array),
        (Value::List(items) | Value::Set(items) | Value::Tuple(items), Type::Tuple(types))
            if items.len() == types.len() =>
        {
            items
                .iter()
                .zip(types)
                .enumerate()
                .map(|(i, (item, t))| to_json(item, t).map_err(|err| err.at(format!("[{i}]"))))
                .collect::<Result<Vec<_>, _>>()
                .map(Json::Array)
        }
        (Value::Map(entries) | Value::Object(entries), Type::Map(e)) => entries
            .iter()
            .map(|(k, v)| Ok((k.clone(), to_json(v, e).map_err(|err| err.at(format!(".{k}")))?)))
            .collect::<Result<serde_json::Map<_, _>, WireError>>()
            .map(Json::Object),
        (Value::Map(entries) | Value::Object(entries), Type::Object(attrs)) => {
            if let Some(extra) = entries.keys().find(|k| !attrs.contains_key(*k)) {
                return Err(WireError::encode(FMT, format!("attribute {extra:?} is not part of {ty}")));
            }
            attrs
                .iter()
                .map(|(k, t)| {
                    let v = entries.get(k).unwrap_or(&Value::Null);
                    Ok((k.clone(), to_json(v, t).map_err(|err| err.at(format!(".{k}")))?))
                })
                .collect::<Result<serde_json::Map<_, _>, WireError>>()
                .map(Json::Object)
        }
        (value, ty) => Err(WireError::encode(
            FMT,
            format!("{} value does not conform to type {ty}", value.kind_name()),
        )),
    }
}
