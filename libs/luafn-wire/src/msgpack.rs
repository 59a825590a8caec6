use std::collections::BTreeMap;

use luafn_api::value::integral;
use luafn_api::{Type, Value};
use rmpv::Value as Mp;

use crate::error::{Format, WireError};

const FMT: Format = Format::Msgpack;

/// Extension code used for values that are not known yet.
const UNKNOWN_EXT: i8 = 0;

// ═══════════════════════════════════════════════════════════════
//  Decode
// ═══════════════════════════════════════════════════════════════

pub fn decode(bytes: &[u8], ty: &Type) -> Result<Value, WireError> {
    let mut rest = bytes;
    let raw = rmpv::decode::read_value(&mut rest).map_err(|e| WireError::decode(FMT, e.to_string()))?;
    if !rest.is_empty() {
        return Err(WireError::decode(FMT, format!("{} trailing bytes after value", rest.len())));
    }
    from_msgpack(&raw, ty)
}

fn from_msgpack(raw: &Mp, ty: &Type) -> Result<Value, WireError> {
    if let Mp::Ext(..) = raw {
        return Ok(Value::Unknown(ty.clone()));
    }
    if *ty == Type::Dynamic {
        return from_dynamic(raw);
    }
    if raw.is_nil() {
        return Ok(Value::Null);
    }

    match ty {
        Type::Dynamic => from_dynamic(raw),
        Type::Bool => raw.as_bool().map(Value::Bool).ok_or_else(|| mismatch(raw, ty)),
        Type::Number => number(raw).map(Value::Number).ok_or_else(|| mismatch(raw, ty)),
        Type::String => raw
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| mismatch(raw, ty)),
        Type::List(element) => elements(raw, ty, |_| &**element).map(Value::List),
        Type::Set(element) => elements(raw, ty, |_| &**element).map(Value::Set),
        Type::Tuple(types) => {
            let len = raw.as_array().map(Vec::len).unwrap_or_default();
            if raw.is_array() && len != types.len() {
                return Err(WireError::decode(
                    FMT,
                    format!("tuple of {} elements carries {len}", types.len()),
                ));
            }
            elements(raw, ty, |i| &types[i]).map(Value::Tuple)
        }
        Type::Map(element) => entries(raw, ty, |_| Some(&**element)).map(Value::Map),
        Type::Object(attrs) => {
            let decoded = entries(raw, ty, |name| attrs.get(name))?;
            for name in attrs.keys() {
                if !decoded.contains_key(name) {
                    return Err(WireError::decode(FMT, format!("missing attribute {name:?}")));
                }
            }
            Ok(Value::Object(decoded))
        }
    }
}

/// A dynamic value is `[type_json, value]`, or nil for a bare null.
fn from_dynamic(raw: &Mp) -> Result<Value, WireError> {
    if raw.is_nil() {
        return Ok(Value::Null);
    }
    let Some([type_json, inner]) = raw.as_array().map(Vec::as_slice) else {
        return Err(WireError::decode(FMT, "malformed dynamic value, expected [type, value]"));
    };
    let type_bytes = match type_json {
        Mp::Binary(b) => b.as_slice(),
        Mp::String(s) => s.as_bytes(),
        _ => return Err(WireError::decode(FMT, "dynamic value type must be JSON bytes")),
    };
    let ty = Type::from_json_bytes(type_bytes).map_err(|e| WireError::decode(FMT, e.to_string()))?;
    if ty == Type::Dynamic {
        return Err(WireError::decode(FMT, "dynamic value cannot declare type dynamic"));
    }
    from_msgpack(inner, &ty)
}

/// Numbers arrive as ints, floats, or decimal strings (for values beyond float range).
fn number(raw: &Mp) -> Option<f64> {
    let n = match raw {
        Mp::Integer(i) => i.as_f64()?,
        Mp::F32(f) => f64::from(*f),
        Mp::F64(f) => *f,
        Mp::String(s) => s.as_str()?.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (!n.is_nan()).then_some(n)
}

fn elements<'t>(
    raw: &Mp,
    ty: &Type,
    element_type: impl Fn(usize) -> &'t Type,
) -> Result<Vec<Value>, WireError> {
    let items = raw.as_array().ok_or_else(|| mismatch(raw, ty))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| from_msgpack(item, element_type(i)).map_err(|e| e.at(format!("[{i}]"))))
        .collect()
}

fn entries<'t>(
    raw: &Mp,
    ty: &Type,
    value_type: impl Fn(&str) -> Option<&'t Type>,
) -> Result<BTreeMap<String, Value>, WireError> {
    let pairs = raw.as_map().ok_or_else(|| mismatch(raw, ty))?;
    let mut out = BTreeMap::new();
    for (key, item) in pairs {
        let name = key
            .as_str()
            .ok_or_else(|| WireError::decode(FMT, format!("{ty} key must be a string, got {key}")))?;
        let item_ty = value_type(name)
            .ok_or_else(|| WireError::decode(FMT, format!("unsupported attribute {name:?}")))?;
        let value = from_msgpack(item, item_ty).map_err(|e| e.at(format!(".{name}")))?;
        out.insert(name.to_string(), value);
    }
    Ok(out)
}

fn mismatch(raw: &Mp, ty: &Type) -> WireError {
    WireError::decode(FMT, format!("{ty} required, got {}", kind(raw)))
}

fn kind(raw: &Mp) -> &'static str {
    match raw {
        Mp::Nil => "nil",
        Mp::Boolean(_) => "boolean",
        Mp::Integer(_) | Mp::F32(_) | Mp::F64(_) => "number",
        Mp::String(_) => "string",
        Mp::Binary(_) => "binary",
        Mp::Array(_) => "array",
        Mp::Map(_) => "map",
        Mp::Ext(..) => "extension",
    }
}

// ═══════════════════════════════════════════════════════════════
//  Encode
// ═══════════════════════════════════════════════════════════════

pub fn encode(value: &Value, ty: &Type) -> Result<Vec<u8>, WireError> {
    let raw = to_msgpack(value, ty)?;
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, &raw).map_err(|e| WireError::encode(FMT, e.to_string()))?;
    Ok(buf)
}

fn to_msgpack(value: &Value, ty: &Type) -> Result<Mp, WireError> {
    if *ty == Type::Dynamic {
        match value {
            Value::Null => return Ok(Mp::Nil),
            Value::Unknown(Type::Dynamic) => return Ok(unknown()),
            _ => {
                let concrete = value.ty();
                let inner = to_msgpack(value, &concrete)?;
                return Ok(Mp::Array(vec![Mp::Binary(concrete.to_json_bytes()), inner]));
            }
        }
    }

    match (value, ty) {
        (Value::Null, _) => Ok(Mp::Nil),
        (Value::Unknown(_), _) => Ok(unknown()),
        (Value::Bool(b), Type::Bool) => Ok(Mp::Boolean(*b)),
        (Value::Number(n), Type::Number) => {
            if n.is_nan() {
                return Err(WireError::encode(FMT, "NaN is not a valid number"));
            }
            Ok(match integral(*n) {
                Some(i) => Mp::from(i),
                None => Mp::F64(*n),
            })
        }
        (Value::String(s), Type::String) => Ok(Mp::String(s.as_str().into())),
        (Value::List(items) | Value::Set(items) | Value::Tuple(items), Type::List(e) | Type::Set(e)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| to_msgpack(item, e).map_err(|err| err.at(format!("[{i}]"))))
            .collect::<Result<Vec<_>, _>>()
            .map(Mp::Array),
        (Value::List(items) | Value::Set(items) | Value::Tuple(items), Type::Tuple(types))
            if items.len() == types.len() =>
        {
            items
                .iter()
                .zip(types)
                .enumerate()
                .map(|(i, (item, t))| to_msgpack(item, t).map_err(|err| err.at(format!("[{i}]"))))
                .collect::<Result<Vec<_>, _>>()
                .map(Mp::Array)
        }
        (Value::Map(entries) | Value::Object(entries), Type::Map(e)) => entries
            .iter()
            .map(|(k, v)| Ok((Mp::String(k.as_str().into()), to_msgpack(v, e).map_err(|err| err.at(format!(".{k}")))?)))
            .collect::<Result<Vec<_>, WireError>>()
            .map(Mp::Map),
        (Value::Map(entries) | Value::Object(entries), Type::Object(attrs)) => {
            if let Some(extra) = entries.keys().find(|k| !attrs.contains_key(*k)) {
                return Err(WireError::encode(FMT, format!("attribute {extra:?} is not part of {ty}")));
            }
            attrs
                .iter()
                .map(|(k, t)| {
                    let v = entries.get(k).unwrap_or(&Value::Null);
                    Ok((Mp::String(k.as_str().into()), to_msgpack(v, t).map_err(|err| err.at(format!(".{k}")))?))
                })
                .collect::<Result<Vec<_>, WireError>>()
                .map(Mp::Map)
        }
        (value, ty) => Err(WireError::encode(
            FMT,
            format!("{} value does not conform to type {ty}", value.kind_name()),
        )),
    }
}

fn unknown() -> Mp {
    Mp::Ext(UNKNOWN_EXT, vec![0])
}
