use luafn_api::Value;

use crate::error::CallError;
use crate::table::{LuaValue, Table, TableKey};

/// Typed protocol value → engine value.
///
/// Sequences become tables keyed `0..n-1` in element order, keyed
/// collections become tables keyed by attribute name. A null at any depth
/// lowers to nil.
pub fn lower(value: &Value) -> Result<LuaValue, CallError> {
    match value {
        Value::Null => Ok(LuaValue::Nil),
        Value::Bool(b) => Ok(LuaValue::Bool(*b)),
        Value::Number(n) => Ok(LuaValue::Number(*n)),
        Value::String(s) => Ok(LuaValue::String(s.clone())),
        Value::List(items) | Value::Set(items) | Value::Tuple(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| Ok((TableKey::Integer(i as i64), lower(item)?)))
            .collect::<Result<Table, CallError>>()
            .map(LuaValue::Table),
        Value::Map(entries) | Value::Object(entries) => entries
            .iter()
            .map(|(k, v)| Ok((TableKey::String(k.clone()), lower(v)?)))
            .collect::<Result<Table, CallError>>()
            .map(LuaValue::Table),
        Value::Unknown(ty) => Err(CallError::UnsupportedType { ty: ty.clone() }),
    }
}
