use std::collections::BTreeMap;

use luafn_api::Value;

use crate::error::CallError;
use crate::table::{LuaValue, Table};

/// Engine value → typed protocol value.
///
/// Tables are classified after their keys are stringified:
/// - keys `0..n-1` or `1..n`, all present: list, slot `index - offset`
/// - anything else, including the empty table: object
///
/// A later entry whose key stringifies like an earlier one replaces it.
pub fn raise(value: LuaValue) -> Result<Value, CallError> {
    match value {
        LuaValue::Nil => Ok(Value::Null),
        LuaValue::Bool(b) => Ok(Value::Bool(b)),
        LuaValue::Number(n) => Ok(Value::Number(n)),
        LuaValue::String(s) => Ok(Value::String(s)),
        LuaValue::Table(t) => raise_table(t),
        LuaValue::Foreign(type_name) => Err(CallError::UnhandledReturnType { type_name }),
    }
}

/// Raise the single result of a call.
///
/// No result, or a nil one, is an error at the top level only.
pub fn raise_return(result: Option<LuaValue>) -> Result<Value, CallError> {
    match result {
        None | Some(LuaValue::Nil) => Err(CallError::MissingReturnValue),
        Some(value) => raise(value),
    }
}

fn raise_table(table: Table) -> Result<Value, CallError> {
    let mut object = BTreeMap::new();
    for (key, value) in table {
        let name = key.into_name().map_err(|key_type| CallError::BadTableIndex { key_type })?;
        object.insert(name, raise(value)?);
    }

    if object.is_empty() {
        return Ok(Value::Object(object));
    }

    let offset = if object.contains_key("0") { 0 } else { 1 };
    let slots: Vec<String> = (offset..offset + object.len()).map(|i| i.to_string()).collect();
    if slots.iter().all(|slot| object.contains_key(slot)) {
        let items = slots.iter().filter_map(|slot| object.remove(slot)).collect();
        return Ok(Value::List(items));
    }

    Ok(Value::Object(object))
}
