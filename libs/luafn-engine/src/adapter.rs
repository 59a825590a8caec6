//! Moves value trees in and out of a live Lua state.

use std::ffi::c_void;

use mlua::Lua;

use crate::error::CallError;
use crate::table::{LuaValue, Table, TableKey};

/// Build the engine value for `value` inside `lua`.
///
/// Numbers are always Lua floats; integer arithmetic would wrap on overflow.
pub fn push(lua: &Lua, value: &LuaValue) -> mlua::Result<mlua::Value> {
    Ok(match value {
        LuaValue::Nil => mlua::Value::Nil,
        LuaValue::Bool(b) => mlua::Value::Boolean(*b),
        LuaValue::Number(n) => mlua::Value::Number(*n),
        LuaValue::String(s) => mlua::Value::String(lua.create_string(s)?),
        LuaValue::Table(entries) => {
            let table = lua.create_table()?;
            for (key, value) in entries.iter() {
                table.raw_set(push_key(lua, key)?, push(lua, value)?)?;
            }
            mlua::Value::Table(table)
        }
        LuaValue::Foreign(type_name) => {
            return Err(mlua::Error::RuntimeError(format!("cannot pass a {type_name} value into the engine")));
        }
    })
}

fn push_key(lua: &Lua, key: &TableKey) -> mlua::Result<mlua::Value> {
    Ok(match key {
        TableKey::Integer(i) => mlua::Value::Integer(*i),
        TableKey::Number(n) => mlua::Value::Number(*n),
        TableKey::String(s) => mlua::Value::String(lua.create_string(s)?),
        TableKey::Foreign(type_name) => {
            return Err(mlua::Error::RuntimeError(format!("cannot use a {type_name} key inside the engine")));
        }
    })
}

/// Copy an engine value out of the Lua state.
///
/// Shapes without a protocol counterpart come back as `Foreign` and are
/// rejected later, when the tree is raised. A table reachable from itself
/// is rejected here.
pub fn read(value: mlua::Value) -> Result<LuaValue, CallError> {
    read_nested(value, &mut Vec::new())
}

fn read_nested(value: mlua::Value, ancestors: &mut Vec<*const c_void>) -> Result<LuaValue, CallError> {
    match value {
        mlua::Value::Nil => Ok(LuaValue::Nil),
        mlua::Value::Boolean(b) => Ok(LuaValue::Bool(b)),
        mlua::Value::Integer(i) => Ok(LuaValue::Number(i as f64)),
        mlua::Value::Number(n) => Ok(LuaValue::Number(n)),
        mlua::Value::String(s) => match s.to_str() {
            Ok(text) => Ok(LuaValue::String(text.to_string())),
            Err(_) => Err(CallError::UnhandledReturnType { type_name: "non-UTF-8 string" }),
        },
        mlua::Value::Table(t) => {
            let id = t.to_pointer();
            if ancestors.contains(&id) {
                return Err(CallError::RecursiveTable);
            }
            ancestors.push(id);

            let mut table = Table::new();
            for pair in t.pairs::<mlua::Value, mlua::Value>() {
                let (key, value) = pair?;
                let key = read_key(key)?;
                table.insert(key, read_nested(value, ancestors)?);
            }

            ancestors.pop();
            Ok(LuaValue::Table(table))
        }
        other => Ok(LuaValue::Foreign(other.type_name())),
    }
}

fn read_key(key: mlua::Value) -> Result<TableKey, CallError> {
    Ok(match key {
        mlua::Value::Integer(i) => TableKey::Integer(i),
        mlua::Value::Number(n) => TableKey::Number(n),
        mlua::Value::String(s) => match s.to_str() {
            Ok(text) => TableKey::String(text.to_string()),
            Err(_) => return Err(CallError::BadTableIndex { key_type: "non-UTF-8 string" }),
        },
        other => TableKey::Foreign(other.type_name()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(lua: &Lua, value: &LuaValue) -> LuaValue {
        read(push(lua, value).unwrap()).unwrap()
    }

    #[test]
    fn scalars_round_trip() {
        let lua = Lua::new();
        for v in [
            LuaValue::Nil,
            LuaValue::Bool(false),
            LuaValue::Number(7.0),
            LuaValue::Number(-0.25),
            LuaValue::String("héllo".into()),
        ] {
            assert_eq!(round_trip(&lua, &v), v);
        }
    }

    #[test]
    fn tables_round_trip() {
        let lua = Lua::new();
        let inner: Table = [("k", LuaValue::Bool(true))].into_iter().collect();
        let outer: Table = [(0i64, LuaValue::Table(inner.clone()))].into_iter().collect();

        let LuaValue::Table(back) = round_trip(&lua, &LuaValue::Table(outer)) else {
            panic!("expected table")
        };
        let entries: Vec<_> = back.into_iter().collect();
        assert_eq!(entries, vec![(TableKey::Integer(0), LuaValue::Table(inner))]);
    }

    #[test]
    fn numbers_are_lua_floats() {
        let lua = Lua::new();
        let pushed = push(&lua, &LuaValue::Number(3.0)).unwrap();
        assert!(matches!(pushed, mlua::Value::Number(n) if n == 3.0));
        let kind: String = lua.load("return math.type(...)").call(pushed).unwrap();
        assert_eq!(kind, "float");
    }

    #[test]
    fn large_products_do_not_wrap() {
        let lua = Lua::new();
        let mul: mlua::Function = lua.load("return function(a, b) return a * b end").eval().unwrap();
        let x = push(&lua, &LuaValue::Number(4294967296.0)).unwrap();
        let out = read(mul.call((x.clone(), x)).unwrap()).unwrap();
        assert_eq!(out, LuaValue::Number(1.8446744073709552e19));
    }

    #[test]
    fn invalid_utf8_string_is_rejected() {
        let lua = Lua::new();
        let value: mlua::Value = lua.load("return string.char(255)").eval().unwrap();
        assert!(matches!(read(value), Err(CallError::UnhandledReturnType { .. })));
    }

    #[test]
    fn invalid_utf8_keys_are_rejected() {
        let lua = Lua::new();
        let value: mlua::Value = lua.load("return { [string.char(255)] = 1, [string.char(254)] = 2 }").eval().unwrap();
        assert!(matches!(read(value), Err(CallError::BadTableIndex { .. })));
    }

    #[test]
    fn functions_and_boolean_keys_are_foreign() {
        let lua = Lua::new();
        let value: mlua::Value = lua.load("return { f = print, [true] = 1 }").eval().unwrap();
        let LuaValue::Table(t) = read(value).unwrap() else { panic!("expected table") };
        let mut entries: Vec<_> = t.into_iter().collect();
        entries.sort_by_key(|(k, _)| matches!(k, TableKey::String(_)));
        assert_eq!(entries[0], (TableKey::Foreign("boolean"), LuaValue::Number(1.0)));
        assert_eq!(entries[1], (TableKey::from("f"), LuaValue::Foreign("function")));
    }

    #[test]
    fn self_referencing_table_is_rejected() {
        let lua = Lua::new();
        let value: mlua::Value = lua.load("local t = {} t.me = t return t").eval().unwrap();
        assert!(matches!(read(value), Err(CallError::RecursiveTable)));
    }

    #[test]
    fn shared_subtables_are_not_recursion() {
        let lua = Lua::new();
        let value: mlua::Value = lua.load("local s = {1} return { a = s, b = s }").eval().unwrap();
        assert!(read(value).is_ok());
    }
}
