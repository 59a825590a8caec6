//! One call, one engine: load the source, find the function, convert the
//! arguments down, run, convert the single result back up.

use luafn_api::Value;
use mlua::{Lua, MultiValue};

use crate::adapter::{push, read};
use crate::error::CallError;
use crate::lower::lower;
use crate::raise::raise_return;

const CHUNK_NAME: &str = "=lua";

/// Run the source, then call the global function `name` with `args`.
pub fn call_global(source: &str, name: &str, args: &[Value]) -> Result<Value, CallError> {
    let lua = Lua::new();
    lua.load(source).set_name(CHUNK_NAME).exec()?;

    let function = match lua.globals().get::<mlua::Value>(name)? {
        mlua::Value::Function(f) => f,
        other => {
            tracing::debug!(function = %name, found = other.type_name(), "global is not callable");
            return Err(CallError::missing_function());
        }
    };
    invoke(&lua, function, args)
}

/// Run the source, which must end with `return <function>`, and call the
/// returned function with `args`.
pub fn call_returned(source: &str, args: &[Value]) -> Result<Value, CallError> {
    let lua = Lua::new();
    let function = match lua.load(source).set_name(CHUNK_NAME).eval::<mlua::Value>()? {
        mlua::Value::Function(f) => f,
        other => {
            tracing::debug!(found = other.type_name(), "chunk did not return a function");
            return Err(CallError::missing_function());
        }
    };
    invoke(&lua, function, args)
}

/// Compile the source without running it.
pub fn check_syntax(source: &str) -> Result<(), CallError> {
    let lua = Lua::new();
    lua.load(source).set_name(CHUNK_NAME).into_function()?;
    Ok(())
}

fn invoke(lua: &Lua, function: mlua::Function, args: &[Value]) -> Result<Value, CallError> {
    let mut pushed = Vec::with_capacity(args.len());
    for arg in args {
        pushed.push(push(lua, &lower(arg)?)?);
    }

    let results: MultiValue = function.call(pushed.into_iter().collect::<MultiValue>())?;
    let first = results.into_iter().next().map(read).transpose()?;
    tracing::debug!(args = args.len(), has_result = first.is_some(), "engine call returned");
    raise_return(first)
}
