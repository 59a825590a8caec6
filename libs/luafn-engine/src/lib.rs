//! Lua function engine.
//!
//! Converts typed protocol values into Lua values and back, and runs Lua
//! functions on a fresh interpreter per call.

pub mod adapter;
pub mod discover;
pub mod dispatch;
pub mod error;
pub mod lower;
pub mod provider;
pub mod raise;
pub mod table;

pub use error::CallError;
pub use provider::{CallFailure, Provider};
pub use table::{LuaValue, Table, TableKey};
