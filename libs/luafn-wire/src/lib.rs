//! Wire codecs for dynamic protocol values.
//!
//! Two encodings are supported, both able to carry a type-erased
//! (`Type::Dynamic`) root:
//! - MessagePack: `[type_json_bytes, value]` per dynamic position
//! - JSON: `{"value": ..., "type": ...}` per dynamic position
//!
//! Decoding prefers the binary form; encoding always produces it.

pub mod error;
pub mod json;
pub mod msgpack;

use luafn_api::{DynamicValue, Type, Value};

pub use error::{Format, WireError};

/// Decode a wire payload under `ty`.
///
/// Uses the binary form when present, the text form otherwise.
pub fn decode(payload: &DynamicValue, ty: &Type) -> Result<Value, WireError> {
    if !payload.msgpack.is_empty() {
        return msgpack::decode(&payload.msgpack, ty);
    }
    if !payload.json.is_empty() {
        return json::decode(&payload.json, ty);
    }
    Err(WireError::EmptyPayload)
}

/// Encode `value` under `ty` in the binary form.
pub fn encode(value: &Value, ty: &Type) -> Result<DynamicValue, WireError> {
    msgpack::encode(value, ty).map(DynamicValue::msgpack)
}
