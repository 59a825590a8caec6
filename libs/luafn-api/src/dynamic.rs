use base64::Engine;
use serde::{Deserialize, Serialize};

/// Wire payload of one dynamic value.
///
/// Exactly one of the two encodings is expected to be populated:
/// - `msgpack`: compact self-describing binary form (preferred)
/// - `json`: text form, used only when `msgpack` is empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicValue {
    pub msgpack: Vec<u8>,
    pub json: Vec<u8>,
}

impl DynamicValue {
    pub fn msgpack(bytes: Vec<u8>) -> Self {
        Self { msgpack: bytes, json: Vec::new() }
    }

    pub fn json(bytes: Vec<u8>) -> Self {
        Self { msgpack: Vec::new(), json: bytes }
    }

    pub fn is_empty(&self) -> bool {
        self.msgpack.is_empty() && self.json.is_empty()
    }
}

impl Serialize for DynamicValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut s = serializer.serialize_map(Some(1))?;
        if !self.msgpack.is_empty() {
            // Base64 for the binary form
            let encoded = base64::engine::general_purpose::STANDARD.encode(&self.msgpack);
            s.serialize_entry("msgpack", &encoded)?;
        } else if !self.json.is_empty() {
            // Inline JSON for readability
            let value: serde_json::Value =
                serde_json::from_slice(&self.json).map_err(serde::ser::Error::custom)?;
            s.serialize_entry("json", &value)?;
        }
        s.end()
    }
}

impl<'de> Deserialize<'de> for DynamicValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Accepted shapes:
        // 1. {"msgpack": "base64..."}
        // 2. {"json": <inline json>}
        let raw = serde_json::Value::deserialize(deserializer)?;
        let serde_json::Value::Object(map) = raw else {
            return Err(serde::de::Error::custom("expected an object with a msgpack or json field"));
        };

        let msgpack = match map.get("msgpack") {
            Some(serde_json::Value::String(b64)) => base64::engine::general_purpose::STANDARD
                .decode(b64)
                .map_err(serde::de::Error::custom)?,
            Some(serde_json::Value::Null) | None => Vec::new(),
            Some(_) => return Err(serde::de::Error::custom("expected base64 string for msgpack")),
        };
        let json = match map.get("json") {
            Some(serde_json::Value::Null) | None => Vec::new(),
            Some(inline) => serde_json::to_vec(inline).map_err(serde::de::Error::custom)?,
        };

        Ok(DynamicValue { msgpack, json })
    }
}
