pub mod call;
pub mod exec;
pub mod functions;
pub mod serve;

use std::collections::BTreeMap;

use luafn_api::{DynamicValue, Type, Value};
use luafn_engine::Provider;

use crate::config::ServerConfig;
use crate::error::ServerError;

/// Load the config file and configure a provider from its Lua source.
///
/// Warnings are logged; the first error diagnostic aborts.
pub(crate) fn load_provider(path: &str) -> Result<(ServerConfig, Provider), ServerError> {
    let config = ServerConfig::load(path)?;
    tracing::info!(config = %path, "loaded config");

    let mut attributes = BTreeMap::new();
    attributes.insert("lua".to_string(), Value::String(config.source()?));
    let payload = luafn_wire::encode(&Value::Map(attributes), &Type::map(Type::String))?;

    let mut provider = Provider::new();
    for diag in provider.configure(&payload) {
        if diag.is_error() {
            return Err(ServerError::Configure { summary: diag.summary, detail: diag.detail });
        }
        tracing::warn!(summary = %diag.summary, detail = %diag.detail, "configuration warning");
    }
    Ok((config, provider))
}

/// Plain JSON documents → wire arguments.
pub(crate) fn parse_args(raw: &[String]) -> Result<Vec<DynamicValue>, ServerError> {
    raw.iter()
        .enumerate()
        .map(|(index, text)| {
            let json: serde_json::Value = serde_json::from_str(text)
                .map_err(|e| ServerError::Argument { index, detail: e.to_string() })?;
            Ok(luafn_wire::encode(&Value::from_json(&json), &Type::Dynamic)?)
        })
        .collect()
}

/// Wire result → pretty plain JSON on stdout.
pub(crate) fn print_result(result: &DynamicValue) -> Result<(), ServerError> {
    let value = luafn_wire::decode(result, &Type::Dynamic)?;
    println!("{}", serde_json::to_string_pretty(&value.to_json())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_parse_as_plain_json() {
        let args = parse_args(&["1".to_string(), r#"{"a": [true]}"#.to_string()]).unwrap();
        assert_eq!(luafn_wire::decode(&args[0], &Type::Dynamic).unwrap(), Value::Number(1.0));
        assert_eq!(
            luafn_wire::decode(&args[1], &Type::Dynamic).unwrap(),
            Value::object([("a", Value::Tuple(vec![Value::Bool(true)]))])
        );
    }

    #[test]
    fn malformed_argument_names_its_position() {
        let err = parse_args(&["1".to_string(), "{".to_string()]).unwrap_err();
        assert!(matches!(err, ServerError::Argument { index: 1, .. }));
    }
}
