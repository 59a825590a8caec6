use std::collections::BTreeMap;
use std::sync::Arc;

use luafn_api::{
    Attribute, Diagnostic, DynamicValue, FunctionError, FunctionSpec, Parameter, ProviderSchema, Type, Value,
};

use crate::discover::discover;
use crate::dispatch::{call_global, call_returned, check_syntax};

pub const EXEC: &str = "exec";

const INVALID_PAYLOAD: &str = "Invalid configure payload";

/// Call failure as seen by the transport.
#[derive(Debug, thiserror::Error)]
pub enum CallFailure {
    /// The function ran (or tried to) and failed; reported to the caller
    /// as a function result.
    #[error("{0}")]
    Function(FunctionError),

    #[error("unknown function {0}")]
    UnknownFunction(String),
}

impl From<FunctionError> for CallFailure {
    fn from(e: FunctionError) -> Self {
        CallFailure::Function(e)
    }
}

enum Body {
    /// Leading `code` argument holds a chunk ending in `return <function>`.
    Exec,
    /// Global function declared in the configured source.
    Global { source: Arc<str>, name: String },
}

struct Function {
    spec: FunctionSpec,
    body: Body,
}

/// Function registry backed by Lua sources.
///
/// Static functions are always present. Dynamic functions come from the
/// configured source, one per global function declaration, and replace
/// the previous set on every successful reconfiguration.
pub struct Provider {
    statics: BTreeMap<String, Function>,
    dynamics: BTreeMap<String, Function>,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("statics", &self.statics.keys().collect::<Vec<_>>())
            .field("dynamics", &self.dynamics.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider {
    pub fn new() -> Self {
        let exec = Function {
            spec: FunctionSpec::variadic_dynamic("Run a Lua chunk that returns a function, passing it the remaining arguments")
                .with_parameter(Parameter::new("code", Type::String)),
            body: Body::Exec,
        };
        Self {
            statics: BTreeMap::from([(EXEC.to_string(), exec)]),
            dynamics: BTreeMap::new(),
        }
    }

    /// Configuration schema: a single required `lua` source attribute.
    pub fn schema(&self) -> ProviderSchema {
        ProviderSchema {
            attributes: vec![Attribute {
                name: "lua".to_string(),
                ty: Type::String,
                required: true,
                description: "Lua source whose global functions are exposed".to_string(),
            }],
        }
    }

    /// Names of the functions available before configuration.
    pub fn metadata(&self) -> Vec<String> {
        self.statics.keys().cloned().collect()
    }

    /// Every callable function, sorted by name.
    pub fn functions(&self) -> BTreeMap<String, FunctionSpec> {
        self.dynamics
            .iter()
            .chain(&self.statics)
            .map(|(name, f)| (name.clone(), f.spec.clone()))
            .collect()
    }

    /// Configure from a wire payload carrying the `lua` attribute.
    pub fn configure(&mut self, config: &DynamicValue) -> Vec<Diagnostic> {
        let value = match luafn_wire::decode(config, &Type::map(Type::String)) {
            Ok(v) => v,
            Err(e) => return vec![Diagnostic::error(INVALID_PAYLOAD, e.to_string())],
        };
        let source = match &value {
            Value::Map(entries) | Value::Object(entries) => entries.get("lua").and_then(Value::as_str),
            _ => None,
        };
        match source {
            Some(source) => self.configure_source(source),
            None => vec![Diagnostic::error(INVALID_PAYLOAD, r#"attribute "lua" must be set to a string"#)],
        }
    }

    /// Configure from Lua source text.
    pub fn configure_source(&mut self, source: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if let Err(e) = check_syntax(source) {
            diagnostics.push(Diagnostic::warning("Lua source does not compile", e.to_string()));
        }

        let shared: Arc<str> = Arc::from(source);
        let names = discover(source);
        if names.is_empty() {
            diagnostics.push(Diagnostic::warning(
                "No functions declared",
                "the source declares no global functions, only static functions are available",
            ));
        }

        self.dynamics = names
            .into_iter()
            .map(|name| {
                let spec = FunctionSpec::variadic_dynamic(format!("Lua function {name}"));
                let body = Body::Global { source: Arc::clone(&shared), name: name.clone() };
                (name, Function { spec, body })
            })
            .collect();

        tracing::info!(
            functions = ?self.dynamics.keys().collect::<Vec<_>>(),
            "configured lua functions"
        );
        diagnostics
    }

    /// Call `name` with wire-encoded `args`, returning the wire-encoded result.
    pub fn call(&self, name: &str, args: &[DynamicValue]) -> Result<DynamicValue, CallFailure> {
        let function = self
            .statics
            .get(name)
            .or_else(|| self.dynamics.get(name))
            .ok_or_else(|| CallFailure::UnknownFunction(name.to_string()))?;

        tracing::debug!(function = %name, args = args.len(), "call");
        let result = run(function, args);
        if let Err(e) = &result {
            tracing::warn!(function = %name, error = ?e, "call failed");
        }
        Ok(result?)
    }
}

fn run(function: &Function, args: &[DynamicValue]) -> Result<DynamicValue, FunctionError> {
    let values = bind(&function.spec, args)?;
    let result = match &function.body {
        Body::Exec => {
            let Some((code, rest)) = values.split_first() else {
                return Err(FunctionError::argument(0, r#"missing argument "code""#));
            };
            let code = code
                .as_str()
                .ok_or_else(|| FunctionError::argument(0, r#"argument "code" must be a string"#))?;
            call_returned(code, rest)?
        }
        Body::Global { source, name } => call_global(source, name, &values)?,
    };
    Ok(luafn_wire::encode(&result, &function.spec.return_type)?)
}

/// Decode each argument under the parameter it binds to.
fn bind(spec: &FunctionSpec, args: &[DynamicValue]) -> Result<Vec<Value>, FunctionError> {
    if args.len() < spec.parameters.len() {
        return Err(FunctionError::argument(
            args.len(),
            format!("expected at least {} arguments, got {}", spec.parameters.len(), args.len()),
        ));
    }

    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            let param = spec
                .parameter_for(i)
                .ok_or_else(|| FunctionError::argument(i, format!("unexpected argument {i}")))?;
            let value = luafn_wire::decode(arg, &param.ty)
                .map_err(|e| FunctionError::from(e).with_context(&param.name).at_argument(i))?;
            if value.is_null() && !param.allow_null {
                return Err(FunctionError::argument(i, format!("argument {:?} must not be null", param.name)));
            }
            Ok(value)
        })
        .collect()
}
