use luafn_api::{ErrorKind, FunctionError, Type};
use luafn_wire::WireError;

const MISSING_FUNCTION: &str = r#"missing or invalid "return <function>" at end of input"#;

#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("unsupported parameter type {ty}")]
    UnsupportedType { ty: Type },

    #[error("bad table index: {key_type} keys are not supported")]
    BadTableIndex { key_type: &'static str },

    #[error("unhandled return type {type_name}")]
    UnhandledReturnType { type_name: &'static str },

    #[error("unhandled return type: table contains itself")]
    RecursiveTable,

    #[error("none value should not be returned")]
    MissingReturnValue,

    #[error("{0}")]
    NotAFunction(String),

    /// Engine text, verbatim.
    #[error("{0}")]
    Engine(String),

    #[error(transparent)]
    Wire(#[from] WireError),
}

impl CallError {
    /// No callable entry point: the chunk did not end with
    /// `return <function>`, or the named global is absent or not callable.
    pub fn missing_function() -> Self {
        CallError::NotAFunction(MISSING_FUNCTION.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CallError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            CallError::BadTableIndex { .. } => ErrorKind::BadTableIndex,
            CallError::UnhandledReturnType { .. } | CallError::RecursiveTable => ErrorKind::UnhandledReturnType,
            CallError::MissingReturnValue => ErrorKind::MissingReturnValue,
            CallError::NotAFunction(_) => ErrorKind::NotAFunction,
            CallError::Engine(_) => ErrorKind::Engine,
            CallError::Wire(WireError::Encode { .. }) => ErrorKind::Encode,
            CallError::Wire(_) => ErrorKind::Decode,
        }
    }
}

impl From<mlua::Error> for CallError {
    fn from(e: mlua::Error) -> Self {
        CallError::Engine(e.to_string())
    }
}

impl From<CallError> for FunctionError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Wire(wire) => wire.into(),
            other => FunctionError::new(other.kind(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_survive_conversion() {
        let fe: FunctionError = CallError::MissingReturnValue.into();
        assert_eq!(fe.kind(), ErrorKind::MissingReturnValue);
        assert_eq!(fe.text(), "none value should not be returned");

        let fe: FunctionError = CallError::RecursiveTable.into();
        assert_eq!(fe.kind(), ErrorKind::UnhandledReturnType);
    }

    #[test]
    fn not_a_function_text() {
        let fe: FunctionError = CallError::missing_function().into();
        assert_eq!(fe.kind(), ErrorKind::NotAFunction);
        assert_eq!(fe.text(), r#"missing or invalid "return <function>" at end of input"#);
    }

    #[test]
    fn unsupported_type_names_the_type() {
        let e = CallError::UnsupportedType { ty: Type::list(Type::Number) };
        assert_eq!(e.to_string(), "unsupported parameter type list of number");
    }
}
