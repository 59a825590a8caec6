use std::fmt;

use serde::Serialize;

/// Category of a failed function call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed wire payload.
    Decode,
    /// Typed value not representable on the wire.
    Encode,
    /// Argument count or type does not match the function signature.
    Argument,
    /// Typed value has no engine representation.
    UnsupportedType,
    /// Engine table key is neither a string nor a number.
    BadTableIndex,
    /// Engine value shape has no typed representation.
    UnhandledReturnType,
    /// The call produced no result.
    MissingReturnValue,
    /// The target global is not callable.
    NotAFunction,
    /// Script failed to load or raised while running.
    Engine,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Decode => "decode",
            ErrorKind::Encode => "encode",
            ErrorKind::Argument => "argument",
            ErrorKind::UnsupportedType => "unsupported_type",
            ErrorKind::BadTableIndex => "bad_table_index",
            ErrorKind::UnhandledReturnType => "unhandled_return_type",
            ErrorKind::MissingReturnValue => "missing_return_value",
            ErrorKind::NotAFunction => "not_a_function",
            ErrorKind::Engine => "engine",
        })
    }
}

/// User-facing function error.
///
/// Every failure inside a call ends up here and is reported to the caller
/// as function-level text, never as a transport fault.
#[derive(Clone, PartialEq, Eq)]
pub struct FunctionError {
    kind: ErrorKind,
    text: String,
    /// Position of the offending argument, if the error concerns one.
    argument: Option<usize>,
}

impl FunctionError {
    pub fn new(kind: ErrorKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into(), argument: None }
    }

    pub fn argument(index: usize, text: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Argument, text: text.into(), argument: Some(index) }
    }

    /// Attach the argument position, keeping kind and text.
    pub fn at_argument(mut self, index: usize) -> Self {
        self.argument = Some(index);
        self
    }

    /// Add context to the error, keeping its kind.
    ///
    /// Produces: `"context: text"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            text: format!("{ctx}: {}", self.text),
            argument: self.argument,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn argument_index(&self) -> Option<usize> {
        self.argument
    }
}

impl fmt::Debug for FunctionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.argument {
            Some(i) => write!(f, "[{}] argument {i}: {}", self.kind, self.text),
            None => write!(f, "[{}] {}", self.kind, self.text),
        }
    }
}

impl fmt::Display for FunctionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl std::error::Error for FunctionError {}

impl Serialize for FunctionError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("FunctionError", 3)?;
        s.serialize_field("kind", &self.kind)?;
        s.serialize_field("text", &self.text)?;
        s.serialize_field("argument", &self.argument)?;
        s.end()
    }
}
