use std::fmt;

use luafn_api::{ErrorKind, FunctionError};

/// Wire encoding a payload was read from or written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Msgpack,
    Json,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Msgpack => f.write_str("msgpack"),
            Format::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("dynamic value carries neither msgpack nor json data")]
    EmptyPayload,

    #[error("{format} decode{}: {detail}", at(.path))]
    Decode {
        format: Format,
        path: String,
        detail: String,
    },

    #[error("{format} encode{}: {detail}", at(.path))]
    Encode {
        format: Format,
        path: String,
        detail: String,
    },
}

fn at(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" at {path}")
    }
}

impl WireError {
    pub(crate) fn decode(format: Format, detail: impl Into<String>) -> Self {
        WireError::Decode { format, path: String::new(), detail: detail.into() }
    }

    pub(crate) fn encode(format: Format, detail: impl Into<String>) -> Self {
        WireError::Encode { format, path: String::new(), detail: detail.into() }
    }

    /// Prepend one path step (`[3]`, `.name`) as the error unwinds.
    pub(crate) fn at(self, step: impl fmt::Display) -> Self {
        match self {
            WireError::Decode { format, path, detail } => {
                WireError::Decode { format, path: format!("{step}{path}"), detail }
            }
            WireError::Encode { format, path, detail } => {
                WireError::Encode { format, path: format!("{step}{path}"), detail }
            }
            other => other,
        }
    }
}

impl From<WireError> for FunctionError {
    fn from(e: WireError) -> Self {
        let kind = match e {
            WireError::Encode { .. } => ErrorKind::Encode,
            WireError::EmptyPayload | WireError::Decode { .. } => ErrorKind::Decode,
        };
        FunctionError::new(kind, e.to_string())
    }
}
