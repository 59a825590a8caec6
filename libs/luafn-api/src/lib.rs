pub mod dynamic;
pub mod error;
pub mod function;
pub mod types;
pub mod value;

pub use dynamic::DynamicValue;
pub use error::{ErrorKind, FunctionError};
pub use function::{Attribute, Diagnostic, FunctionSpec, Parameter, ProviderSchema, Severity};
pub use types::Type;
pub use value::Value;
