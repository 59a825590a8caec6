use luafn_api::{Type, Value};
use luafn_engine::Provider;
use luafn_engine::provider::EXEC;

use crate::config::ExecArgs;
use crate::error::ServerError;

pub fn run(args: ExecArgs) -> Result<(), ServerError> {
    let code = std::fs::read_to_string(&args.file)?;

    let mut arguments = vec![luafn_wire::encode(&Value::String(code), &Type::String)?];
    arguments.extend(super::parse_args(&args.args)?);

    tracing::debug!(file = %args.file.display(), args = args.args.len(), "exec");
    let result = Provider::new().call(EXEC, &arguments)?;
    super::print_result(&result)
}
