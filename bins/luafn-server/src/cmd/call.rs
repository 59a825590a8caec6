use crate::config::CallArgs;
use crate::error::ServerError;

pub fn run(args: CallArgs) -> Result<(), ServerError> {
    let (_, provider) = super::load_provider(&args.config.config)?;
    let arguments = super::parse_args(&args.args)?;

    tracing::debug!(function = %args.name, args = arguments.len(), "calling");
    let result = provider.call(&args.name, &arguments)?;
    super::print_result(&result)
}
