use crate::config::ConfigArgs;
use crate::error::ServerError;

pub fn run(args: ConfigArgs) -> Result<(), ServerError> {
    let (_, provider) = super::load_provider(&args.config)?;
    println!("{}", serde_json::to_string_pretty(&provider.functions())?);
    Ok(())
}
