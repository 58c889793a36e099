use serde::Serialize;

use tradelens_core::{Country, CountryResolver, PipelineError};

use crate::cli::CountryArgs;
use crate::error::CliError;

use super::{CommandResult, Context};

#[derive(Debug, Serialize)]
struct CountryResponseData<'a> {
    identifier: &'a str,
    country: Country,
}

pub async fn run(args: &CountryArgs, context: &Context) -> Result<CommandResult, CliError> {
    let resolver = CountryResolver::default();
    match resolver
        .resolve(context.source.as_ref(), &args.identifier)
        .await
    {
        Ok(country) => Ok(CommandResult::ok(serde_json::to_value(CountryResponseData {
            identifier: args.identifier.trim(),
            country,
        })?)),
        Err(error) => Ok(CommandResult::pipeline_failure(&PipelineError::from(error))),
    }
}
