use tradelens_core::{lookup_code, HsCode, PipelineError};

use crate::cli::LookupArgs;
use crate::error::CliError;

use super::{CommandResult, Context};

pub async fn run(args: &LookupArgs, context: &Context) -> Result<CommandResult, CliError> {
    let code = HsCode::parse(&args.code)?;

    match lookup_code(context.source.as_ref(), &code).await {
        Ok(node) => {
            let mut result = CommandResult::ok(serde_json::to_value(&node)?);
            if node.is_leaf() {
                result = result.with_warnings(vec![format!("HS code {code} has no subcategories")]);
            }
            Ok(result)
        }
        Err(error) => Ok(CommandResult::pipeline_failure(&PipelineError::from(error))),
    }
}
