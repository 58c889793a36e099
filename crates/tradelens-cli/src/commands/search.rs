use serde::Serialize;

use tradelens_core::{CodeMatch, HsCode, SearchMode, SearchRequest};

use crate::cli::{SearchArgs, SearchModeArg};
use crate::error::CliError;

use super::{CommandResult, Context};

#[derive(Debug, Serialize)]
struct SearchResponseData {
    keywords: Vec<String>,
    mode: SearchMode,
    results: Vec<CodeMatch>,
}

pub async fn run(args: &SearchArgs, context: &Context) -> Result<CommandResult, CliError> {
    let mode = match args.mode {
        SearchModeArg::Any => SearchMode::Any,
        SearchModeArg::All => SearchMode::All,
    };
    let in_codes = args
        .in_codes
        .iter()
        .map(|code| HsCode::parse(code))
        .collect::<Result<Vec<_>, _>>()?;

    let request = SearchRequest::new(args.keywords.clone(), mode, in_codes)
        .map_err(|error| CliError::Command(error.message().to_owned()))?;

    match context.source.search_for_code(&request).await {
        Ok(results) => {
            let warnings = if results.is_empty() {
                vec![String::from("no HS code description matched the keywords")]
            } else {
                Vec::new()
            };
            let data = serde_json::to_value(SearchResponseData {
                keywords: request.keywords.clone(),
                mode,
                results,
            })?;
            Ok(CommandResult::ok(data).with_warnings(warnings))
        }
        Err(error) => Ok(CommandResult::source_failure(&error)),
    }
}
