use std::sync::Arc;

use tradelens_core::{Flow, HsCode, PipelineInputs, TradePipeline, YearMonth};

use crate::cli::{FlowArg, ReportArgs};
use crate::error::CliError;

use super::{CommandResult, Context};

pub async fn run(args: &ReportArgs, context: &Context) -> Result<CommandResult, CliError> {
    let flow = match args.flow {
        FlowArg::Imports => Flow::Imports,
        FlowArg::Exports => Flow::Exports,
    };
    let inputs = PipelineInputs::new(
        flow,
        args.country.as_str(),
        HsCode::parse(&args.code)?,
        YearMonth::parse(&args.start)?,
        YearMonth::parse(&args.end)?,
    )?;

    let pipeline = TradePipeline::with_config(Arc::clone(&context.source), context.pipeline.clone());
    match pipeline.run(&context.session, &inputs).await {
        Ok(report) => {
            let warnings = report.notices.clone();
            let cache_hit = report.cache_hit;
            Ok(CommandResult::ok(serde_json::to_value(&report)?)
                .with_warnings(warnings)
                .with_cache_hit(cache_hit))
        }
        Err(error) => Ok(CommandResult::pipeline_failure(&error)),
    }
}
