mod country;
mod lookup;
mod report;
mod search;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tradelens_core::{
    CacheMode, Catalog, CensusAdapter, CensusConfig, Envelope, EnvelopeError, EnvelopeMeta,
    PipelineConfig, PipelineError, RetryConfig, Session, TradeDataSource, TradeSourceError,
};

use crate::cli::{Cli, Command};
use crate::error::{pipeline_exit_code, CliError, EXIT_FETCH, EXIT_INPUT};

/// Shared state for one CLI invocation.
pub struct Context {
    pub source: Arc<dyn TradeDataSource>,
    pub pipeline: PipelineConfig,
    pub session: Session,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let catalog = match &cli.catalog {
            Some(path) => Catalog::from_path(path)?,
            None => Catalog::bundled()?,
        };
        let census = CensusConfig::from_env().with_timeout_ms(cli.timeout_ms);
        tracing::debug!(config = ?census, "census adapter configured");

        let mut retry =
            RetryConfig::fixed(Duration::from_millis(cli.retry_interval_ms), cli.max_attempts);
        if let Some(deadline_ms) = cli.deadline_ms {
            retry = retry.with_deadline(Duration::from_millis(deadline_ms));
        }

        Ok(Self {
            source: Arc::new(CensusAdapter::new(census, catalog)),
            pipeline: PipelineConfig {
                retry,
                cache_mode: if cli.no_cache {
                    CacheMode::Bypass
                } else {
                    CacheMode::Use
                },
                ..PipelineConfig::default()
            },
            session: Session::default(),
        })
    }
}

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub cache_hit: bool,
    pub exit_code: u8,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            cache_hit: false,
            exit_code: 0,
        }
    }

    pub fn pipeline_failure(error: &PipelineError) -> Self {
        tracing::debug!(code = error.code(), %error, "command failed");
        Self {
            errors: vec![EnvelopeError::from(error)],
            exit_code: pipeline_exit_code(error),
            ..Self::ok(Value::Null)
        }
    }

    pub fn source_failure(error: &TradeSourceError) -> Self {
        let exit_code = if error.retryable() {
            EXIT_FETCH
        } else {
            EXIT_INPUT
        };
        Self {
            errors: vec![EnvelopeError {
                code: error.code().to_owned(),
                message: error.message().to_owned(),
                retryable: Some(error.retryable()),
            }],
            exit_code,
            ..Self::ok(Value::Null)
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }
}

/// Rendered envelope plus the process exit code it implies.
pub struct Outcome {
    pub envelope: Envelope<Value>,
    pub exit_code: u8,
}

pub async fn run(cli: &Cli) -> Result<Outcome, CliError> {
    let context = Context::from_cli(cli)?;
    let started = Instant::now();

    let command_result = match &cli.command {
        Command::Report(args) => report::run(args, &context).await?,
        Command::Lookup(args) => lookup::run(args, &context).await?,
        Command::Country(args) => country::run(args, &context).await?,
        Command::Search(args) => search::run(args, &context).await?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        cache_hit,
        exit_code,
    } = command_result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let meta = EnvelopeMeta::new(latency_ms, cache_hit).with_warnings(warnings);
    let envelope = Envelope::with_errors(meta, data, errors)?;

    Ok(Outcome {
        envelope,
        exit_code,
    })
}
