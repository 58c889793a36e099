//! End-to-end trade report pipeline.
//!
//! One run resolves the inputs, fetches the primary series (widened one year
//! back so year-over-year growth exists at the first displayed month) and
//! the child-code series, then derives everything the presentation layer
//! shows. Steps run strictly in sequence; nothing is fetched once resolution
//! fails.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;

use crate::analytics::{filter_from, yoy_growth};
use crate::cache::CacheMode;
use crate::data_source::{FetchRequest, TradeDataSource};
use crate::hierarchy::resolve_children;
use crate::normalize::{normalize, normalize_records, NormalizationError};
use crate::resolution::{CountryResolver, ResolutionError};
use crate::retry::{FetchError, RetryConfig};
use crate::session::Session;
use crate::summary::summarize;
use crate::{CategoryTotal, Country, Flow, HsCode, TimeSeries, ValidationError, YearMonth};

pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;
pub const NO_SUBCATEGORIES_NOTICE: &str = "This code has no subcategories";
pub const NO_SUBCATEGORY_DATA_NOTICE: &str = "No trade was recorded for the subcategories of this code in the selected period";
pub const NO_SERIES_DATA_NOTICE: &str = "No trade was recorded for this selection in the selected period";

/// User selection driving one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineInputs {
    pub flow: Flow,
    /// Country name, Census code or ISO2 code.
    pub country: String,
    pub code: HsCode,
    pub start: YearMonth,
    pub end: YearMonth,
}

impl PipelineInputs {
    pub fn new(
        flow: Flow,
        country: impl Into<String>,
        code: HsCode,
        start: YearMonth,
        end: YearMonth,
    ) -> Result<Self, ValidationError> {
        let country = country.into().trim().to_owned();
        if country.is_empty() {
            return Err(ValidationError::EmptyCountry);
        }
        if start > end {
            return Err(ValidationError::InvertedPeriod {
                start: start.format(),
                end: end.format(),
            });
        }
        Ok(Self {
            flow,
            country,
            code,
            start,
            end,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub retry: RetryConfig,
    /// Days subtracted from the display start for the primary fetch.
    pub lookback_days: i64,
    pub cache_mode: CacheMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            cache_mode: CacheMode::default(),
        }
    }
}

/// Everything one run hands to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeReport {
    pub title: String,
    pub flow: Flow,
    pub country: Country,
    pub code: HsCode,
    pub description: String,
    /// Primary series restricted to the display window.
    pub series: TimeSeries,
    /// Year-over-year growth (percent) within the display window.
    pub yoy: TimeSeries,
    /// Child-code totals, largest first. `None` when there is nothing to break down.
    pub breakdown: Option<Vec<CategoryTotal>>,
    pub children: BTreeMap<HsCode, String>,
    pub requests: Vec<FetchRequest>,
    /// `true` when every fetch was served from the session cache.
    pub cache_hit: bool,
    pub notices: Vec<String>,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("fetched data is malformed: {0}")]
    Normalization(#[from] NormalizationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PipelineError {
    /// Distinguishes "input was wrong" from "service or data was at fault".
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::Resolution(error) => error.is_input_error(),
            Self::Validation(_) => true,
            Self::Fetch(_) | Self::Normalization(_) => false,
        }
    }

    pub fn retryable(&self) -> bool {
        match self {
            Self::Fetch(error) => error.last_error().retryable(),
            Self::Resolution(ResolutionError::Lookup { source, .. }) => source.retryable(),
            _ => false,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Resolution(error) => error.code(),
            Self::Fetch(error) => error.last_error().code(),
            Self::Normalization(_) => "normalization.malformed_data",
            Self::Validation(_) => "input.invalid",
        }
    }
}

pub struct TradePipeline {
    source: Arc<dyn TradeDataSource>,
    config: PipelineConfig,
    resolver: CountryResolver,
}

impl TradePipeline {
    pub fn new(source: Arc<dyn TradeDataSource>) -> Self {
        Self::with_config(source, PipelineConfig::default())
    }

    pub fn with_config(source: Arc<dyn TradeDataSource>, config: PipelineConfig) -> Self {
        Self {
            source,
            config,
            resolver: CountryResolver::default(),
        }
    }

    pub async fn run(
        &self,
        session: &Session,
        inputs: &PipelineInputs,
    ) -> Result<TradeReport, PipelineError> {
        let span = tracing::info_span!(
            "pipeline",
            flow = inputs.flow.as_str(),
            country = %inputs.country,
            code = %inputs.code,
        );
        self.run_inner(session, inputs).instrument(span).await
    }

    async fn run_inner(
        &self,
        session: &Session,
        inputs: &PipelineInputs,
    ) -> Result<TradeReport, PipelineError> {
        session.begin_run(inputs).await;
        let source = self.source.as_ref();
        let flow = inputs.flow;

        let description = source
            .product(&inputs.code)
            .await
            .map_err(|error| ResolutionError::product(&inputs.code, error))?;
        let country = self.resolver.resolve(source, &inputs.country).await?;
        let children = resolve_children(source, &inputs.code)
            .await
            .map_err(|error| ResolutionError::product(&inputs.code, error))?;

        let primary_request = FetchRequest::new(
            flow,
            &country,
            vec![inputs.code.clone()],
            inputs.start.lookback_days(self.config.lookback_days),
            inputs.end,
        )?;
        let primary = session
            .fetch_records(source, &self.config.retry, self.config.cache_mode, &primary_request)
            .await?;

        let child_request = if children.is_empty() {
            None
        } else {
            Some(FetchRequest::new(
                flow,
                &country,
                children.keys().cloned().collect(),
                inputs.start,
                inputs.end,
            )?)
        };
        let child = match &child_request {
            Some(request) => Some(
                session
                    .fetch_records(source, &self.config.retry, self.config.cache_mode, request)
                    .await?,
            ),
            None => None,
        };

        let full_series = normalize(&primary.records, flow)?;
        let yoy = filter_from(&yoy_growth(&full_series), inputs.start);
        let series = filter_from(&full_series, inputs.start);

        let mut notices = Vec::new();
        if series.is_empty() {
            notices.push(NO_SERIES_DATA_NOTICE.to_owned());
        }

        let breakdown = match &child {
            None => {
                notices.push(NO_SUBCATEGORIES_NOTICE.to_owned());
                None
            }
            Some(fetched) => {
                let summary = summarize(&normalize_records(&fetched.records, flow)?);
                if summary.is_empty() {
                    notices.push(NO_SUBCATEGORY_DATA_NOTICE.to_owned());
                    None
                } else {
                    Some(summary.sorted_desc())
                }
            }
        };

        let cache_hit = primary.cache_hit && child.as_ref().map_or(true, |fetched| fetched.cache_hit);
        let mut requests = vec![primary_request];
        requests.extend(child_request);

        let mut all_notices = session.take_notices();
        all_notices.extend(notices);

        tracing::info!(
            points = series.len(),
            yoy_points = yoy.len(),
            children = children.len(),
            cache_hit,
            "pipeline run complete"
        );

        Ok(TradeReport {
            title: format!(
                "{} of '{}' {} {}",
                flow.label(),
                description,
                flow.preposition(),
                country.name
            ),
            flow,
            country,
            code: inputs.code.clone(),
            description,
            series,
            yoy,
            breakdown,
            children,
            requests,
            cache_hit,
            notices: all_notices,
        })
    }
}
