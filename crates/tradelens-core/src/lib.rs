//! # Tradelens Core
//!
//! Retrieval and transformation pipeline for U.S. international trade
//! statistics, organised by trading partner and Harmonized System code.
//!
//! ## Overview
//!
//! - **Domain types** for HS codes, flows, months, series and summaries
//! - **Trade client contract** plus a Census Bureau adapter
//! - **Resilient fetching** with fixed-delay retry and a per-session cache
//! - **Normalization and analytics**: canonical series, year-over-year growth,
//!   display-window filtering and child-code breakdowns
//! - **Response envelope** for machine-readable output
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Census adapter and HS/country catalog |
//! | [`analytics`] | YoY growth and window filter |
//! | [`cache`] | Fetch cache and cache modes |
//! | [`config`] | Census connection settings |
//! | [`data_source`] | Trade client trait and request/error types |
//! | [`domain`] | Domain models |
//! | [`envelope`] | Response envelope with metadata |
//! | [`error`] | Core error types |
//! | [`hierarchy`] | Child-code resolution and code lookup |
//! | [`http_client`] | HTTP client abstraction |
//! | [`normalize`] | Raw rows → canonical series |
//! | [`pipeline`] | End-to-end report pipeline |
//! | [`resolution`] | Country resolution chain |
//! | [`retry`] | Bounded fixed-delay retry |
//! | [`session`] | Per-session state |
//! | [`summary`] | Category breakdown |
//! | [`throttling`] | Client-side rate limiting |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tradelens_core::{
//!     Catalog, CensusAdapter, CensusConfig, Flow, HsCode, PipelineInputs, Session,
//!     TradePipeline, YearMonth,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = CensusAdapter::new(CensusConfig::from_env(), Catalog::bundled()?);
//!     let pipeline = TradePipeline::new(Arc::new(adapter));
//!     let session = Session::default();
//!
//!     let inputs = PipelineInputs::new(
//!         Flow::Imports,
//!         "Mexico",
//!         HsCode::parse("08")?,
//!         YearMonth::parse("2021-01")?,
//!         YearMonth::parse("2022-01")?,
//!     )?;
//!     let report = pipeline.run(&session, &inputs).await?;
//!     println!("{}: {} months", report.title, report.series.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! inputs ──▶ product / country resolution ──▶ child codes
//!                                               │
//!              ┌────────────────────────────────┘
//!              ▼
//!   Session (cache, notices) ──▶ fetch_with_retry ──▶ TradeDataSource
//!              │                                      (CensusAdapter)
//!              ▼
//!   normalize ──▶ yoy_growth / filter_from ──▶ summarize ──▶ TradeReport
//! ```
//!
//! ## Error Handling
//!
//! Pipeline failures are [`PipelineError`]s. [`PipelineError::is_input_error`]
//! tells a wrong input apart from an unavailable service:
//!
//! ```rust
//! use tradelens_core::{PipelineError, ValidationError};
//!
//! let error = PipelineError::from(ValidationError::EmptyCountry);
//! assert!(error.is_input_error());
//! ```
//!
//! ## Security
//!
//! - API keys are read from environment variables only (never logged)
//! - All HTTP requests use TLS via rustls

pub mod adapters;
pub mod analytics;
pub mod cache;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod hierarchy;
pub mod http_client;
pub mod normalize;
pub mod pipeline;
pub mod resolution;
pub mod retry;
pub mod session;
pub mod summary;
pub mod throttling;

// Adapter implementations
pub use adapters::{Catalog, CensusAdapter};

// Analytics
pub use analytics::{filter_from, yoy_growth};

// Caching
pub use cache::{CacheMode, FetchCache};

// Configuration
pub use config::CensusConfig;

// Trade client trait and types
pub use data_source::{
    CodeMatch, FetchRequest, SearchMode, SearchRequest, SourceFuture, TradeDataSource,
    TradeSourceError, TradeSourceErrorKind,
};

// Domain models
pub use domain::{
    CategorySummary, CategoryTotal, CodeNode, Country, Flow, HsCode, RawRecord, TimeSeries,
    TradeRecord, YearMonth, TERMINAL_CODE_LEN,
};

// Envelope types
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};

// Error types
pub use error::{CoreError, ValidationError};

// Hierarchy
pub use hierarchy::{lookup_code, resolve_children};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Normalization
pub use normalize::{normalize, normalize_records, NormalizationError};

// Pipeline
pub use pipeline::{PipelineConfig, PipelineError, PipelineInputs, TradePipeline, TradeReport};

// Resolution
pub use resolution::{CountryLookup, CountryResolver, ResolutionError};

// Retry logic
pub use retry::{fetch_with_retry, FetchError, RetryConfig};

// Session state
pub use session::{Fetched, LogNotifier, Notifier, Session};

// Summary
pub use summary::summarize;

// Throttling
pub use throttling::Throttle;
