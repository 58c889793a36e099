//! Trade data client contract and request/response types.
//!
//! This module defines the adapter contract (`TradeDataSource`) that the
//! pipeline depends on, along with the structured error every adapter
//! reports and the [`FetchRequest`] value object used as a cache key.
//!
//! # Operations
//!
//! | Operation | Input | Output |
//! |-----------|-------|--------|
//! | `imports_on_period` / `exports_on_period` | [`FetchRequest`] | `Vec<RawRecord>` |
//! | `product` | [`HsCode`] | description |
//! | `children_codes` | [`HsCode`] | code → description |
//! | `country_by_name` / `_code` / `_iso2` | identifier | [`Country`] |
//! | `search_for_code` | [`SearchRequest`] | matching codes |

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Country, Flow, HsCode, RawRecord, ValidationError, YearMonth};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSourceErrorKind {
    Timeout,
    RateLimited,
    Unavailable,
    NotFound,
    Malformed,
    InvalidRequest,
    Internal,
}

impl TradeSourceErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Timeout => "source.timeout",
            Self::RateLimited => "source.rate_limited",
            Self::Unavailable => "source.unavailable",
            Self::NotFound => "source.not_found",
            Self::Malformed => "source.malformed_response",
            Self::InvalidRequest => "source.invalid_request",
            Self::Internal => "source.internal",
        }
    }
}

/// Structured trade client error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeSourceError {
    kind: TradeSourceErrorKind,
    message: String,
    retryable: bool,
}

impl TradeSourceError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: TradeSourceErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: TradeSourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: TradeSourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: TradeSourceErrorKind::NotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: TradeSourceErrorKind::Malformed,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: TradeSourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: TradeSourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> TradeSourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl Display for TradeSourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for TradeSourceError {}

/// Fully determines one series retrieval. Equal requests are interchangeable,
/// which makes the type usable as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchRequest {
    pub flow: Flow,
    pub country_code: String,
    pub codes: Vec<HsCode>,
    pub start: YearMonth,
    pub end: YearMonth,
}

impl FetchRequest {
    pub fn new(
        flow: Flow,
        country: &Country,
        codes: Vec<HsCode>,
        start: YearMonth,
        end: YearMonth,
    ) -> Result<Self, ValidationError> {
        if codes.is_empty() {
            return Err(ValidationError::EmptyCodeList);
        }
        if start > end {
            return Err(ValidationError::InvertedPeriod {
                start: start.format(),
                end: end.format(),
            });
        }
        Ok(Self {
            flow,
            country_code: country.code.clone(),
            codes,
            start,
            end,
        })
    }

    /// Human-readable label used in logs and terminal errors.
    pub fn describe(&self) -> String {
        let codes = self
            .codes
            .iter()
            .map(HsCode::as_str)
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{} of [{codes}] for country {} {}..{}",
            self.flow.as_str(),
            self.country_code,
            self.start,
            self.end
        )
    }
}

/// Keyword matching mode for code search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// A description matches when it contains any keyword.
    #[default]
    Any,
    /// A description matches only when it contains every keyword.
    All,
}

impl FromStr for SearchMode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "all" => Ok(Self::All),
            other => Err(ValidationError::InvalidSearchMode {
                value: other.to_owned(),
            }),
        }
    }
}

/// Request payload for keyword search over product descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub keywords: Vec<String>,
    pub mode: SearchMode,
    pub in_codes: Vec<HsCode>,
}

impl SearchRequest {
    pub fn new(
        keywords: Vec<String>,
        mode: SearchMode,
        in_codes: Vec<HsCode>,
    ) -> Result<Self, TradeSourceError> {
        let keywords = keywords
            .into_iter()
            .map(|keyword| keyword.trim().to_ascii_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect::<Vec<_>>();
        if keywords.is_empty() {
            return Err(TradeSourceError::invalid_request(
                "search must include at least one keyword",
            ));
        }
        Ok(Self {
            keywords,
            mode,
            in_codes,
        })
    }
}

/// One code matched by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMatch {
    pub code: HsCode,
    pub description: String,
}

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TradeSourceError>> + Send + 'a>>;

/// External trade-statistics client contract.
///
/// The pipeline only ever talks to the upstream service through this trait,
/// so tests substitute scripted implementations.
///
/// Implementations must be `Send + Sync` as they may be shared across
/// sessions.
pub trait TradeDataSource: Send + Sync {
    /// Monthly export rows for one or more codes.
    fn exports_on_period<'a>(&'a self, req: &'a FetchRequest) -> SourceFuture<'a, Vec<RawRecord>>;

    /// Monthly import rows for one or more codes.
    fn imports_on_period<'a>(&'a self, req: &'a FetchRequest) -> SourceFuture<'a, Vec<RawRecord>>;

    /// Description of a code.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error when the code is not in the classification.
    fn product<'a>(&'a self, code: &'a HsCode) -> SourceFuture<'a, String>;

    /// Immediate children of a code, keyed by child code.
    fn children_codes<'a>(&'a self, code: &'a HsCode) -> SourceFuture<'a, BTreeMap<HsCode, String>>;

    fn country_by_name<'a>(&'a self, name: &'a str) -> SourceFuture<'a, Country>;

    fn country_by_code<'a>(&'a self, code: &'a str) -> SourceFuture<'a, Country>;

    fn country_by_iso2<'a>(&'a self, iso2: &'a str) -> SourceFuture<'a, Country>;

    fn search_for_code<'a>(&'a self, req: &'a SearchRequest) -> SourceFuture<'a, Vec<CodeMatch>>;

    /// Dispatches to the flow-specific period query.
    fn on_period<'a>(&'a self, req: &'a FetchRequest) -> SourceFuture<'a, Vec<RawRecord>> {
        match req.flow {
            Flow::Imports => self.imports_on_period(req),
            Flow::Exports => self.exports_on_period(req),
        }
    }
}
