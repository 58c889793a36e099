//! Country and product resolution.
//!
//! The trade client exposes three independent country lookups. A
//! [`CountryResolver`] tries them in a fixed order and stops at the first
//! success; when every strategy misses, the pipeline must not fetch.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data_source::{SourceFuture, TradeDataSource, TradeSourceError, TradeSourceErrorKind};
use crate::{Country, HsCode, ValidationError};

/// Input could not be mapped to a known country or product.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("country '{identifier}' could not be resolved (tried {})", tried_list(tried))]
    Country {
        identifier: String,
        tried: Vec<CountryLookup>,
    },
    #[error("HS code {code} could not be resolved: {source}")]
    Product {
        code: HsCode,
        #[source]
        source: TradeSourceError,
    },
    /// The lookup service itself failed; says nothing about the input.
    #[error("{subject} lookup failed: {source}")]
    Lookup {
        subject: String,
        #[source]
        source: TradeSourceError,
    },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl ResolutionError {
    /// Classifies a product lookup failure: a miss is an input problem,
    /// anything else is a service problem.
    pub fn product(code: &HsCode, source: TradeSourceError) -> Self {
        if is_miss(&source) {
            Self::Product {
                code: code.clone(),
                source,
            }
        } else {
            Self::Lookup {
                subject: format!("HS code {code}"),
                source,
            }
        }
    }

    /// `true` when the user supplied something that does not exist.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::Lookup { .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Country { .. } => "resolution.country",
            Self::Product { .. } => "resolution.product",
            Self::Lookup { source, .. } => source.code(),
            Self::Invalid(_) => "resolution.invalid_input",
        }
    }
}

fn is_miss(error: &TradeSourceError) -> bool {
    matches!(
        error.kind(),
        TradeSourceErrorKind::NotFound | TradeSourceErrorKind::InvalidRequest
    )
}

fn tried_list(tried: &[CountryLookup]) -> String {
    tried
        .iter()
        .map(|lookup| lookup.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One way of interpreting a country identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountryLookup {
    Name,
    Code,
    Iso2,
}

impl CountryLookup {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Code => "code",
            Self::Iso2 => "iso2",
        }
    }

    pub fn lookup<'a>(
        self,
        source: &'a dyn TradeDataSource,
        identifier: &'a str,
    ) -> SourceFuture<'a, Country> {
        match self {
            Self::Name => source.country_by_name(identifier),
            Self::Code => source.country_by_code(identifier),
            Self::Iso2 => source.country_by_iso2(identifier),
        }
    }
}

impl Display for CountryLookup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered list of country lookup strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryResolver {
    strategies: Vec<CountryLookup>,
}

impl Default for CountryResolver {
    fn default() -> Self {
        Self::new(vec![CountryLookup::Name, CountryLookup::Code, CountryLookup::Iso2])
    }
}

impl CountryResolver {
    pub fn new(strategies: Vec<CountryLookup>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[CountryLookup] {
        &self.strategies
    }

    /// Returns the first country any strategy finds.
    ///
    /// # Errors
    ///
    /// [`ResolutionError::Country`] when every strategy misses, or
    /// [`ResolutionError::Lookup`] as soon as one fails for a reason other
    /// than a miss.
    pub async fn resolve(
        &self,
        source: &dyn TradeDataSource,
        identifier: &str,
    ) -> Result<Country, ResolutionError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ValidationError::EmptyCountry.into());
        }

        let mut tried = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            tried.push(*strategy);
            match strategy.lookup(source, identifier).await {
                Ok(country) => {
                    tracing::debug!(identifier, strategy = %strategy, country = %country.name, "country resolved");
                    return Ok(country);
                }
                Err(error) if is_miss(&error) => {
                    tracing::debug!(identifier, strategy = %strategy, "country lookup missed");
                }
                Err(error) => {
                    return Err(ResolutionError::Lookup {
                        subject: format!("country '{identifier}'"),
                        source: error,
                    });
                }
            }
        }

        Err(ResolutionError::Country {
            identifier: identifier.to_owned(),
            tried,
        })
    }
}
