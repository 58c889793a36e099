//! Connection settings for the Census trade API.
//!
//! API keys come from the environment only and are never logged.

pub const DEFAULT_CENSUS_BASE_URL: &str = "https://api.census.gov/data/timeseries/intltrade";
pub const DEFAULT_TIMEOUT_MS: u64 = 600_000;
pub const DEFAULT_QUOTA_PER_MINUTE: u32 = 60;
pub const DEFAULT_REFERENCE_MONTH: &str = "2023-12";

pub const API_KEY_ENV: &str = "TRADELENS_CENSUS_API_KEY";
pub const FALLBACK_API_KEY_ENV: &str = "CENSUS_API_KEY";
pub const BASE_URL_ENV: &str = "TRADELENS_CENSUS_BASE_URL";
pub const REFERENCE_MONTH_ENV: &str = "TRADELENS_CENSUS_REFERENCE_MONTH";

#[derive(Clone, PartialEq, Eq)]
pub struct CensusConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Per-request transport timeout; large multi-code queries are slow.
    pub timeout_ms: u64,
    pub quota_per_minute: u32,
    /// Published month (`YYYY-MM`) queried for code descriptions, code
    /// children and the country directory.
    pub reference_month: String,
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CENSUS_BASE_URL.to_owned(),
            api_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            quota_per_minute: DEFAULT_QUOTA_PER_MINUTE,
            reference_month: DEFAULT_REFERENCE_MONTH.to_owned(),
        }
    }
}

impl std::fmt::Debug for CensusConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CensusConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_ms", &self.timeout_ms)
            .field("quota_per_minute", &self.quota_per_minute)
            .field("reference_month", &self.reference_month)
            .finish()
    }
}

impl CensusConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let config = Self {
            api_key: non_blank(API_KEY_ENV).or_else(|| non_blank(FALLBACK_API_KEY_ENV)),
            ..Self::default()
        };
        let config = match non_blank(BASE_URL_ENV) {
            Some(base_url) => config.with_base_url(base_url),
            None => config,
        };
        match non_blank(REFERENCE_MONTH_ENV) {
            Some(month) => config.with_reference_month(month),
            None => config,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_reference_month(mut self, month: impl Into<String>) -> Self {
        self.reference_month = month.into().trim().to_owned();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}
