use thiserror::Error;

/// Validation and contract errors exposed by `tradelens-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("HS code cannot be empty")]
    EmptyCode,
    #[error("HS code '{value}' must contain only ASCII digits")]
    CodeNotNumeric { value: String },
    #[error("HS code '{value}' must have an even length between 2 and 10 digits")]
    CodeInvalidLength { value: String },

    #[error("invalid flow '{value}', expected one of imports, exports")]
    InvalidFlow { value: String },

    #[error("invalid search mode '{value}', expected one of any, all")]
    InvalidSearchMode { value: String },

    #[error("invalid cache mode '{value}', expected one of use, refresh, bypass")]
    InvalidCacheMode { value: String },

    #[error("date must be YYYY-MM or YYYY-MM-DD: '{value}'")]
    InvalidMonth { value: String },
    #[error("start month {start} is after end month {end}")]
    InvertedPeriod { start: String, end: String },

    #[error("country identifier cannot be empty")]
    EmptyCountry,
    #[error("fetch request must include at least one code")]
    EmptyCodeList,

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Top-level error type for core operations that touch serialized data.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
