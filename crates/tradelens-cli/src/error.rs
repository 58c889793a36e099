use thiserror::Error;

use tradelens_core::{CoreError, PipelineError};

pub const EXIT_INPUT: u8 = 2;
pub const EXIT_FETCH: u8 = 3;
pub const EXIT_NORMALIZATION: u8 = 4;
pub const EXIT_IO: u8 = 10;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] tradelens_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error("catalog error: {0}")]
    Catalog(#[from] CoreError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) => EXIT_INPUT,
            Self::Catalog(CoreError::Io { .. }) => EXIT_IO,
            Self::Catalog(_) => EXIT_INPUT,
            Self::Serialization(_) | Self::Io(_) => EXIT_IO,
        }
    }
}

/// Exit code for a run that produced an error envelope.
pub fn pipeline_exit_code(error: &PipelineError) -> u8 {
    match error {
        PipelineError::Normalization(_) => EXIT_NORMALIZATION,
        error if error.is_input_error() => EXIT_INPUT,
        _ => EXIT_FETCH,
    }
}

#[cfg(test)]
mod tests {
    use tradelens_core::{FetchError, NormalizationError, TradeSourceError, ValidationError};

    use super::*;

    #[test]
    fn pipeline_failures_map_to_distinct_codes() {
        let input = PipelineError::from(ValidationError::EmptyCountry);
        let fetch = PipelineError::from(FetchError::new(
            "Exports request",
            5,
            TradeSourceError::unavailable("503"),
        ));
        let shape = PipelineError::from(NormalizationError::MissingDate { index: 3 });

        assert_eq!(pipeline_exit_code(&input), EXIT_INPUT);
        assert_eq!(pipeline_exit_code(&fetch), EXIT_FETCH);
        assert_eq!(pipeline_exit_code(&shape), EXIT_NORMALIZATION);
    }

    #[test]
    fn missing_catalog_file_is_an_io_failure() {
        let error = CliError::Catalog(CoreError::Io {
            path: String::from("catalog.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        assert_eq!(error.exit_code(), EXIT_IO);
    }
}
