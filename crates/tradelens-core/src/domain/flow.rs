use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Imports,
    Exports,
}

impl Flow {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Imports => "imports",
            Self::Exports => "exports",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Imports => "Imports",
            Self::Exports => "Exports",
        }
    }

    /// Name of the value column the trade client emits for this flow.
    pub const fn value_field(self) -> &'static str {
        match self {
            Self::Imports => "import_value",
            Self::Exports => "export_value",
        }
    }

    /// Preposition linking the product to the partner country in titles.
    pub const fn preposition(self) -> &'static str {
        match self {
            Self::Imports => "from",
            Self::Exports => "to",
        }
    }
}

impl Display for Flow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Flow {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "imports" | "import" => Ok(Self::Imports),
            "exports" | "export" => Ok(Self::Exports),
            other => Err(ValidationError::InvalidFlow {
                value: other.to_owned(),
            }),
        }
    }
}
