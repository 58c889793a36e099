use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MIN_CODE_LEN: usize = 2;
const MAX_CODE_LEN: usize = 10;

/// Codes at or beyond this length are subheadings and never carry children.
pub const TERMINAL_CODE_LEN: usize = 6;

/// Harmonized System classification code. Leading zeros are significant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HsCode(String);

impl HsCode {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyCode);
        }

        if !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(ValidationError::CodeNotNumeric {
                value: trimmed.to_owned(),
            });
        }

        let len = trimmed.len();
        if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&len) || len % 2 != 0 {
            return Err(ValidationError::CodeInvalidLength {
                value: trimmed.to_owned(),
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Subheading-level codes (six digits or more) are treated as leaves.
    pub fn is_terminal(&self) -> bool {
        self.len() >= TERMINAL_CODE_LEN
    }

    /// Enclosing code one level up, or `None` for a chapter.
    pub fn parent(&self) -> Option<Self> {
        if self.len() <= MIN_CODE_LEN {
            return None;
        }
        Some(Self(self.0[..self.len() - 2].to_owned()))
    }

    /// True when `self` is `other` or sits somewhere below it.
    pub fn starts_with(&self, other: &HsCode) -> bool {
        self.0.starts_with(other.as_str())
    }
}

impl Display for HsCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for HsCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for HsCode {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<HsCode> for String {
    fn from(value: HsCode) -> Self {
        value.0
    }
}
