//! First or last name of a user

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

use super::ValueError;

/// Column width of `users.name` / `users.surname`
pub const PERSON_NAME_MAX_LENGTH: usize = 255;

/// NFKC-normalized, trimmed, non-blank name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonName(String);

impl PersonName {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValueError> {
        let normalized: String = raw.as_ref().nfkc().collect();
        let trimmed = normalized.trim();

        if trimmed.is_empty() {
            return Err(ValueError::Blank);
        }
        if trimmed.chars().count() > PERSON_NAME_MAX_LENGTH {
            return Err(ValueError::TooLong {
                max: PERSON_NAME_MAX_LENGTH,
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
