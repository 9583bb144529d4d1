//! Participant confidence ratings

use serde::{Deserialize, Serialize};
use crate::{Error, CONFIDENCE_LIMIT, DEFAULT_CONFIDENCE};

/// A confidence rating on a 1-based discrete scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfidenceLevel(u8);

impl ConfidenceLevel {
    /// Validate a rating against a scale of `1..=max`
    pub fn new(value: u8, max: u8) -> Result<Self, Error> {
        let max = max.min(CONFIDENCE_LIMIT);
        if (1..=max).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::ConfidenceOutOfRange { value, max })
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// At or above `threshold`; the partner model gates its first stage on this
    pub fn is_at_least(&self, threshold: u8) -> bool {
        self.0 >= threshold
    }
}

impl Default for ConfidenceLevel {
    fn default() -> Self {
        Self(DEFAULT_CONFIDENCE)
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
