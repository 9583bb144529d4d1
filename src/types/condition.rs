//! Experimental conditions and their influence schemes

use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::{
    Error, INSUSCEPTIBLE_RANGES, INSUSCEPTIBLE_WEIGHTS, SUSCEPTIBLE_RANGES, SUSCEPTIBLE_WEIGHTS,
};

/// The partner's simulated susceptibility, fixed for a block of trials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Partner tends to move strongly toward the participant
    Susceptible,
    /// Partner tends to hold its own estimate
    Insusceptible,
    /// Blend of the two, weighted by the transition lambda
    Baseline,
}

impl Condition {
    /// Block order used by a standard session
    pub const SESSION_ORDER: [Condition; 3] = [
        Condition::Susceptible,
        Condition::Baseline,
        Condition::Insusceptible,
    ];

    /// Lowercase name, as written to the results file
    pub fn name(&self) -> &'static str {
        match self {
            Condition::Susceptible => "susceptible",
            Condition::Insusceptible => "insusceptible",
            Condition::Baseline => "baseline",
        }
    }

    /// Whether revision is offered on every trial regardless of the turn flag
    pub fn always_offers_revision(&self) -> bool {
        matches!(self, Condition::Baseline)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Condition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "susceptible" => Ok(Condition::Susceptible),
            "insusceptible" => Ok(Condition::Insusceptible),
            "baseline" => Ok(Condition::Baseline),
            _ => Err(Error::UnknownCondition(s.to_string())),
        }
    }
}

/// Categorical weights over three disjoint influence bands in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfluenceScheme {
    pub weights: [f64; 3],
    pub ranges: [(f64, f64); 3],
}

impl InfluenceScheme {
    pub const SUSCEPTIBLE: InfluenceScheme = InfluenceScheme {
        weights: SUSCEPTIBLE_WEIGHTS,
        ranges: SUSCEPTIBLE_RANGES,
    };

    pub const INSUSCEPTIBLE: InfluenceScheme = InfluenceScheme {
        weights: INSUSCEPTIBLE_WEIGHTS,
        ranges: INSUSCEPTIBLE_RANGES,
    };
}
