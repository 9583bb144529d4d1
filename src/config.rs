//! Session configuration
//!
//! Defaults come from the crate constants. A JSON file may override any
//! subset of fields; CLI flags override the file.

use std::path::Path;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use crate::core::PartnerModel;
use crate::types::{Circle, Condition};
use crate::{
    Error, Result, CONFIDENCE_LIMIT, CONFIDENCE_SCALE_MAX, DEFAULT_OUTPUT_PATH, DISTRACTOR_COUNT,
    HIGH_CONFIDENCE_SPREAD_DEG, HIGH_CONFIDENCE_THRESHOLD, KAPPA, TRIALS_PER_CONDITION,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Response circle in display coordinates
    pub circle: Circle,
    pub trials_per_condition: u32,
    /// Block order; each block runs `trials_per_condition` trials
    pub conditions: Vec<Condition>,
    /// Baseline blend weight toward the insusceptible scheme, in [0, 1]
    pub transition_lambda: f64,
    /// Top of the confidence scale offered to the participant
    pub confidence_max: u8,
    pub distractor_count: u32,
    pub kappa: f64,
    pub high_confidence_threshold: u8,
    pub spread_deg: f64,
    /// Fixed RNG seed; random when absent
    pub seed: Option<u64>,
    pub output_path: String,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            circle: Circle::default(),
            trials_per_condition: TRIALS_PER_CONDITION,
            conditions: Condition::SESSION_ORDER.to_vec(),
            transition_lambda: 0.0,
            confidence_max: CONFIDENCE_SCALE_MAX,
            distractor_count: DISTRACTOR_COUNT,
            kappa: KAPPA,
            high_confidence_threshold: HIGH_CONFIDENCE_THRESHOLD,
            spread_deg: HIGH_CONFIDENCE_SPREAD_DEG,
            seed: None,
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
        }
    }
}

impl ExperimentConfig {
    /// Load a JSON config file; missing fields keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.transition_lambda) {
            return Err(Error::LambdaOutOfRange(self.transition_lambda));
        }
        if self.conditions.is_empty() {
            return Err(Error::InvalidConfig("no conditions to run".into()));
        }
        if self.trials_per_condition == 0 {
            return Err(Error::InvalidConfig("trials_per_condition must be positive".into()));
        }
        if !(self.circle.radius > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "circle radius must be positive, got {}",
                self.circle.radius
            )));
        }
        if !(1..=CONFIDENCE_LIMIT).contains(&self.confidence_max) {
            return Err(Error::InvalidConfig(format!(
                "confidence_max must be within 1..={}, got {}",
                CONFIDENCE_LIMIT, self.confidence_max
            )));
        }
        if !(self.kappa > 0.0) || !self.kappa.is_finite() {
            return Err(Error::InvalidConfig(format!("kappa must be positive, got {}", self.kappa)));
        }
        // Threshold and spread
        self.partner_model()?;
        Ok(())
    }

    /// Partner model built from this config
    pub fn partner_model(&self) -> Result<PartnerModel> {
        PartnerModel::with_params(
            self.circle,
            self.kappa,
            self.high_confidence_threshold,
            self.spread_deg,
        )
    }

    /// Random source for a session: seeded when a seed is configured
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        }
    }

    /// Total trials across all blocks
    pub fn total_trials(&self) -> u32 {
        self.trials_per_condition * self.conditions.len() as u32
    }
}

/// Reproducible seed for a participant id: first 8 bytes of its SHA-256
pub fn seed_from_participant(participant_id: &str) -> u64 {
    let digest = Sha256::digest(participant_id.trim().as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    u64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExperimentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.total_trials(), 90);
        assert_eq!(
            config.conditions,
            vec![Condition::Susceptible, Condition::Baseline, Condition::Insusceptible]
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ExperimentConfig =
            serde_json::from_str(r#"{"trials_per_condition": 4, "conditions": ["baseline"]}"#).unwrap();
        assert_eq!(config.trials_per_condition, 4);
        assert_eq!(config.conditions, vec![Condition::Baseline]);
        assert_eq!(config.kappa, KAPPA);
        assert_eq!(config.circle, Circle::default());
    }

    #[test]
    fn test_unknown_condition_in_json_rejected() {
        let parsed: std::result::Result<ExperimentConfig, _> =
            serde_json::from_str(r#"{"conditions": ["neutral"]}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ExperimentConfig::default();
        config.transition_lambda = -0.1;
        assert!(matches!(config.validate(), Err(Error::LambdaOutOfRange(_))));

        let mut config = ExperimentConfig::default();
        config.conditions.clear();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = ExperimentConfig::default();
        config.confidence_max = 10;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.circle.radius = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_checks_partner_parameters() {
        let mut config = ExperimentConfig::default();
        config.high_confidence_threshold = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = ExperimentConfig::default();
        config.high_confidence_threshold = 12;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.spread_deg = -5.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = ExperimentConfig::default();
        config.spread_deg = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_rejects_bad_spread() {
        let path = std::env::temp_dir().join(format!("visual_estimate_cfg_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"spread_deg": 200.0}"#).unwrap();
        let loaded = ExperimentConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(loaded.is_err());
    }

    #[test]
    fn test_participant_seed_stable() {
        assert_eq!(seed_from_participant("P017"), seed_from_participant(" P017 "));
        assert_ne!(seed_from_participant("P017"), seed_from_participant("P018"));
    }
}
