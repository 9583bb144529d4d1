//! Per-trial records: partner response, persisted result, full outcome

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{Condition, ConfidenceLevel, Point, ReasonCode};

/// Both stages of the partner's estimate for one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerResponse {
    /// First estimate, projected on the circle
    pub first_point: Point,
    /// First estimate angle (unwrapped)
    pub first_angle: f64,
    /// Revised estimate, projected on the circle
    pub second_point: Point,
    /// Revised estimate angle (unwrapped)
    pub second_angle: f64,
    /// Fraction of the gap to the participant the revision closed
    pub influence: f64,
}

/// The six-column record handed to persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub condition: Condition,
    /// 1-based index within the condition block
    pub trial: u32,
    pub influence_ratio: f64,
    pub participant_initial_angle: f64,
    pub participant_final_angle: f64,
    /// Partner's first-stage angle
    pub partner_angle: f64,
}

impl TrialResult {
    /// Column names in file order
    pub const COLUMNS: [&'static str; 6] = [
        "condition",
        "trial",
        "influence_ratio",
        "participant_initial_angle",
        "participant_final_angle",
        "partner_angle",
    ];

    /// Comma-separated row in column order
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.condition,
            self.trial,
            self.influence_ratio,
            self.participant_initial_angle,
            self.participant_final_angle,
            self.partner_angle,
        )
    }
}

/// Everything that happened in one trial, for JSON output and logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub timestamp: DateTime<Utc>,
    pub result: TrialResult,
    pub target_angle: f64,
    pub confidence: ConfidenceLevel,
    pub partner: PartnerResponse,
    /// Whether this trial offered a revision
    pub revision_offered: bool,
    pub reason: ReasonCode,
    /// Revision clicks rejected for falling outside the allowed arc
    pub rejected_clicks: u32,
}

impl TrialOutcome {
    /// Single-line summary for terminal display
    pub fn to_parseable_string(&self) -> String {
        format!(
            "condition={} | trial={} | influence={:.3} | initial={:.3} | final={:.3} | partner={:.3} | reason={}",
            self.result.condition,
            self.result.trial,
            self.result.influence_ratio,
            self.result.participant_initial_angle,
            self.result.participant_final_angle,
            self.result.partner_angle,
            self.reason.code(),
        )
    }
}
