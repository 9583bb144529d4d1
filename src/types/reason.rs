//! Reason codes for revision-gate decisions within a trial

use serde::{Deserialize, Serialize};

/// How a trial's revision gate resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // R101: Revision offered
    // =========================================================================
    /// Revision offered and a click inside the allowed arc was accepted
    R101_REVISED,
    /// Revision offered, participant declined
    R101_REVISION_DECLINED,

    // =========================================================================
    // R102: Revision withheld
    // =========================================================================
    /// Off turn: partner's revised estimate shown instead
    R102_PARTNER_REVEALED,

    // =========================================================================
    // R103: Click gating
    // =========================================================================
    /// Revision click fell outside the allowed arc
    R103_CLICK_OUTSIDE_ARC,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R101_REVISED => "R101_REVISED",
            Self::R101_REVISION_DECLINED => "R101_REVISION_DECLINED",
            Self::R102_PARTNER_REVEALED => "R102_PARTNER_REVEALED",
            Self::R103_CLICK_OUTSIDE_ARC => "R103_CLICK_OUTSIDE_ARC",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R101_REVISED => "Estimate revised within the allowed arc",
            Self::R101_REVISION_DECLINED => "Revision declined",
            Self::R102_PARTNER_REVEALED => "Partner's revised estimate shown",
            Self::R103_CLICK_OUTSIDE_ARC => "Clicked outside the allowed arc",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
