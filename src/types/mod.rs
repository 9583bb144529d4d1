//! Core types for the visual estimate task

mod geometry;
mod condition;
mod confidence;
mod trial;
mod reason;

pub use geometry::{Point, Circle, Arc};
pub use condition::{Condition, InfluenceScheme};
pub use confidence::ConfidenceLevel;
pub use trial::{PartnerResponse, TrialResult, TrialOutcome};
pub use reason::ReasonCode;
