//! Core modules for the visual estimate task

pub mod geometry;
pub mod partner;
pub mod influence;
pub mod orchestrator;
pub mod persistence;
pub mod command;
pub mod simulated;
pub mod api;

pub use geometry::{normalize_angle, minor_arc, is_within_arc};
pub use partner::{PartnerModel, VonMises, draw_influence, condition_influence};
pub use influence::influence_ratio;
pub use orchestrator::{
    TrialOrchestrator, SessionState, SessionSummary, ConditionSummary, ParticipantInput,
    Renderer, NullRenderer, TrialSink, ClickPrompt, Cue, revision_offered,
};
pub use persistence::{CsvSink, load_results};
pub use command::{Command, CommandParser};
pub use simulated::SimulatedParticipant;
pub use api::{create_router, run_server};
