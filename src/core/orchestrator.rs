//! Trial Orchestrator: sequencing and revision gating for a session
//!
//! Per trial:
//! 1. Flash a uniform random target, then scatter distractors
//! 2. Participant clicks an estimate and rates confidence
//! 3. Partner model produces both stages
//! 4. Revision gate: baseline always offers; other conditions offer only
//!    when the session's alternating-turn flag is set, otherwise the
//!    partner's revised estimate is revealed
//! 5. An accepted revision must land inside the minor arc between the
//!    participant's initial angle and the partner's first angle; clicks
//!    outside are rejected and re-prompted without limit
//! 6. The turn flag flips after every trial, whatever the condition
//! 7. Influence is scored against the partner's FIRST angle, using the
//!    revised angle when this trial revised, else the initial angle
//!
//! Rendering, input and storage are collaborators behind traits. The quit
//! signal from input ends the session and drops the trial in progress.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use crate::config::ExperimentConfig;
use crate::core::geometry::minor_arc;
use crate::core::influence::influence_ratio;
use crate::core::partner::PartnerModel;
use crate::types::{
    Arc, Condition, ConfidenceLevel, Point, ReasonCode, TrialOutcome, TrialResult,
};
use crate::{Error, Result};

// =============================================================================
// COLLABORATORS
// =============================================================================

/// What a click is being requested for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickPrompt {
    /// Initial estimate, anywhere on the circle
    Estimate,
    /// Revision, which must fall inside this arc
    Revision(Arc),
}

/// Synchronous participant input. Any query may return [`Error::Quit`].
pub trait ParticipantInput {
    /// A click position, on or near the circle
    fn click(&mut self, prompt: &ClickPrompt) -> Result<Point>;

    /// A confidence rating on `1..=max`
    fn confidence(&mut self, max: u8) -> Result<u8>;

    /// Whether the participant wants to revise
    fn wants_revision(&mut self) -> Result<bool>;
}

/// Display cues, in the order a trial produces them
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    BlockStarting(Condition),
    TrialStarting { condition: Condition, trial: u32, of: u32 },
    Target(Point),
    Distractors(Vec<Point>),
    AwaitEstimate,
    ParticipantEstimate(Point),
    AwaitConfidence { max: u8 },
    PartnerEstimate(Point),
    OfferRevision,
    AllowedArc(Arc),
    ClickRejected(Point),
    PartnerRevised(Point),
    FinalEstimate(Point),
}

/// Write-only display sink
pub trait Renderer {
    fn show(&mut self, cue: &Cue);
}

/// Renderer that discards every cue
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn show(&mut self, _cue: &Cue) {}
}

/// Append-only destination for trial results
pub trait TrialSink {
    fn record(&mut self, result: &TrialResult) -> Result<()>;
}

impl TrialSink for Vec<TrialResult> {
    fn record(&mut self, result: &TrialResult) -> Result<()> {
        self.push(result.clone());
        Ok(())
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// State carried from trial to trial across the whole session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Set on turns where non-baseline conditions offer revision
    pub alternate_turn: bool,
    pub trials_completed: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            alternate_turn: true,
            trials_completed: 0,
        }
    }
}

/// Whether this trial offers the participant a revision
pub fn revision_offered(condition: Condition, alternate_turn: bool) -> bool {
    condition.always_offers_revision() || alternate_turn
}

/// Per-condition tallies for a finished or aborted session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSummary {
    pub condition: Condition,
    pub trials: u32,
    pub revisions: u32,
    pub mean_influence_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub trials_recorded: u32,
    /// Ended by the quit signal
    pub aborted: bool,
    pub conditions: Vec<ConditionSummary>,
}

impl SessionSummary {
    fn tally(&mut self, outcome: &TrialOutcome) {
        let result = &outcome.result;
        self.trials_recorded += 1;
        let idx = match self.conditions.iter().position(|c| c.condition == result.condition) {
            Some(idx) => idx,
            None => {
                self.conditions.push(ConditionSummary {
                    condition: result.condition,
                    trials: 0,
                    revisions: 0,
                    mean_influence_ratio: 0.0,
                });
                self.conditions.len() - 1
            }
        };
        let entry = &mut self.conditions[idx];
        entry.trials += 1;
        // A revision accepted on the initial angle still counts
        if outcome.reason == ReasonCode::R101_REVISED {
            entry.revisions += 1;
        }
        // Running mean
        entry.mean_influence_ratio +=
            (result.influence_ratio - entry.mean_influence_ratio) / entry.trials as f64;
    }
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

/// Drives a session of trials against injected collaborators
#[derive(Debug)]
pub struct TrialOrchestrator<R: Rng> {
    config: ExperimentConfig,
    model: PartnerModel,
    rng: R,
    state: SessionState,
}

impl<R: Rng> TrialOrchestrator<R> {
    pub fn new(config: ExperimentConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let model = config.partner_model()?;
        Ok(Self {
            config,
            model,
            rng,
            state: SessionState::default(),
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Run one trial. Nothing is recorded here; the caller owns persistence.
    pub fn run_trial(
        &mut self,
        condition: Condition,
        trial: u32,
        input: &mut dyn ParticipantInput,
        renderer: &mut dyn Renderer,
    ) -> Result<TrialOutcome> {
        let circle = self.config.circle;
        renderer.show(&Cue::TrialStarting {
            condition,
            trial,
            of: self.config.trials_per_condition,
        });

        // 1. Target flash and distractors
        let (target_point, target_angle) = circle.random_point(&mut self.rng);
        renderer.show(&Cue::Target(target_point));
        let distractors = (0..self.config.distractor_count)
            .map(|_| circle.random_point(&mut self.rng).0)
            .collect();
        renderer.show(&Cue::Distractors(distractors));

        // 2. Initial estimate and confidence
        renderer.show(&Cue::AwaitEstimate);
        let click = input.click(&ClickPrompt::Estimate)?;
        let (participant_point, participant_angle) = circle.angle_from_click(click);
        renderer.show(&Cue::ParticipantEstimate(participant_point));

        let confidence = self.elicit_confidence(input, renderer)?;

        // 3. Partner
        let partner = self.model.respond(
            participant_angle,
            Some(confidence),
            condition,
            self.config.transition_lambda,
            &mut self.rng,
        )?;
        renderer.show(&Cue::PartnerEstimate(partner.first_point));

        // 4-5. Revision gate
        let offered = revision_offered(condition, self.state.alternate_turn);
        let mut rejected_clicks = 0;
        let mut revised: Option<(Point, f64)> = None;

        let reason = if offered {
            renderer.show(&Cue::OfferRevision);
            if input.wants_revision()? {
                let arc = minor_arc(participant_angle, partner.first_angle);
                renderer.show(&Cue::AllowedArc(arc));
                loop {
                    let click = input.click(&ClickPrompt::Revision(arc))?;
                    let (point, angle) = circle.angle_from_click(click);
                    if arc.contains(angle) {
                        revised = Some((point, angle));
                        break;
                    }
                    rejected_clicks += 1;
                    warn!(
                        angle,
                        min = arc.min_angle,
                        max = arc.max_angle,
                        reason = ReasonCode::R103_CLICK_OUTSIDE_ARC.code(),
                        "Clicked outside the allowed arc"
                    );
                    renderer.show(&Cue::ClickRejected(point));
                }
                ReasonCode::R101_REVISED
            } else {
                ReasonCode::R101_REVISION_DECLINED
            }
        } else {
            renderer.show(&Cue::PartnerRevised(partner.second_point));
            ReasonCode::R102_PARTNER_REVEALED
        };

        // 6. Turn flag flips every trial
        self.state.alternate_turn = !self.state.alternate_turn;
        self.state.trials_completed += 1;

        let (final_point, final_angle) = revised.unwrap_or((participant_point, participant_angle));
        renderer.show(&Cue::FinalEstimate(final_point));

        // 7. Score against the partner's first angle
        let ratio = influence_ratio(participant_angle, final_angle, partner.first_angle);
        let result = TrialResult {
            condition,
            trial,
            influence_ratio: ratio,
            participant_initial_angle: participant_angle,
            participant_final_angle: final_angle,
            partner_angle: partner.first_angle,
        };

        info!(%condition, trial, influence_ratio = ratio, reason = reason.code(), "trial complete");

        Ok(TrialOutcome {
            timestamp: Utc::now(),
            result,
            target_angle,
            confidence,
            partner,
            revision_offered: offered,
            reason,
            rejected_clicks,
        })
    }

    /// Confidence prompt; out-of-scale answers are asked again
    fn elicit_confidence(
        &mut self,
        input: &mut dyn ParticipantInput,
        renderer: &mut dyn Renderer,
    ) -> Result<ConfidenceLevel> {
        let max = self.config.confidence_max;
        loop {
            renderer.show(&Cue::AwaitConfidence { max });
            match ConfidenceLevel::new(input.confidence(max)?, max) {
                Ok(level) => return Ok(level),
                Err(e) => warn!("{}", e),
            }
        }
    }

    /// Run every block, recording each completed trial
    pub fn run(
        &mut self,
        input: &mut dyn ParticipantInput,
        renderer: &mut dyn Renderer,
        sink: &mut dyn TrialSink,
    ) -> Result<SessionSummary> {
        self.run_with(input, renderer, sink, |_| {})
    }

    /// As [`run`](Self::run), calling `on_trial` after each trial is recorded
    pub fn run_with<F>(
        &mut self,
        input: &mut dyn ParticipantInput,
        renderer: &mut dyn Renderer,
        sink: &mut dyn TrialSink,
        mut on_trial: F,
    ) -> Result<SessionSummary>
    where
        F: FnMut(&TrialOutcome),
    {
        let mut summary = SessionSummary {
            trials_recorded: 0,
            aborted: false,
            conditions: Vec::new(),
        };

        let conditions = self.config.conditions.clone();
        for condition in conditions {
            info!(%condition, trials = self.config.trials_per_condition, "running condition block");
            renderer.show(&Cue::BlockStarting(condition));

            for trial in 1..=self.config.trials_per_condition {
                let outcome = match self.run_trial(condition, trial, input, renderer) {
                    Ok(outcome) => outcome,
                    Err(Error::Quit) => {
                        info!(recorded = summary.trials_recorded, "participant quit");
                        summary.aborted = true;
                        return Ok(summary);
                    }
                    Err(e) => return Err(e),
                };
                sink.record(&outcome.result)?;
                summary.tally(&outcome);
                on_trial(&outcome);
            }
        }

        Ok(summary)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::VecDeque;

    /// Replays queued answers; quits when a queue runs dry
    #[derive(Default)]
    struct Scripted {
        clicks: VecDeque<Point>,
        confidences: VecDeque<u8>,
        revisions: VecDeque<bool>,
    }

    impl ParticipantInput for Scripted {
        fn click(&mut self, _prompt: &ClickPrompt) -> Result<Point> {
            self.clicks.pop_front().ok_or(Error::Quit)
        }
        fn confidence(&mut self, _max: u8) -> Result<u8> {
            self.confidences.pop_front().ok_or(Error::Quit)
        }
        fn wants_revision(&mut self) -> Result<bool> {
            self.revisions.pop_front().ok_or(Error::Quit)
        }
    }

    fn config(conditions: Vec<Condition>, trials: u32) -> ExperimentConfig {
        ExperimentConfig {
            conditions,
            trials_per_condition: trials,
            distractor_count: 3,
            ..ExperimentConfig::default()
        }
    }

    #[test]
    fn test_revision_gate() {
        assert!(revision_offered(Condition::Baseline, false));
        assert!(revision_offered(Condition::Baseline, true));
        assert!(revision_offered(Condition::Susceptible, true));
        assert!(!revision_offered(Condition::Susceptible, false));
        assert!(!revision_offered(Condition::Insusceptible, false));
    }

    #[test]
    fn test_declined_revision_keeps_initial() {
        let mut orch =
            TrialOrchestrator::new(config(vec![Condition::Baseline], 1), StdRng::seed_from_u64(1)).unwrap();
        let mut input = Scripted::default();
        input.clicks.push_back(Point::new(600.0, 300.0));
        input.confidences.push_back(3);
        input.revisions.push_back(false);

        let outcome = orch
            .run_trial(Condition::Baseline, 1, &mut input, &mut NullRenderer)
            .unwrap();
        assert_eq!(outcome.reason, ReasonCode::R101_REVISION_DECLINED);
        assert_eq!(outcome.result.participant_final_angle, 0.0);
        assert_eq!(outcome.result.influence_ratio, 0.0);
        assert!(!orch.state().alternate_turn);
    }

    #[test]
    fn test_off_turn_reveals_partner() {
        let mut orch =
            TrialOrchestrator::new(config(vec![Condition::Susceptible], 2), StdRng::seed_from_u64(2)).unwrap();
        let mut input = Scripted::default();
        // Trial 1 offers (flag starts set), trial 2 does not
        input.clicks.extend([Point::new(600.0, 300.0), Point::new(400.0, 500.0)]);
        input.confidences.extend([2, 2]);
        input.revisions.push_back(false);

        let first = orch.run_trial(Condition::Susceptible, 1, &mut input, &mut NullRenderer).unwrap();
        assert!(first.revision_offered);
        let second = orch.run_trial(Condition::Susceptible, 2, &mut input, &mut NullRenderer).unwrap();
        assert!(!second.revision_offered);
        assert_eq!(second.reason, ReasonCode::R102_PARTNER_REVEALED);
        assert!(orch.state().alternate_turn);
    }

    #[test]
    fn test_bad_confidence_reprompted() {
        let mut orch =
            TrialOrchestrator::new(config(vec![Condition::Baseline], 1), StdRng::seed_from_u64(3)).unwrap();
        let mut input = Scripted::default();
        input.clicks.push_back(Point::new(600.0, 300.0));
        input.confidences.extend([0, 8, 6]);
        input.revisions.push_back(false);

        let outcome = orch.run_trial(Condition::Baseline, 1, &mut input, &mut NullRenderer).unwrap();
        assert_eq!(outcome.confidence.value(), 6);
    }

    #[test]
    fn test_quit_mid_trial_records_nothing() {
        let mut orch =
            TrialOrchestrator::new(config(vec![Condition::Baseline], 3), StdRng::seed_from_u64(4)).unwrap();
        let mut input = Scripted::default();
        input.clicks.push_back(Point::new(600.0, 300.0));
        input.confidences.push_back(2);
        input.revisions.push_back(false);
        // Second trial quits at the estimate click

        let mut sink: Vec<TrialResult> = Vec::new();
        let summary = orch.run(&mut input, &mut NullRenderer, &mut sink).unwrap();
        assert!(summary.aborted);
        assert_eq!(summary.trials_recorded, 1);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_summary_running_mean() {
        let mut orch =
            TrialOrchestrator::new(config(vec![Condition::Baseline], 1), StdRng::seed_from_u64(5)).unwrap();
        let mut input = Scripted::default();
        input.clicks.push_back(Point::new(600.0, 300.0));
        input.confidences.push_back(2);
        input.revisions.push_back(false);
        let template = orch.run_trial(Condition::Baseline, 1, &mut input, &mut NullRenderer).unwrap();

        let mut summary = SessionSummary { trials_recorded: 0, aborted: false, conditions: vec![] };
        for ratio in [0.2, 0.4, 0.9] {
            let mut outcome = template.clone();
            outcome.result.influence_ratio = ratio;
            summary.tally(&outcome);
        }
        assert_eq!(summary.conditions.len(), 1);
        assert!((summary.conditions[0].mean_influence_ratio - 0.5).abs() < 1e-12);
        assert_eq!(summary.conditions[0].revisions, 0);
    }

    #[test]
    fn test_revision_onto_initial_angle_is_tallied() {
        let mut orch =
            TrialOrchestrator::new(config(vec![Condition::Baseline], 1), StdRng::seed_from_u64(6)).unwrap();
        let mut input = Scripted::default();
        // Revision click on the initial estimate, the arc's own boundary
        input.clicks.extend([Point::new(600.0, 300.0), Point::new(600.0, 300.0)]);
        input.confidences.push_back(2);
        input.revisions.push_back(true);

        let mut sink: Vec<TrialResult> = Vec::new();
        let summary = orch.run(&mut input, &mut NullRenderer, &mut sink).unwrap();
        assert!(!summary.aborted);
        assert_eq!(sink[0].participant_final_angle, sink[0].participant_initial_angle);
        assert_eq!(summary.conditions[0].revisions, 1);
    }
}
