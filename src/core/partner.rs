//! Partner Response Model: two-stage simulated partner estimate
//!
//! Stage 1 places the partner near the participant's own estimate:
//! - confidence ≥ threshold: participant angle + uniform offset in ±20°
//! - otherwise: von Mises draw centered on the participant angle, κ = 7.4
//!
//! Stage 2 moves the partner toward the participant by an influence drawn
//! from the block's condition. The move is a straight blend in angle space,
//! `θ1 + influence·(θp − θ1)`, with no shortest-arc wrapping; near the 0/2π
//! seam it can travel the long way round.

use std::f64::consts::PI;
use rand::Rng;
use rand::distr::Distribution;
use tracing::debug;
use crate::{
    Error, Result, CONFIDENCE_LIMIT, HIGH_CONFIDENCE_SPREAD_DEG, HIGH_CONFIDENCE_THRESHOLD, KAPPA,
};
use crate::types::{Circle, Condition, ConfidenceLevel, InfluenceScheme, PartnerResponse, Point};

// =============================================================================
// VON MISES SAMPLER
// =============================================================================

/// Circular normal distribution, sampled with the Best–Fisher rejection method.
///
/// Samples are `mu + δ` with δ in [−π, π]; the result is not wrapped.
#[derive(Debug, Clone, Copy)]
pub struct VonMises {
    mu: f64,
    kappa: f64,
    /// Envelope parameter, `(1 + ρ²) / 2ρ`
    s: f64,
}

impl VonMises {
    pub fn new(mu: f64, kappa: f64) -> Result<Self> {
        if !kappa.is_finite() || kappa < 0.0 || !mu.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "von Mises needs finite mu and kappa >= 0, got mu={} kappa={}",
                mu, kappa
            )));
        }
        Ok(Self::unchecked(mu, kappa))
    }

    /// Caller guarantees finite `mu` and `kappa >= 0`
    fn unchecked(mu: f64, kappa: f64) -> Self {
        let s = if kappa < 1e-8 {
            0.0
        } else {
            let tau = 1.0 + (1.0 + 4.0 * kappa * kappa).sqrt();
            let rho = (tau - (2.0 * tau).sqrt()) / (2.0 * kappa);
            (1.0 + rho * rho) / (2.0 * rho)
        };
        Self { mu, kappa, s }
    }
}

impl Distribution<f64> for VonMises {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        // Degenerates to uniform on the circle
        if self.kappa < 1e-8 {
            return self.mu + PI * (2.0 * rng.random::<f64>() - 1.0);
        }

        let w = loop {
            let u: f64 = rng.random();
            let v: f64 = rng.random();
            let z = (PI * u).cos();
            let w = (1.0 + self.s * z) / (self.s + z);
            let y = self.kappa * (self.s - w);
            if y * (2.0 - y) - v >= 0.0 || (y / v).ln() + 1.0 - y >= 0.0 {
                break w;
            }
        };

        let delta = w.clamp(-1.0, 1.0).acos();
        if rng.random::<f64>() < 0.5 {
            self.mu - delta
        } else {
            self.mu + delta
        }
    }
}

// =============================================================================
// INFLUENCE DRAWS
// =============================================================================

/// Pick one of the scheme's bands by weight, then a uniform value inside it
pub fn draw_influence<R: Rng + ?Sized>(scheme: &InfluenceScheme, rng: &mut R) -> f64 {
    let total: f64 = scheme.weights.iter().sum();
    let mut r = rng.random::<f64>() * total;

    let mut band = scheme.ranges[scheme.ranges.len() - 1];
    for (w, range) in scheme.weights.iter().zip(scheme.ranges.iter()) {
        r -= w;
        if r < 0.0 {
            band = *range;
            break;
        }
    }

    let (lo, hi) = band;
    rng.random_range(lo..=hi)
}

/// Influence for one trial under the block's condition.
///
/// Baseline draws once from each scheme and blends:
/// `(1 − λ)·susceptible + λ·insusceptible`.
pub fn condition_influence<R: Rng + ?Sized>(
    condition: Condition,
    transition_lambda: f64,
    rng: &mut R,
) -> f64 {
    match condition {
        Condition::Susceptible => draw_influence(&InfluenceScheme::SUSCEPTIBLE, rng),
        Condition::Insusceptible => draw_influence(&InfluenceScheme::INSUSCEPTIBLE, rng),
        Condition::Baseline => {
            let susceptible = draw_influence(&InfluenceScheme::SUSCEPTIBLE, rng);
            let insusceptible = draw_influence(&InfluenceScheme::INSUSCEPTIBLE, rng);
            (1.0 - transition_lambda) * susceptible + transition_lambda * insusceptible
        }
    }
}

/// Reject a transition lambda outside [0, 1]
pub fn check_lambda(transition_lambda: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&transition_lambda) {
        Ok(transition_lambda)
    } else {
        Err(Error::LambdaOutOfRange(transition_lambda))
    }
}

// =============================================================================
// PARTNER MODEL
// =============================================================================

/// Simulated partner. Pure given its random source; performs no I/O.
#[derive(Debug, Clone)]
pub struct PartnerModel {
    circle: Circle,
    /// Low-confidence offset around the participant angle, centered on 0
    noise: VonMises,
    high_confidence_threshold: u8,
    /// Half-width of the high-confidence offset, radians
    spread: f64,
}

impl PartnerModel {
    /// Model with the standard parameters (κ = 7.4, threshold 5, ±20°)
    pub fn new(circle: Circle) -> Self {
        Self {
            circle,
            noise: VonMises::unchecked(0.0, KAPPA),
            high_confidence_threshold: HIGH_CONFIDENCE_THRESHOLD,
            spread: HIGH_CONFIDENCE_SPREAD_DEG.to_radians(),
        }
    }

    /// Model with explicit parameters; every model parameter is checked here
    pub fn with_params(
        circle: Circle,
        kappa: f64,
        high_confidence_threshold: u8,
        spread_deg: f64,
    ) -> Result<Self> {
        let noise = VonMises::new(0.0, kappa)?;
        if !(1..=CONFIDENCE_LIMIT).contains(&high_confidence_threshold) {
            return Err(Error::InvalidConfig(format!(
                "high_confidence_threshold must be within 1..={}, got {}",
                CONFIDENCE_LIMIT, high_confidence_threshold
            )));
        }
        if !(0.0..=180.0).contains(&spread_deg) {
            return Err(Error::InvalidConfig(format!(
                "spread_deg must be within [0, 180], got {}",
                spread_deg
            )));
        }
        Ok(Self {
            circle,
            noise,
            high_confidence_threshold,
            spread: spread_deg.to_radians(),
        })
    }

    /// Stage 1: the partner's first estimate.
    ///
    /// Missing confidence counts as the lowest rating.
    pub fn first_estimate<R: Rng + ?Sized>(
        &self,
        participant_angle: f64,
        confidence: Option<ConfidenceLevel>,
        rng: &mut R,
    ) -> (Point, f64) {
        let confidence = confidence.unwrap_or_default();

        let angle = if confidence.is_at_least(self.high_confidence_threshold) {
            participant_angle + rng.random_range(-self.spread..=self.spread)
        } else {
            participant_angle + self.noise.sample(rng)
        };

        debug!(participant_angle, confidence = confidence.value(), angle, "partner first estimate");
        (self.circle.point_from_angle(angle), angle)
    }

    /// Stage 2: the partner's revised estimate, blended toward the participant.
    ///
    /// Returns the point, the angle and the influence that was drawn.
    pub fn second_estimate<R: Rng + ?Sized>(
        &self,
        participant_angle: f64,
        partner_angle: f64,
        condition: Condition,
        transition_lambda: f64,
        rng: &mut R,
    ) -> Result<(Point, f64, f64)> {
        let transition_lambda = check_lambda(transition_lambda)?;
        Ok(self.blend(participant_angle, partner_angle, condition, transition_lambda, rng))
    }

    /// Stage 2 with `transition_lambda` already checked
    fn blend<R: Rng + ?Sized>(
        &self,
        participant_angle: f64,
        partner_angle: f64,
        condition: Condition,
        transition_lambda: f64,
        rng: &mut R,
    ) -> (Point, f64, f64) {
        let influence = condition_influence(condition, transition_lambda, rng);
        let angle = partner_angle + influence * (participant_angle - partner_angle);

        debug!(%condition, influence, angle, "partner second estimate");
        (self.circle.point_from_angle(angle), angle, influence)
    }

    /// Run both stages for one trial. Lambda is checked before anything is drawn.
    pub fn respond<R: Rng + ?Sized>(
        &self,
        participant_angle: f64,
        confidence: Option<ConfidenceLevel>,
        condition: Condition,
        transition_lambda: f64,
        rng: &mut R,
    ) -> Result<PartnerResponse> {
        let transition_lambda = check_lambda(transition_lambda)?;
        let (first_point, first_angle) = self.first_estimate(participant_angle, confidence, rng);
        let (second_point, second_angle, influence) =
            self.blend(participant_angle, first_angle, condition, transition_lambda, rng);

        Ok(PartnerResponse {
            first_point,
            first_angle,
            second_point,
            second_angle,
            influence,
        })
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

    fn mean(xs: &[f64]) -> f64 {
        xs.iter().sum::<f64>() / xs.len() as f64
    }

    #[test]
    fn test_von_mises_centered_on_mu() {
        let mut rng = StdRng::seed_from_u64(11);
        let dist = VonMises::new(1.0, KAPPA).unwrap();
        let samples: Vec<f64> = (0..20_000).map(|_| dist.sample(&mut rng)).collect();

        assert!((mean(&samples) - 1.0).abs() < 0.02);
        assert!(samples.iter().all(|s| (s - 1.0).abs() <= PI + 1e-12));
    }

    #[test]
    fn test_von_mises_concentration() {
        // For κ = 7.4 the mean resultant length E[cos δ] = I1(κ)/I0(κ) ≈ 0.93
        let mut rng = StdRng::seed_from_u64(12);
        let dist = VonMises::new(0.0, KAPPA).unwrap();
        let resultant = mean(&(0..20_000).map(|_| dist.sample(&mut rng).cos()).collect::<Vec<_>>());
        assert!((resultant - 0.930).abs() < 0.01, "resultant length {}", resultant);
    }

    #[test]
    fn test_von_mises_rejects_bad_kappa() {
        assert!(VonMises::new(0.0, -1.0).is_err());
        assert!(VonMises::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_draw_influence_stays_in_bands() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5_000 {
            let v = draw_influence(&InfluenceScheme::INSUSCEPTIBLE, &mut rng);
            let in_band = InfluenceScheme::INSUSCEPTIBLE
                .ranges
                .iter()
                .any(|(lo, hi)| (*lo..=*hi).contains(&v));
            assert!(in_band, "influence {} outside every band", v);
        }
    }

    #[test]
    fn test_draw_influence_band_frequencies() {
        let mut rng = StdRng::seed_from_u64(4);
        let n = 20_000;
        let high = (0..n)
            .map(|_| draw_influence(&InfluenceScheme::SUSCEPTIBLE, &mut rng))
            .filter(|v| *v > 0.7)
            .count();
        let share = high as f64 / n as f64;
        assert!((share - 0.5).abs() < 0.02, "high band share {}", share);
    }

    #[test]
    fn test_high_confidence_first_estimate_within_spread() {
        let model = PartnerModel::new(Circle::default());
        let mut rng = StdRng::seed_from_u64(5);
        let confidence = ConfidenceLevel::new(9, 9).ok();
        let limit = 20f64.to_radians() + 1e-12;
        for _ in 0..10_000 {
            let (_, angle) = model.first_estimate(0.0, confidence, &mut rng);
            assert!(angle.abs() <= limit);
        }
    }

    #[test]
    fn test_second_estimate_between_partner_and_participant() {
        let model = PartnerModel::new(Circle::default());
        let mut rng = StdRng::seed_from_u64(6);
        for condition in Condition::SESSION_ORDER {
            let (_, angle, influence) = model
                .second_estimate(1.0, 2.0, condition, 0.5, &mut rng)
                .unwrap();
            assert!((0.0..=1.0).contains(&influence));
            assert!((1.0..=2.0).contains(&angle));
            assert!((angle - (2.0 - influence)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_lambda_out_of_range_rejected() {
        let model = PartnerModel::new(Circle::default());
        let mut rng = StdRng::seed_from_u64(8);
        let err = model
            .respond(0.0, None, Condition::Baseline, 1.5, &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::LambdaOutOfRange(l) if l == 1.5));
    }

    #[test]
    fn test_respond_deterministic_with_seed() {
        let model = PartnerModel::new(Circle::default());
        let a = model
            .respond(2.0, None, Condition::Susceptible, 0.0, &mut StdRng::seed_from_u64(99))
            .unwrap();
        let b = model
            .respond(2.0, None, Condition::Susceptible, 0.0, &mut StdRng::seed_from_u64(99))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_points_lie_on_circle() {
        let circle = Circle::default();
        let model = PartnerModel::new(circle);
        let mut rng = StdRng::seed_from_u64(10);
        let r = model
            .respond(4.0, None, Condition::Insusceptible, 0.0, &mut rng)
            .unwrap();
        assert!(circle.distance_from_edge(&r.first_point) < 1e-9);
        assert!(circle.distance_from_edge(&r.second_point) < 1e-9);
    }

    #[test]
    fn test_low_confidence_offset_matches_centered_sampler() {
        let model = PartnerModel::new(Circle::default());
        let dist = VonMises::new(0.0, KAPPA).unwrap();
        let mut a = StdRng::seed_from_u64(21);
        let mut b = StdRng::seed_from_u64(21);
        for _ in 0..100 {
            let (_, angle) = model.first_estimate(2.5, None, &mut a);
            assert!((angle - (2.5 + dist.sample(&mut b))).abs() < 1e-12);
        }
    }

    #[test]
    fn test_configured_threshold_selects_branch() {
        // Threshold 3: a rating of 3 already takes the uniform ±1° branch
        let model = PartnerModel::with_params(Circle::default(), KAPPA, 3, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(22);
        let three = ConfidenceLevel::new(3, 6).ok();
        for _ in 0..2_000 {
            let (_, angle) = model.first_estimate(0.0, three, &mut rng);
            assert!(angle.abs() <= 1f64.to_radians() + 1e-12);
        }
    }

    #[test]
    fn test_with_params_rejects_bad_parameters() {
        let circle = Circle::default();
        assert!(PartnerModel::with_params(circle, -1.0, 5, 20.0).is_err());
        assert!(PartnerModel::with_params(circle, KAPPA, 0, 20.0).is_err());
        assert!(PartnerModel::with_params(circle, KAPPA, 10, 20.0).is_err());
        assert!(PartnerModel::with_params(circle, KAPPA, 5, -1.0).is_err());
        assert!(PartnerModel::with_params(circle, KAPPA, 5, f64::NAN).is_err());
        assert!(PartnerModel::with_params(circle, KAPPA, 5, 20.0).is_ok());
    }
}
