//! Simulated participant for dry runs and pilot data
//!
//! Clicks a uniform random estimate, rates confidence uniformly on the
//! offered scale and revises with a fixed probability. A revision lands at
//! a random fraction of the allowed arc; with `miss_rate` the first attempt
//! deliberately misses the arc to exercise the re-prompt path.

use std::f64::consts::PI;
use rand::Rng;
use crate::core::orchestrator::{ClickPrompt, ParticipantInput};
use crate::types::{Circle, Point};
use crate::Result;

#[derive(Debug)]
pub struct SimulatedParticipant<R: Rng> {
    circle: Circle,
    rng: R,
    revise_probability: f64,
    miss_rate: f64,
    /// Set after a deliberate miss so the next attempt lands inside
    missed: bool,
}

impl<R: Rng> SimulatedParticipant<R> {
    pub fn new(circle: Circle, rng: R) -> Self {
        Self {
            circle,
            rng,
            revise_probability: 0.5,
            miss_rate: 0.0,
            missed: false,
        }
    }

    pub fn with_revise_probability(mut self, p: f64) -> Self {
        self.revise_probability = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_miss_rate(mut self, p: f64) -> Self {
        self.miss_rate = p.clamp(0.0, 1.0);
        self
    }
}

impl<R: Rng> ParticipantInput for SimulatedParticipant<R> {
    fn click(&mut self, prompt: &ClickPrompt) -> Result<Point> {
        let angle = match prompt {
            ClickPrompt::Estimate => self.rng.random_range(0.0..2.0 * PI),
            ClickPrompt::Revision(arc) => {
                if !self.missed && arc.span() < PI && self.rng.random_bool(self.miss_rate) {
                    self.missed = true;
                    // Opposite the arc midpoint
                    arc.angle_at(0.5) + PI
                } else {
                    self.missed = false;
                    arc.angle_at(self.rng.random_range(0.05..0.95))
                }
            }
        };
        Ok(self.circle.point_from_angle(angle))
    }

    fn confidence(&mut self, max: u8) -> Result<u8> {
        Ok(self.rng.random_range(1..=max.max(1)))
    }

    fn wants_revision(&mut self) -> Result<bool> {
        Ok(self.rng.random_bool(self.revise_probability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::minor_arc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_revision_clicks_land_in_arc() {
        let circle = Circle::default();
        let mut sim = SimulatedParticipant::new(circle, StdRng::seed_from_u64(1));
        let arc = minor_arc(350f64.to_radians(), 30f64.to_radians());
        for _ in 0..500 {
            let click = sim.click(&ClickPrompt::Revision(arc)).unwrap();
            let (_, angle) = circle.angle_from_click(click);
            assert!(arc.contains(angle));
        }
    }

    #[test]
    fn test_miss_then_hit() {
        let circle = Circle::default();
        let mut sim = SimulatedParticipant::new(circle, StdRng::seed_from_u64(2)).with_miss_rate(1.0);
        let arc = minor_arc(0.0, 1.0);
        let (_, first) = circle.angle_from_click(sim.click(&ClickPrompt::Revision(arc)).unwrap());
        let (_, second) = circle.angle_from_click(sim.click(&ClickPrompt::Revision(arc)).unwrap());
        assert!(!arc.contains(first));
        assert!(arc.contains(second));
    }

    #[test]
    fn test_confidence_on_scale() {
        let mut sim = SimulatedParticipant::new(Circle::default(), StdRng::seed_from_u64(3));
        for _ in 0..200 {
            let c = sim.confidence(6).unwrap();
            assert!((1..=6).contains(&c));
        }
    }
}
