//! Circle geometry: angle/point projection, minor arcs, arc membership
//!
//! Angles are canonical; display points are derived from them. Every point
//! this module returns lies on the circle circumference.
//!
//! Conventions:
//! - Normalized angles live in [0, 2π)
//! - `angle_from_click` returns the raw atan2 angle in (−π, π]
//! - A forward gap of exactly π keeps the arguments in order

use std::f64::consts::{PI, TAU};
use rand::Rng;
use crate::types::{Arc, Circle, Point};

/// Reduce any angle to [0, 2π)
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid rounds tiny negatives up to exactly 2π
    if a >= TAU { 0.0 } else { a }
}

/// The minor arc between two angles, as (min, max) boundaries.
///
/// Both angles are normalized. If the counter-clockwise gap from `angle1`
/// to `angle2` is at most π the result is `(angle1, angle2)`, otherwise
/// `(angle2, angle1)`.
pub fn minor_arc(angle1: f64, angle2: f64) -> Arc {
    let a1 = normalize_angle(angle1);
    let a2 = normalize_angle(angle2);

    if (a2 - a1).rem_euclid(TAU) <= PI {
        Arc { min_angle: a1, max_angle: a2 }
    } else {
        Arc { min_angle: a2, max_angle: a1 }
    }
}

/// Closed membership test against the minor arc spanned by two boundaries.
///
/// The boundaries are re-derived through [`minor_arc`], so callers may pass
/// them raw and in either order.
pub fn is_within_arc(angle: f64, min_angle: f64, max_angle: f64) -> bool {
    let angle = normalize_angle(angle);
    let arc = minor_arc(min_angle, max_angle);

    if arc.min_angle <= arc.max_angle {
        arc.min_angle <= angle && angle <= arc.max_angle
    } else {
        // Straddles 0 / 2π
        angle >= arc.min_angle || angle <= arc.max_angle
    }
}

impl Arc {
    /// Convenience wrapper over [`is_within_arc`]
    pub fn contains(&self, angle: f64) -> bool {
        is_within_arc(angle, self.min_angle, self.max_angle)
    }
}

impl Circle {
    /// Project an angle (any real) onto the circumference
    pub fn point_from_angle(&self, angle: f64) -> Point {
        Point {
            x: self.center.x + self.radius * angle.cos(),
            y: self.center.y + self.radius * angle.sin(),
        }
    }

    /// Angle of a click relative to the center, in (−π, π], with the click
    /// snapped onto the circumference
    pub fn angle_from_click(&self, click: Point) -> (Point, f64) {
        let dx = click.x - self.center.x;
        let dy = click.y - self.center.y;
        let angle = dy.atan2(dx);
        (self.point_from_angle(angle), angle)
    }

    /// Uniform random angle in [0, 2π) and its point
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> (Point, f64) {
        let angle = rng.random_range(0.0..TAU);
        (self.point_from_angle(angle), angle)
    }

    /// Distance of a point from the circumference
    pub fn distance_from_edge(&self, point: &Point) -> f64 {
        (point.distance(&self.center) - self.radius).abs()
    }
}

// =============================================================================
// TESTS
// =============================================================================
