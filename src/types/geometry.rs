//! Geometric value types: display points, the response circle, minor arcs

use serde::{Deserialize, Serialize};
use crate::{CIRCLE_RADIUS, DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// A position in display coordinates (pixels, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The fixed response circle shared by every computation in a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl Default for Circle {
    /// Centered on the 800x600 display with radius 200
    fn default() -> Self {
        Self {
            center: Point::new((DISPLAY_WIDTH / 2.0).floor(), (DISPLAY_HEIGHT / 2.0).floor()),
            radius: CIRCLE_RADIUS,
        }
    }
}

/// The minor arc between two angles, stored as (min, max) boundary angles
/// normalized to [0, 2π).
///
/// Counter-clockwise travel from `min_angle` to `max_angle` covers at most π.
/// When the arc crosses 0, `min_angle > max_angle`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub min_angle: f64,
    pub max_angle: f64,
}

impl Arc {
    /// Angular span of the arc in radians, always within [0, π]
    pub fn span(&self) -> f64 {
        (self.max_angle - self.min_angle).rem_euclid(std::f64::consts::TAU)
    }

    /// True when the arc passes through angle 0
    pub fn wraps(&self) -> bool {
        self.min_angle > self.max_angle
    }

    /// Point along the arc at `fraction` of its span, counter-clockwise from `min_angle`
    pub fn angle_at(&self, fraction: f64) -> f64 {
        (self.min_angle + fraction * self.span()).rem_euclid(std::f64::consts::TAU)
    }
}
