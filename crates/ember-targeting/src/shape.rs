//! Targeting shapes and their inclusive containment predicates.
//!
//! All bounds are inclusive: a point exactly on the rim of a circle, the
//! edge of a cone, or the side of a line is inside. A small tolerance keeps
//! that true under float rounding.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Distance tolerance in world units.
pub const DISTANCE_EPSILON: f32 = 1e-4;

/// Angle tolerance in degrees.
pub const ANGLE_EPSILON_DEG: f32 = 1e-3;

/// Sphere of `radius` around `center`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec3,
    pub radius: f32,
}

/// Cone opening from `origin` along `direction`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cone {
    pub origin: Vec3,
    /// Facing; need not be normalized.
    pub direction: Vec3,
    /// Half of the full opening angle, in degrees.
    pub half_angle_deg: f32,
    pub range: f32,
}

/// Capsule-like strip around the segment `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Vec3,
    pub end: Vec3,
    /// Full width; points within `width / 2` of the segment are inside.
    pub width: f32,
}

/// Any targeting shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle(Circle),
    Cone(Cone),
    Line(Line),
}

impl Circle {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.distance(self.center) <= self.radius + DISTANCE_EPSILON
    }
}

impl Cone {
    pub fn new(origin: Vec3, direction: Vec3, half_angle_deg: f32, range: f32) -> Self {
        Self {
            origin,
            direction,
            half_angle_deg,
            range,
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        let delta = point - self.origin;
        let dist = delta.length();
        if dist > self.range + DISTANCE_EPSILON {
            return false;
        }
        // A target standing on the origin has no direction; count it as hit.
        if dist <= DISTANCE_EPSILON {
            return true;
        }
        let Some(forward) = self.direction.try_normalize() else {
            return false;
        };
        let cos = (delta / dist).dot(forward).clamp(-1.0, 1.0);
        cos.acos().to_degrees() <= self.half_angle_deg + ANGLE_EPSILON_DEG
    }
}

impl Line {
    pub fn new(start: Vec3, end: Vec3, width: f32) -> Self {
        Self { start, end, width }
    }

    /// Length of the segment.
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    pub fn contains(&self, point: Vec3) -> bool {
        let half_width = self.width * 0.5 + DISTANCE_EPSILON;
        let axis = self.end - self.start;
        let len_sq = axis.length_squared();
        if len_sq <= f32::EPSILON {
            return point.distance(self.start) <= half_width;
        }

        let t = (point - self.start).dot(axis) / len_sq;
        let len = len_sq.sqrt();
        let slack = DISTANCE_EPSILON / len;
        if t < -slack || t > 1.0 + slack {
            return false;
        }
        let closest = self.start + axis * t.clamp(0.0, 1.0);
        point.distance(closest) <= half_width
    }
}

impl Shape {
    pub fn contains(&self, point: Vec3) -> bool {
        match self {
            Shape::Circle(c) => c.contains(point),
            Shape::Cone(c) => c.contains(point),
            Shape::Line(l) => l.contains(point),
        }
    }

    /// Reference point used to order hits by distance.
    pub fn anchor(&self) -> Vec3 {
        match self {
            Shape::Circle(c) => c.center,
            Shape::Cone(c) => c.origin,
            Shape::Line(l) => l.start,
        }
    }
}

impl From<Circle> for Shape {
    fn from(c: Circle) -> Self {
        Shape::Circle(c)
    }
}

impl From<Cone> for Shape {
    fn from(c: Cone) -> Self {
        Shape::Cone(c)
    }
}

impl From<Line> for Shape {
    fn from(l: Line) -> Self {
        Shape::Line(l)
    }
}
