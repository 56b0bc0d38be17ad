//! 2D vector math shared by the physics and action systems

use serde::{Deserialize, Serialize};

/// A point or displacement on the pitch
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians)
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    /// Returns the unit vector, or `None` for a zero-length or non-finite input
    pub fn normalized(self) -> Option<Vec2> {
        let len = self.length();
        if len.is_finite() && len > 0.0 {
            Some(self.scale(1.0 / len))
        } else {
            None
        }
    }

    pub fn scale(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }

    pub fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }

    /// Angle of this vector in radians, in (-π, π]
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        self.sub(other).length()
    }

    pub fn distance_sq(self, other: Vec2) -> f32 {
        self.sub(other).length_sq()
    }

    /// Bearing from `self` towards `target` in radians
    pub fn bearing_to(self, target: Vec2) -> f32 {
        target.sub(self).angle()
    }

    /// Clamp both axes into an axis-aligned box shrunk by `margin` on every side
    pub fn clamp_to_field(self, width: f32, height: f32, margin: f32) -> Vec2 {
        Vec2::new(
            self.x.clamp(margin, width - margin),
            self.y.clamp(margin, height - margin),
        )
    }
}

/// Result of bouncing a moving body off the field walls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reflection {
    pub position: Vec2,
    pub velocity: Vec2,
}

/// Reflect a body off the four walls of a `width` x `height` box.
///
/// Any axis that crossed `[radius, dimension - radius]` is pinned to the wall and its
/// velocity component is inverted and scaled by `restitution`.
pub fn reflect_in_bounds(
    position: Vec2,
    velocity: Vec2,
    width: f32,
    height: f32,
    radius: f32,
    restitution: f32,
) -> Reflection {
    let mut pos = position;
    let mut vel = velocity;

    if pos.x < radius {
        pos.x = radius;
        vel.x *= -restitution;
    }
    if pos.x > width - radius {
        pos.x = width - radius;
        vel.x *= -restitution;
    }
    if pos.y < radius {
        pos.y = radius;
        vel.y *= -restitution;
    }
    if pos.y > height - radius {
        pos.y = height - radius;
        vel.y *= -restitution;
    }

    Reflection {
        position: pos,
        velocity: vel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_zero_is_none() {
        assert!(Vec2::ZERO.normalized().is_none());
        let unit = Vec2::new(3.0, 4.0).normalized().unwrap();
        assert!((unit.length() - 1.0).abs() < 1e-6);
        assert!((unit.x - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_normalized_non_finite_is_none() {
        assert!(Vec2::new(f32::INFINITY, 0.0).normalized().is_none());
        assert!(Vec2::new(0.0, f32::NAN).normalized().is_none());
        assert!(Vec2::new(3e30, 3e30).normalized().is_none());
        assert!(!Vec2::new(f32::NEG_INFINITY, 1.0).is_finite());
    }

    #[test]
    fn test_distance_and_bearing() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(0.0, 10.0);
        assert_eq!(a.distance(b), 10.0);
        assert!((a.bearing_to(b) - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_to_field() {
        let p = Vec2::new(-5.0, 700.0).clamp_to_field(800.0, 600.0, 12.0);
        assert_eq!(p, Vec2::new(12.0, 588.0));
    }

    #[test]
    fn test_reflect_loses_energy() {
        let r = reflect_in_bounds(
            Vec2::new(-2.0, 300.0),
            Vec2::new(-5.0, 1.0),
            800.0,
            600.0,
            8.0,
            0.8,
        );
        assert_eq!(r.position.x, 8.0);
        assert!((r.velocity.x - 4.0).abs() < 1e-6);
        assert_eq!(r.velocity.y, 1.0);
    }

    #[test]
    fn test_reflect_inside_is_untouched() {
        let r = reflect_in_bounds(
            Vec2::new(400.0, 300.0),
            Vec2::new(1.0, 1.0),
            800.0,
            600.0,
            8.0,
            0.8,
        );
        assert_eq!(r.position, Vec2::new(400.0, 300.0));
        assert_eq!(r.velocity, Vec2::new(1.0, 1.0));
    }
}
