//! Boss body pose shared by the controller and attack units.

use bevy::prelude::*;

/// Position + facing of the attacking body.
///
/// Attack units move it (dash) and turn it (cleave windup); the ECS layer
/// copies it back into `Transform` after each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    /// Normalized facing (XZ plane для наземного босса)
    pub forward: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self {
            position,
            forward: forward.try_normalize().unwrap_or(Vec3::NEG_Z),
        }
    }

    pub fn from_transform(transform: &Transform) -> Self {
        Self::new(transform.translation, *transform.forward())
    }

    pub fn write_to(&self, transform: &mut Transform) {
        transform.translation = self.position;
        let flat = Vec3::new(self.forward.x, 0.0, self.forward.z);
        if flat.length_squared() > 1e-6 {
            transform.look_to(flat, Vec3::Y);
        }
    }

    /// Horizontal unit direction toward `point`, if it is not on top of us.
    pub fn direction_to(&self, point: Vec3) -> Option<Vec3> {
        let delta = point - self.position;
        Vec3::new(delta.x, 0.0, delta.z).try_normalize()
    }

    /// Angle (degrees) between facing and the direction toward `point`.
    pub fn bearing_deg(&self, point: Vec3) -> f32 {
        match (point - self.position).try_normalize() {
            Some(dir) => self.forward.angle_between(dir).to_degrees(),
            None => 0.0,
        }
    }
}
