//! Navigation service contract + straight-line stand-in.
//!
//! The controller only emits intents ("go there", "stop"). Pathfinding
//! internals are someone else's problem; an unreachable destination is "no
//! progress", never an error.

use bevy::prelude::*;

const ARRIVAL_EPSILON: f32 = 1e-3;

pub trait NavigationService {
    /// Move toward `point` (also clears a previous `stop()`).
    fn set_destination(&mut self, point: Vec3);

    fn set_stopping_distance(&mut self, distance: f32);

    /// Halt movement; the destination is kept.
    fn stop(&mut self);

    fn is_stopped(&self) -> bool;

    fn is_path_pending(&self) -> bool;

    /// Distance from the agent to `point`.
    fn distance_to(&self, point: Vec3) -> f32;
}

/// Headless navigator: moves its owner straight toward the destination on
/// the XZ plane until `stopping_distance`.
///
/// A new destination is "pending" until the next [`advance`](Self::advance).
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct StraightLineNavigator {
    /// Метры в секунду
    pub speed: f32,
    destination: Option<Vec3>,
    stopping_distance: f32,
    stopped: bool,
    path_pending: bool,
    origin: Vec3,
}

impl Default for StraightLineNavigator {
    fn default() -> Self {
        Self::new(3.5)
    }
}

impl StraightLineNavigator {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            destination: None,
            stopping_distance: 0.0,
            stopped: true,
            path_pending: false,
            origin: Vec3::ZERO,
        }
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    pub fn stopping_distance(&self) -> f32 {
        self.stopping_distance
    }

    /// Keep the agent position in sync with the body it drives.
    pub fn sync_origin(&mut self, position: Vec3) {
        self.origin = position;
    }

    /// True when there is nothing left to walk.
    pub fn has_arrived(&self) -> bool {
        match self.destination {
            Some(destination) => self.distance_to(destination) <= self.stopping_distance + ARRIVAL_EPSILON,
            None => true,
        }
    }

    /// Integrate one step from `position`; returns the new position.
    pub fn advance(&mut self, position: Vec3, dt: f32) -> Vec3 {
        self.origin = position;
        self.path_pending = false;

        if self.stopped || dt <= 0.0 {
            return position;
        }
        let Some(destination) = self.destination else {
            return position;
        };

        let delta = Vec3::new(destination.x - position.x, 0.0, destination.z - position.z);
        let remaining = delta.length() - self.stopping_distance;
        if remaining <= 0.0 {
            return position;
        }
        let Some(direction) = delta.try_normalize() else {
            return position;
        };

        let step = (self.speed * dt).min(remaining);
        self.origin = position + direction * step;
        self.origin
    }
}

impl NavigationService for StraightLineNavigator {
    fn set_destination(&mut self, point: Vec3) {
        if !point.is_finite() {
            return;
        }
        self.destination = Some(point);
        self.stopped = false;
        self.path_pending = true;
    }

    fn set_stopping_distance(&mut self, distance: f32) {
        self.stopping_distance = distance.max(0.0);
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn is_path_pending(&self) -> bool {
        self.path_pending
    }

    fn distance_to(&self, point: Vec3) -> f32 {
        self.origin.distance(point)
    }
}
