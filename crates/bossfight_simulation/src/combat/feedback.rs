//! Impact feedback hooks (camera shake, hit stop).
//!
//! Attack units receive an injected `Arc<dyn FeedbackHooks>` at construction
//! instead of reaching for a process-wide singleton. Calls are
//! fire-and-forget: no return value, no completion notification.

use bevy::prelude::*;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Time scale applied to the encounter while a hit stop is running.
pub const HIT_STOP_TIME_SCALE: f64 = 0.0;

pub trait FeedbackHooks: Send + Sync {
    /// Start a camera shake. A new shake replaces the running one.
    fn shake(&self, duration: f64, magnitude: f32);

    /// Freeze simulation time for `duration` real seconds.
    /// Ignored while another hit stop is running.
    fn hit_stop(&self, duration: f64);
}

/// Null hooks (headless tools that don't care about feedback).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFeedback;

impl FeedbackHooks for NoFeedback {
    fn shake(&self, _duration: f64, _magnitude: f32) {}

    fn hit_stop(&self, _duration: f64) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeState {
    pub duration: f64,
    pub magnitude: f32,
    pub elapsed: f64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeedbackState {
    pub shake: Option<ShakeState>,
    pub hit_stop_remaining: Option<f64>,
    /// Всего запросов (для тестов/телеметрии)
    pub shakes_requested: u32,
    pub hit_stops_requested: u32,
}

/// Shared feedback state, ticked by the simulation with unscaled time.
#[derive(Debug, Default)]
pub struct FeedbackHub {
    state: Mutex<FeedbackState>,
}

impl FeedbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FeedbackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> FeedbackState {
        self.state().clone()
    }

    /// Advance shake and hit stop by real (unscaled) seconds.
    pub fn tick(&self, real_dt: f64) {
        let mut state = self.state();

        if let Some(shake) = state.shake.as_mut() {
            shake.elapsed += real_dt;
            if shake.elapsed >= shake.duration {
                state.shake = None;
            }
        }

        if let Some(remaining) = state.hit_stop_remaining {
            let remaining = remaining - real_dt;
            state.hit_stop_remaining = if remaining > 0.0 { Some(remaining) } else { None };
        }
    }

    pub fn is_shaking(&self) -> bool {
        self.state().shake.is_some()
    }

    /// Current shake amplitude, linearly fading to zero over the shake.
    pub fn shake_magnitude(&self) -> f32 {
        match self.state().shake {
            Some(shake) if shake.duration > 0.0 => {
                let k = (1.0 - shake.elapsed / shake.duration).clamp(0.0, 1.0);
                shake.magnitude * k as f32
            }
            _ => 0.0,
        }
    }

    pub fn is_hit_stopped(&self) -> bool {
        self.state().hit_stop_remaining.is_some()
    }

    pub fn time_scale(&self) -> f64 {
        if self.is_hit_stopped() {
            HIT_STOP_TIME_SCALE
        } else {
            1.0
        }
    }
}

impl FeedbackHooks for FeedbackHub {
    fn shake(&self, duration: f64, magnitude: f32) {
        let mut state = self.state();
        state.shakes_requested += 1;
        if duration <= 0.0 {
            return;
        }
        // рестарт: новый shake заменяет текущий
        state.shake = Some(ShakeState {
            duration,
            magnitude,
            elapsed: 0.0,
        });
    }

    fn hit_stop(&self, duration: f64) {
        let mut state = self.state();
        state.hit_stops_requested += 1;
        if state.hit_stop_remaining.is_some() || duration <= 0.0 {
            return;
        }
        state.hit_stop_remaining = Some(duration);
    }
}

/// Resource: the hub shared with every spawned attack unit.
#[derive(Resource, Clone)]
pub struct Feedback(pub Arc<FeedbackHub>);

impl Default for Feedback {
    fn default() -> Self {
        Self(Arc::new(FeedbackHub::new()))
    }
}

impl Feedback {
    pub fn hooks(&self) -> Arc<dyn FeedbackHooks> {
        self.0.clone()
    }
}

/// System: tick shake/hit stop with the unscaled fixed delta.
pub fn tick_feedback(feedback: Res<Feedback>, time: Res<Time<Fixed>>) {
    feedback.0.tick(time.delta_secs_f64());
}
