//! In-memory arena + recording hooks for unit tests.

use bevy::prelude::*;
use std::sync::{Arc, Mutex};

use super::arena::CombatArena;
use super::feedback::FeedbackHooks;
use crate::health::Health;

pub(crate) struct TestActor {
    pub id: Entity,
    pub position: Vec3,
    pub health: Health,
    pub hits: Vec<f64>,
    pub impulse: Vec3,
}

#[derive(Default)]
pub(crate) struct TestArena {
    pub actors: Vec<TestActor>,
    pub player: Option<Entity>,
    next_id: u32,
}

impl TestArena {
    pub fn with_player(position: Vec3, max_health: f64) -> Self {
        let mut arena = Self::default();
        let id = arena.spawn(position, max_health);
        arena.player = Some(id);
        arena
    }

    pub fn spawn(&mut self, position: Vec3, max_health: f64) -> Entity {
        // handles are never reused
        self.next_id += 1;
        let id = Entity::from_raw(self.next_id);
        self.actors.push(TestActor {
            id,
            position,
            health: Health::new(max_health),
            hits: Vec::new(),
            impulse: Vec3::ZERO,
        });
        id
    }

    pub fn actor(&self, id: Entity) -> &TestActor {
        self.actors
            .iter()
            .find(|actor| actor.id == id)
            .expect("unknown test actor")
    }

    pub fn move_actor(&mut self, id: Entity, position: Vec3) {
        if let Some(actor) = self.actors.iter_mut().find(|actor| actor.id == id) {
            actor.position = position;
        }
    }

    /// Simulates the target despawning.
    pub fn remove(&mut self, id: Entity) {
        self.actors.retain(|actor| actor.id != id);
        if self.player == Some(id) {
            self.player = None;
        }
    }

    pub fn total_hits(&self) -> usize {
        self.actors.iter().map(|actor| actor.hits.len()).sum()
    }
}

impl CombatArena for TestArena {
    fn locate(&self, target: Entity) -> Option<Vec3> {
        self.actors
            .iter()
            .find(|actor| actor.id == target)
            .map(|actor| actor.position)
    }

    fn acquire_target(&self) -> Option<Entity> {
        self.player
    }

    fn damageables_within(&self, center: Vec3, radius: f32) -> Vec<(Entity, Vec3)> {
        self.actors
            .iter()
            .filter(|actor| actor.position.distance(center) <= radius)
            .map(|actor| (actor.id, actor.position))
            .collect()
    }

    fn deal_damage(&mut self, target: Entity, amount: f64) {
        if let Some(actor) = self.actors.iter_mut().find(|actor| actor.id == target) {
            actor.hits.push(amount);
            actor.health.apply_damage(amount);
        }
    }

    fn apply_impulse(&mut self, target: Entity, impulse: Vec3) {
        if let Some(actor) = self.actors.iter_mut().find(|actor| actor.id == target) {
            actor.impulse += impulse;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FeedbackCall {
    Shake { duration: f64, magnitude: f32 },
    HitStop { duration: f64 },
}

#[derive(Default)]
pub(crate) struct RecordingFeedback {
    pub calls: Mutex<Vec<FeedbackCall>>,
}

impl RecordingFeedback {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<FeedbackCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl FeedbackHooks for RecordingFeedback {
    fn shake(&self, duration: f64, magnitude: f32) {
        self.calls
            .lock()
            .unwrap()
            .push(FeedbackCall::Shake { duration, magnitude });
    }

    fn hit_stop(&self, duration: f64) {
        self.calls.lock().unwrap().push(FeedbackCall::HitStop { duration });
    }
}
