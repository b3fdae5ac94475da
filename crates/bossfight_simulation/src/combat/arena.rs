//! Combat arena contract: how attack units see and hurt the world.
//!
//! Targets are `Entity` handles (arena + index). A handle may go stale at
//! any time; every lookup can return `None`, and that is normal flow.

use bevy::prelude::*;

use crate::ai::BossController;
use crate::health::{Health, HealthReport};

/// World queries and side effects available to an attack routine.
pub trait CombatArena {
    /// Resolve a weak target handle to a position.
    fn locate(&self, target: Entity) -> Option<Vec3>;

    /// Role lookup ("the player") for target (re)acquisition.
    fn acquire_target(&self) -> Option<Entity>;

    /// Every damageable within `radius` of `center`, ordered by handle.
    fn damageables_within(&self, center: Vec3, radius: f32) -> Vec<(Entity, Vec3)>;

    /// Damageable contract: `takeDamage(amount)`.
    fn deal_damage(&mut self, target: Entity, amount: f64);

    /// Outward push; bodies without a knockback receiver ignore it.
    fn apply_impulse(&mut self, target: Entity, impulse: Vec3);
}

/// Marker: entity the boss hunts (role tag "Player").
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct EncounterTarget;

/// Knockback receiver (impulse → velocity, mass = 1).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Knockback {
    pub velocity: Vec3,
    /// Доля скорости, теряемая за секунду
    pub damping: f32,
}

impl Knockback {
    pub fn new(damping: f32) -> Self {
        Self {
            velocity: Vec3::ZERO,
            damping,
        }
    }

    /// Integrate one step; returns the displacement.
    pub fn step(&mut self, dt: f32) -> Vec3 {
        let displacement = self.velocity * dt;
        self.velocity *= (1.0 - self.damping * dt).max(0.0);
        if self.velocity.length_squared() < 1e-6 {
            self.velocity = Vec3::ZERO;
        }
        displacement
    }
}

/// Damageables seen by boss attacks: everything with health that is not a boss.
pub type DamageableQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static Transform,
        &'static mut Health,
        Option<&'static mut Knockback>,
    ),
    Without<BossController>,
>;

/// ECS-backed arena for one boss tick.
///
/// Health reports are collected and forwarded as Bevy events by the caller.
pub struct ArenaView<'a, 'w, 's> {
    damageables: &'a mut DamageableQuery<'w, 's>,
    candidate_target: Option<Entity>,
    pub reports: Vec<(Entity, HealthReport)>,
}

impl<'a, 'w, 's> ArenaView<'a, 'w, 's> {
    pub fn new(damageables: &'a mut DamageableQuery<'w, 's>, candidate_target: Option<Entity>) -> Self {
        Self {
            damageables,
            candidate_target,
            reports: Vec::new(),
        }
    }
}

impl CombatArena for ArenaView<'_, '_, '_> {
    fn locate(&self, target: Entity) -> Option<Vec3> {
        self.damageables
            .get(target)
            .ok()
            .map(|(_, transform, _, _)| transform.translation)
    }

    fn acquire_target(&self) -> Option<Entity> {
        self.candidate_target
    }

    fn damageables_within(&self, center: Vec3, radius: f32) -> Vec<(Entity, Vec3)> {
        let mut hits: Vec<(Entity, Vec3)> = self
            .damageables
            .iter()
            .filter(|(_, transform, _, _)| transform.translation.distance(center) <= radius)
            .map(|(entity, transform, _, _)| (entity, transform.translation))
            .collect();
        hits.sort_by_key(|(entity, _)| entity.index());
        hits
    }

    fn deal_damage(&mut self, target: Entity, amount: f64) {
        let Ok((_, _, mut health, _)) = self.damageables.get_mut(target) else {
            return;
        };
        let report = health.apply_damage(amount);
        if !report.is_empty() {
            self.reports.push((target, report));
        }
    }

    fn apply_impulse(&mut self, target: Entity, impulse: Vec3) {
        if let Ok((_, _, _, Some(mut knockback))) = self.damageables.get_mut(target) {
            knockback.velocity += impulse;
        }
    }
}

/// System: integrate knockback velocity into transforms.
pub fn apply_knockback(
    mut bodies: Query<(&mut Transform, &mut Knockback)>,
    time: Res<Time<Fixed>>,
    feedback: Res<crate::combat::Feedback>,
) {
    let dt = (time.delta_secs_f64() * feedback.0.time_scale()) as f32;
    if dt <= 0.0 {
        return;
    }

    for (mut transform, mut knockback) in bodies.iter_mut() {
        if knockback.velocity == Vec3::ZERO {
            continue;
        }
        transform.translation += knockback.step(dt);
    }
}
