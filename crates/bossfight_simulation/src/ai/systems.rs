//! AI ECS systems: boss think/attack tick, navigator movement.

use bevy::prelude::*;

use super::controller::{BossController, BossSignal};
use super::navigation::StraightLineNavigator;
use crate::combat::{ArenaView, DamageableQuery, EncounterTarget, Feedback};
use crate::health::{forward_health_report, EntityDied, HalfHealthReached, HealthChanged};
use crate::shared::Pose;
use crate::DeterministicRng;

/// Событие: сигнал контроллера босса (state change, attack start/finish, phase two)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct BossSignalEvent {
    pub boss: Entity,
    pub signal: BossSignal,
}

/// Simulated delta for this fixed step (0 while a hit stop is running).
pub(crate) fn scaled_delta(time: &Time<Fixed>, feedback: &Feedback) -> f64 {
    time.delta_secs_f64() * feedback.0.time_scale()
}

/// Система: tick всех боссов
///
/// Pose синхронизируется Transform → controller → Transform. Урон по игроку
/// проходит через `Health::apply_damage`, отчёты уходят в Bevy события.
#[allow(clippy::too_many_arguments)]
pub fn tick_bosses(
    mut bosses: Query<(
        Entity,
        &mut BossController,
        &mut Transform,
        &mut StraightLineNavigator,
    )>,
    mut damageables: DamageableQuery,
    targets: Query<Entity, With<EncounterTarget>>,
    time: Res<Time<Fixed>>,
    feedback: Res<Feedback>,
    mut rng: ResMut<DeterministicRng>,
    mut signals: EventWriter<BossSignalEvent>,
    mut health_changed: EventWriter<HealthChanged>,
    mut half_health: EventWriter<HalfHealthReached>,
    mut died: EventWriter<EntityDied>,
) {
    let dt = scaled_delta(&time, &feedback);
    if dt <= 0.0 {
        return;
    }

    // role lookup ("Player"): lowest index wins
    let candidate = targets.iter().min_by_key(|entity| entity.index());

    for (boss, mut controller, mut transform, mut navigator) in bosses.iter_mut() {
        let mut pose = Pose::from_transform(&transform);
        navigator.sync_origin(pose.position);

        let reports = {
            let mut arena = ArenaView::new(&mut damageables, candidate);
            controller.tick(dt, &mut pose, &mut *navigator, &mut arena, &mut rng.rng);
            arena.reports
        };

        pose.write_to(&mut transform);
        navigator.sync_origin(pose.position);

        for (target, report) in &reports {
            forward_health_report(*target, report, &mut health_changed, &mut half_health, &mut died);
        }
        for signal in controller.drain_signals() {
            signals.write(BossSignalEvent { boss, signal });
        }
    }
}

/// Система: движение по straight-line навигатору (лицом по ходу движения)
pub fn drive_navigators(
    mut agents: Query<(&mut Transform, &mut StraightLineNavigator)>,
    time: Res<Time<Fixed>>,
    feedback: Res<Feedback>,
) {
    let dt = scaled_delta(&time, &feedback) as f32;
    if dt <= 0.0 {
        return;
    }

    for (mut transform, mut navigator) in agents.iter_mut() {
        let from = transform.translation;
        let to = navigator.advance(from, dt);
        if to == from {
            continue;
        }

        let heading = Vec3::new(to.x - from.x, 0.0, to.z - from.z);
        if heading.length_squared() > 1e-8 {
            transform.look_to(heading, Vec3::Y);
        }
        transform.translation = to;
    }
}
