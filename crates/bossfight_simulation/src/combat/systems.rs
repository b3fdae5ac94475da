//! Combat ECS systems: player weapon hits on the boss.

use bevy::prelude::*;

use super::feedback::{Feedback, FeedbackHooks};
use crate::ai::{BossController, StraightLineNavigator};
use crate::health::{forward_health_report, EntityDied, HalfHealthReached, Health, HealthChanged};

/// Shake on a player weapon hit (duration, magnitude).
pub const STRIKE_SHAKE: (f64, f32) = (0.25, 0.25);
pub const STRIKE_HIT_STOP: f64 = 0.06;

/// Событие: оружие игрока попало по боссу (input от tactical layer)
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerStrike {
    pub target: Entity,
    pub damage: f64,
    /// Heavy hit: staggers a boss that is idle or chasing
    pub stagger: bool,
}

/// Система: применение ударов игрока
///
/// Порядок как у weapon hitbox: shake → hit stop → damage. Отчёт здоровья
/// маршрутизируется в контроллер босса до возврата из системы, так что
/// phase two / Dead видны следующему tick'у атаки.
pub fn apply_player_strikes(
    mut strikes: EventReader<PlayerStrike>,
    mut bosses: Query<(&mut Health, &mut BossController, &mut StraightLineNavigator)>,
    feedback: Res<Feedback>,
    mut health_changed: EventWriter<HealthChanged>,
    mut half_health: EventWriter<HalfHealthReached>,
    mut died: EventWriter<EntityDied>,
) {
    for strike in strikes.read() {
        let Ok((mut health, mut controller, mut navigator)) = bosses.get_mut(strike.target) else {
            // не босс или уже despawned
            continue;
        };
        if health.is_dead() {
            continue;
        }

        feedback.0.shake(STRIKE_SHAKE.0, STRIKE_SHAKE.1);
        feedback.0.hit_stop(STRIKE_HIT_STOP);

        let report = health.apply_damage(strike.damage);
        crate::logger::log(&format!(
            "🗡️ Player strike: {:?} took {:.1} ({:.1}/{:.1})",
            strike.target,
            strike.damage,
            health.current(),
            health.max()
        ));

        controller.handle_health(&report, &mut *navigator);
        if strike.stagger && !report.died() {
            controller.stagger(&mut *navigator);
        }
        forward_health_report(strike.target, &report, &mut health_changed, &mut half_health, &mut died);
    }
}
