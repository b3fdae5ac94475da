//! Combat system module
//!
//! ECS ответственность:
//! - Attack units: timed routine (windup → active → recovery) + cooldown
//! - Combat arena: кого видят и кого бьют атаки босса
//! - Feedback hooks: camera shake, hit stop
//! - Events: PlayerStrike (удар игрока по боссу)

use bevy::prelude::*;

pub mod arena;
pub mod attack;
pub mod feedback;
pub mod systems;

#[cfg(test)]
pub(crate) mod test_support;


// Re-export основных типов
pub use arena::{apply_knockback, ArenaView, CombatArena, DamageableQuery, EncounterTarget, Knockback};
pub use attack::{AttackCue, AttackKind, AttackPhase, AttackProgress, AttackTiming, AttackUnit};
pub use feedback::{tick_feedback, Feedback, FeedbackHooks, FeedbackHub, NoFeedback};
pub use systems::{apply_player_strikes, PlayerStrike};

use crate::health::{EntityDied, HalfHealthReached, HealthChanged};
use crate::SimulationSet;

/// Combat Plugin
///
/// Регистрирует combat системы в FixedUpdate (60Hz).
///
/// Порядок выполнения:
/// 1. tick_feedback: shake/hit stop по unscaled времени
/// 2. apply_player_strikes: PlayerStrike → Health → BossController
/// 3. apply_knockback: импульсы от Slam
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Feedback>()
            .add_event::<PlayerStrike>()
            .add_event::<HealthChanged>()
            .add_event::<HalfHealthReached>()
            .add_event::<EntityDied>()
            .register_type::<AttackPhase>();

        app.add_systems(
            FixedUpdate,
            (
                tick_feedback.in_set(SimulationSet::Feedback),
                apply_player_strikes.in_set(SimulationSet::Strikes),
                apply_knockback.in_set(SimulationSet::Knockback),
            ),
        );
    }
}
