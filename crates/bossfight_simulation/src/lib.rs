//! BOSSFIGHT Simulation Core
//!
//! ECS-симуляция boss encounter'а на Bevy 0.16 (headless).
//!
//! Слои:
//! - plain Rust state machines (Health, AttackUnit, BossController,
//!   EncounterTrigger, MusicSwitcher), тестируются без App
//! - тонкие Bevy системы в FixedUpdate (60Hz), порядок задаёт `SimulationSet`

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::time::Duration;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod config;
pub mod encounter;
pub mod health;
pub mod logger;
pub mod shared;

// Re-export основных типов
pub use ai::{AIPlugin, BossController, BossSignal, BossSignalEvent, BossState, StraightLineNavigator};
pub use combat::{AttackPhase, AttackUnit, CombatPlugin, EncounterTarget, Feedback, FeedbackHooks, PlayerStrike};
pub use config::{ConfigError, EncounterConfig};
pub use encounter::{spawn_encounter, EncounterActivated, EncounterEntities, EncounterPlugin, EncounterTrigger};
pub use health::{EntityDied, HalfHealthReached, Health, HealthChanged};

/// Simulation tick rate (Hz)
pub const TICK_RATE: f64 = 60.0;

/// Порядок подсистем внутри одного fixed tick'а
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Shake / hit stop (unscaled time)
    Feedback,
    /// Trigger zones, teardown
    Encounter,
    /// Удары игрока по боссу
    Strikes,
    /// Think loop + attack units
    Bosses,
    Movement,
    Knockback,
    /// Music
    Presentation,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(TICK_RATE))
            // Детерминистичный RNG (seed по умолчанию)
            .insert_resource(DeterministicRng::new(42))
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Feedback,
                    SimulationSet::Encounter,
                    SimulationSet::Strikes,
                    SimulationSet::Bosses,
                    SimulationSet::Movement,
                    SimulationSet::Knockback,
                    SimulationSet::Presentation,
                )
                    .chain(),
            )
            .add_plugins((EncounterPlugin, CombatPlugin, AIPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Manual time step: первый `app.update()` только запускает часы,
/// каждый следующий = ровно один fixed tick.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .add_plugins(SimulationPlugin)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / TICK_RATE,
        )));

    app
}

/// Snapshot encounter'а для сравнения детерминизма и итогов прогона
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncounterSnapshot {
    pub boss_state: String,
    pub boss_health: f64,
    pub boss_position: [f32; 3],
    pub phase_two: bool,
    /// (name, phase) per attack unit
    pub attacks: Vec<(String, String)>,
    pub player_health: f64,
    pub player_position: [f32; 3],
    pub trigger_activated: bool,
}

impl EncounterSnapshot {
    /// `None` if the boss or player has been despawned.
    pub fn capture(world: &World, entities: &EncounterEntities) -> Option<Self> {
        let controller = world.get::<BossController>(entities.boss)?;
        let boss_health = world.get::<Health>(entities.boss)?;
        let boss_transform = world.get::<Transform>(entities.boss)?;
        let player_health = world.get::<Health>(entities.player)?;
        let player_transform = world.get::<Transform>(entities.player)?;
        let trigger_activated = world
            .get::<EncounterTrigger>(entities.trigger)
            .is_some_and(|trigger| trigger.is_activated());

        Some(Self {
            boss_state: controller.state().as_str().to_string(),
            boss_health: boss_health.current(),
            boss_position: boss_transform.translation.to_array(),
            phase_two: controller.is_phase_two(),
            attacks: controller
                .attacks()
                .iter()
                .map(|unit| (unit.name().to_string(), unit.phase().as_str().to_string()))
                .collect(),
            player_health: player_health.current(),
            player_position: player_transform.translation.to_array(),
            trigger_activated,
        })
    }

    /// RON text (byte-for-byte comparable between runs).
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string(self)
    }
}
