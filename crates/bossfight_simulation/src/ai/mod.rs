//! Boss AI module
//!
//! Top-level FSM босса (Idle/Chase/Attack/Stagger/PhaseTransition/Dead),
//! navigation contract и ECS драйверы.

use bevy::prelude::*;

pub mod controller;
pub mod navigation;
pub mod systems;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod controller_tests;

// Re-export основных типов
pub use controller::{BossController, BossSignal, BossState, BossTuning, PhaseTwoTuning};
pub use navigation::{NavigationService, StraightLineNavigator};
pub use systems::{drive_navigators, tick_bosses, BossSignalEvent};

use crate::SimulationSet;

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate для детерминизма.
/// Порядок выполнения:
/// 1. tick_bosses: think loop, attack units, phase timers
/// 2. drive_navigators: движение к destination
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<BossSignalEvent>()
            .register_type::<BossState>()
            .register_type::<StraightLineNavigator>();

        app.add_systems(
            FixedUpdate,
            (
                tick_bosses.in_set(SimulationSet::Bosses),
                drive_navigators.in_set(SimulationSet::Movement),
            ),
        );
    }
}
