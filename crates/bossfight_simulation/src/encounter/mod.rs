//! Encounter domain module
//!
//! ECS ответственность:
//! - Trigger zone: one-shot активация боя (барьеры, босс, музыка, UI)
//! - Music switcher: intro → phase 1 → phase 2 (crossfade)
//! - Boss health bar: модель UI, подписанная на Health босса
//! - Spawn: сборка encounter'а из EncounterConfig

use bevy::prelude::*;

pub mod health_bar;
pub mod music;
pub mod spawn;
pub mod systems;
pub mod trigger;

// Re-export основных типов
pub use health_bar::{BossHealthBar, HealthBarHandle, HealthBarView};
pub use music::{MusicHandle, MusicSwitcher, MusicTrack, MusicTracks};
pub use spawn::{spawn_encounter, EncounterEntities};
pub use systems::{check_encounter_triggers, handle_encounter_teardown, tick_music, EncounterActivated, EncounterTeardown};
pub use trigger::{ActivationTargets, Barrier, EncounterTrigger, TriggerZone};

use crate::SimulationSet;

/// Encounter Plugin
///
/// Порядок выполнения:
/// 1. handle_encounter_teardown: снять подписки до новых проверок
/// 2. check_encounter_triggers: вход target'а в зону
/// 3. tick_music: в конце тика (Presentation)
pub struct EncounterPlugin;

impl Plugin for EncounterPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<EncounterActivated>()
            .add_event::<EncounterTeardown>();

        app.add_systems(
            FixedUpdate,
            (
                (handle_encounter_teardown, check_encounter_triggers)
                    .chain()
                    .in_set(SimulationSet::Encounter),
                tick_music.in_set(SimulationSet::Presentation),
            ),
        );
    }
}
