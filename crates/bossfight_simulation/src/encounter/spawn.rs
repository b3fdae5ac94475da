//! Builds an encounter (boss, player, barriers, trigger) from config.

use bevy::prelude::*;

use super::health_bar::HealthBarHandle;
use super::music::{MusicHandle, MusicSwitcher};
use super::trigger::{Barrier, EncounterTrigger};
use crate::ai::{BossController, StraightLineNavigator};
use crate::combat::{EncounterTarget, Feedback, Knockback};
use crate::config::EncounterConfig;
use crate::health::Health;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterEntities {
    pub boss: Entity,
    pub player: Entity,
    pub trigger: Entity,
    pub barriers: Vec<Entity>,
}

/// Spawn the whole encounter into `world`.
///
/// Attack units share the world's `Feedback` hub (initialized if missing).
/// `MusicHandle` and `HealthBarHandle` are inserted as resources.
pub fn spawn_encounter(world: &mut World, config: &EncounterConfig) -> EncounterEntities {
    world.init_resource::<Feedback>();
    let hooks = world.resource::<Feedback>().hooks();

    let boss_position = Vec3::from_array(config.boss.position);
    let player_position = Vec3::from_array(config.player.position);

    let mut boss_transform = Transform::from_translation(boss_position);
    let facing = Vec3::new(player_position.x, boss_position.y, player_position.z);
    if facing.distance_squared(boss_position) > 1e-6 {
        boss_transform.look_at(facing, Vec3::Y);
    }

    let boss = world
        .spawn((
            Name::new(config.boss.name.clone()),
            boss_transform,
            Health::new(config.boss.max_health),
            BossController::new(
                config.boss_tuning(),
                config.phase_two_tuning(),
                config.build_attacks(hooks),
            ),
            StraightLineNavigator::new(config.boss.move_speed),
        ))
        .id();

    let player = world
        .spawn((
            Name::new("Player"),
            Transform::from_translation(player_position),
            Health::new(config.player.max_health),
            EncounterTarget,
            Knockback::new(config.player.knockback_damping),
        ))
        .id();

    let barriers: Vec<Entity> = config
        .barriers
        .iter()
        .map(|position| {
            world
                .spawn((
                    Name::new("Barrier"),
                    Transform::from_translation(Vec3::from_array(*position)),
                    Barrier::default(),
                ))
                .id()
        })
        .collect();

    let music = MusicHandle::new(MusicSwitcher::new(config.music.tracks(), config.music.crossfade));
    let health_bar = HealthBarHandle::new();
    world.insert_resource(music.clone());
    world.insert_resource(health_bar.clone());

    let trigger = world
        .spawn((
            Name::new("EncounterTrigger"),
            EncounterTrigger::new(config.trigger_zone(), boss, config.boss.name.clone(), barriers.clone())
                .with_music(music)
                .with_health_bar(health_bar),
        ))
        .id();

    crate::logger::log_info(&format!(
        "🏟️ Encounter spawned: boss {:?} '{}', player {:?}, {} barriers",
        boss,
        config.boss.name,
        player,
        barriers.len()
    ));

    EncounterEntities {
        boss,
        player,
        trigger,
        barriers,
    }
}
