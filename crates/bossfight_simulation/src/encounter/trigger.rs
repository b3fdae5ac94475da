//! Encounter trigger: one-shot gate for the boss fight.
//!
//! Активация: барьеры → босс → музыка → phase-two cue → health bar.

use bevy::prelude::*;

use super::health_bar::HealthBarHandle;
use super::music::MusicHandle;
use crate::ai::BossController;
use crate::health::Health;
use crate::shared::SubscriptionId;

/// Spherical trigger volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerZone {
    pub center: Vec3,
    pub radius: f32,
}

impl TriggerZone {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        self.center.distance(point) <= self.radius
    }
}

/// Arena wall, closed on activation.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Barrier {
    pub active: bool,
}

/// Mutable views the trigger touches during activation.
/// Anything missing (despawned boss, no barriers) is skipped.
#[derive(Default)]
pub struct ActivationTargets<'a> {
    pub controller: Option<&'a mut BossController>,
    pub health: Option<&'a mut Health>,
    pub barriers: Vec<&'a mut Barrier>,
    /// Entity that entered the zone
    pub target: Option<Entity>,
}

#[derive(Component, Debug)]
pub struct EncounterTrigger {
    zone: TriggerZone,
    boss: Entity,
    boss_name: String,
    barriers: Vec<Entity>,
    music: Option<MusicHandle>,
    health_bar: Option<HealthBarHandle>,
    activated: bool,
    phase_two_cue: Option<SubscriptionId>,
}

impl EncounterTrigger {
    pub fn new(zone: TriggerZone, boss: Entity, boss_name: impl Into<String>, barriers: Vec<Entity>) -> Self {
        Self {
            zone,
            boss,
            boss_name: boss_name.into(),
            barriers,
            music: None,
            health_bar: None,
            activated: false,
            phase_two_cue: None,
        }
    }

    pub fn with_music(mut self, music: MusicHandle) -> Self {
        self.music = Some(music);
        self
    }

    pub fn with_health_bar(mut self, health_bar: HealthBarHandle) -> Self {
        self.health_bar = Some(health_bar);
        self
    }

    pub fn zone(&self) -> TriggerZone {
        self.zone
    }

    pub fn boss(&self) -> Entity {
        self.boss
    }

    pub fn barriers(&self) -> &[Entity] {
        &self.barriers
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn has_phase_two_cue(&self) -> bool {
        self.phase_two_cue.is_some()
    }

    pub fn music(&self) -> Option<&MusicHandle> {
        self.music.as_ref()
    }

    pub fn health_bar(&self) -> Option<&HealthBarHandle> {
        self.health_bar.as_ref()
    }

    /// Fill unset collaborators (scene lookup fallback).
    pub fn assign_missing(&mut self, music: Option<&MusicHandle>, health_bar: Option<&HealthBarHandle>) {
        if self.music.is_none() {
            self.music = music.cloned();
        }
        if self.health_bar.is_none() {
            self.health_bar = health_bar.cloned();
        }
    }

    /// Returns `false` (and does nothing) after the first call.
    pub fn activate(&mut self, targets: ActivationTargets<'_>) -> bool {
        if self.activated {
            return false;
        }
        self.activated = true;
        crate::logger::log_info(&format!(
            "🚪 Encounter: '{}' triggered by {:?}",
            self.boss_name, targets.target
        ));

        for barrier in targets.barriers {
            barrier.active = true;
        }

        if let Some(controller) = targets.controller {
            controller.activate(targets.target);
        }

        if let Some(music) = &self.music {
            music.lock().play_intro_then_phase1();
        }

        if let Some(health) = targets.health {
            if let (Some(music), None) = (&self.music, self.phase_two_cue) {
                let music = music.clone();
                self.phase_two_cue = Some(health.on_half_health(move || music.lock().play_phase2()));
            }
            if let Some(bar) = &self.health_bar {
                bar.bind(health, &self.boss_name);
                bar.show();
            }
        }

        true
    }

    /// Removes the phase-two cue. Safe to call repeatedly.
    pub fn teardown(&mut self, health: Option<&mut Health>) -> bool {
        let Some(id) = self.phase_two_cue.take() else {
            return false;
        };
        crate::logger::log("🚪 Encounter: teardown, phase-two cue removed");
        health.is_some_and(|health| health.remove_half_health(id))
    }
}
