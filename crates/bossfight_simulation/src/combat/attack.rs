//! Attack unit: timed routine (windup → active → recovery) + cooldown.
//!
//! Состояние хранится явно (`phase` + `elapsed`) и продвигается через
//! [`AttackUnit::tick`] раз в simulation tick. Варианты (Cleave/Dash/Slam)
//! отличаются только эффектом Active фазы.
//!
//! # Timing
//!
//! Не более одного перехода фазы за tick. Переполнение `elapsed` переносится
//! в следующую фазу, поэтому полный цикл укладывается в ±1 tick.

use bevy::prelude::*;
use std::sync::Arc;

use super::arena::CombatArena;
use super::feedback::FeedbackHooks;
use crate::shared::{Observers, Pose, SubscriptionId};

/// Фаза атаки. `Ready` единственная, из которой атаку можно начать.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum AttackPhase {
    #[default]
    Ready,
    Windup,
    Active,
    Recovery,
    Cooldown,
}

impl AttackPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackPhase::Ready => "Ready",
            AttackPhase::Windup => "Windup",
            AttackPhase::Active => "Active",
            AttackPhase::Recovery => "Recovery",
            AttackPhase::Cooldown => "Cooldown",
        }
    }
}

/// Phase durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackTiming {
    pub windup: f64,
    /// Ignored by Dash (movement-driven)
    pub active: f64,
    pub recovery: f64,
    pub cooldown: f64,
}

impl AttackTiming {
    pub fn new(windup: f64, active: f64, recovery: f64, cooldown: f64) -> Self {
        Self {
            windup,
            active,
            recovery,
            cooldown,
        }
    }

    /// windup + active + recovery
    pub fn routine(&self) -> f64 {
        self.windup + self.active + self.recovery
    }
}

/// One-shot cue on entry of a routine phase (SFX/VFX collaborators).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackCue {
    Windup,
    Active,
    Recovery,
}

/// Phase transition performed by one [`AttackUnit::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackProgress {
    EnteredActive,
    EnteredRecovery,
    /// Routine complete, cooldown started
    Finished,
    CooledDown,
}

/// Active-phase effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttackKind {
    /// Cone sweep in front of the body.
    Cleave { range: f32, angle_deg: f32 },
    /// Moving hit-sweep toward the target.
    Dash {
        speed: f32,
        distance: f32,
        hit_radius: f32,
    },
    /// Area damage + outward impulse around the impact point.
    Slam {
        radius: f32,
        shockwave_force: f32,
        impact_offset: Vec3,
    },
}

pub const CLEAVE_SHAKE: (f64, f32) = (0.2, 0.22);
pub const DASH_SHAKE_MAGNITUDE: f32 = 0.18;
/// Dash shake duration when speed is ~0 and distance/speed is meaningless.
pub const DASH_FALLBACK_SHAKE: f64 = 0.25;
pub const SLAM_SHAKE: (f64, f32) = (0.35, 0.35);

#[derive(Debug, Clone, Copy, Default)]
struct DashRun {
    direction: Vec3,
    travelled: f32,
}

/// Одна атака босса (Cleave / Dash / Slam).
pub struct AttackUnit {
    name: String,
    timing: AttackTiming,
    damage: f64,
    kind: AttackKind,
    enabled: bool,
    phase: AttackPhase,
    elapsed: f64,
    target: Option<Entity>,
    dash: DashRun,
    hooks: Arc<dyn FeedbackHooks>,
    on_attack_started: Observers<String>,
    on_attack_finished: Observers<String>,
    on_cue: Observers<AttackCue>,
}

impl std::fmt::Debug for AttackUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttackUnit")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("elapsed", &self.elapsed)
            .field("timing", &self.timing)
            .field("damage", &self.damage)
            .field("kind", &self.kind)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl AttackUnit {
    pub fn new(
        name: impl Into<String>,
        timing: AttackTiming,
        damage: f64,
        kind: AttackKind,
        hooks: Arc<dyn FeedbackHooks>,
    ) -> Self {
        Self {
            name: name.into(),
            timing,
            damage,
            kind,
            enabled: true,
            phase: AttackPhase::Ready,
            elapsed: 0.0,
            target: None,
            dash: DashRun::default(),
            hooks,
            on_attack_started: Observers::new(),
            on_attack_finished: Observers::new(),
            on_cue: Observers::new(),
        }
    }

    /// Normal preset: windup 0.6, active 0.2, recovery 0.5, cooldown 3.0.
    pub fn cleave(hooks: Arc<dyn FeedbackHooks>) -> Self {
        Self::new(
            "Cleave",
            AttackTiming::new(0.6, 0.2, 0.5, 3.0),
            35.0,
            AttackKind::Cleave {
                range: 3.5,
                angle_deg: 100.0,
            },
            hooks,
        )
    }

    pub fn dash(hooks: Arc<dyn FeedbackHooks>) -> Self {
        Self::new(
            "Dash",
            AttackTiming::new(0.5, 0.0, 0.6, 5.0),
            40.0,
            AttackKind::Dash {
                speed: 18.0,
                distance: 10.0,
                hit_radius: 1.2,
            },
            hooks,
        )
    }

    pub fn slam(hooks: Arc<dyn FeedbackHooks>) -> Self {
        Self::new(
            "Slam",
            AttackTiming::new(0.8, 0.2, 0.6, 4.0),
            45.0,
            AttackKind::Slam {
                radius: 4.0,
                shockwave_force: 8.0,
                impact_offset: Vec3::ZERO,
            },
            hooks,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timing(&self) -> AttackTiming {
        self.timing
    }

    pub fn damage(&self) -> f64 {
        self.damage
    }

    pub fn kind(&self) -> AttackKind {
        self.kind
    }

    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    pub fn elapsed_in_phase(&self) -> f64 {
        self.elapsed
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn can_use(&self) -> bool {
        self.enabled && self.phase == AttackPhase::Ready
    }

    /// Windup, Active or Recovery.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            AttackPhase::Windup | AttackPhase::Active | AttackPhase::Recovery
        )
    }

    pub fn is_on_cooldown(&self) -> bool {
        self.phase == AttackPhase::Cooldown
    }

    /// Starts the routine. Returns `false` (nothing emitted) unless [`can_use`](Self::can_use).
    pub fn try_execute(&mut self, target: Option<Entity>) -> bool {
        if !self.can_use() {
            return false;
        }

        self.target = target;
        self.dash = DashRun::default();
        self.enter(AttackPhase::Windup);

        crate::logger::log(&format!("⚔️ {}: windup started (target: {:?})", self.name, target));
        let name = self.name.clone();
        self.on_attack_started.emit(&name);
        self.on_cue.emit(&AttackCue::Windup);
        true
    }

    /// Advance the routine/cooldown by `dt` simulated seconds.
    pub fn tick(&mut self, dt: f64, pose: &mut Pose, arena: &mut dyn CombatArena) -> Option<AttackProgress> {
        if dt <= 0.0 {
            return None;
        }

        match self.phase {
            AttackPhase::Ready => None,
            AttackPhase::Windup => {
                self.elapsed += dt;
                if let AttackKind::Cleave { .. } = self.kind {
                    self.face_target(pose, arena);
                }
                if self.elapsed < self.timing.windup {
                    return None;
                }
                self.carry(self.timing.windup);
                self.begin_active(pose, arena);
                Some(AttackProgress::EnteredActive)
            }
            AttackPhase::Active => match self.kind {
                AttackKind::Dash {
                    speed,
                    distance,
                    hit_radius,
                } => {
                    if self.dash_step(dt, speed, distance, hit_radius, pose, arena) {
                        self.elapsed = 0.0;
                        self.begin_recovery();
                        Some(AttackProgress::EnteredRecovery)
                    } else {
                        self.elapsed += dt;
                        None
                    }
                }
                _ => {
                    self.elapsed += dt;
                    if self.elapsed < self.timing.active {
                        return None;
                    }
                    self.carry(self.timing.active);
                    self.begin_recovery();
                    Some(AttackProgress::EnteredRecovery)
                }
            },
            AttackPhase::Recovery => {
                self.elapsed += dt;
                if self.elapsed < self.timing.recovery {
                    return None;
                }
                self.carry(self.timing.recovery);
                self.phase = AttackPhase::Cooldown;

                crate::logger::log(&format!(
                    "⚔️ {}: finished, cooldown {:.2}s",
                    self.name, self.timing.cooldown
                ));
                let name = self.name.clone();
                self.on_attack_finished.emit(&name);
                Some(AttackProgress::Finished)
            }
            AttackPhase::Cooldown => {
                self.elapsed += dt;
                if self.elapsed < self.timing.cooldown {
                    return None;
                }
                self.enter(AttackPhase::Ready);
                Some(AttackProgress::CooledDown)
            }
        }
    }

    /// Phase-two escalation: shorter cooldown (floored), more damage.
    pub fn scale_for_phase_two(&mut self, cooldown_factor: f64, cooldown_floor: f64, damage_factor: f64) {
        self.timing.cooldown = (self.timing.cooldown * cooldown_factor).max(cooldown_floor);
        self.damage *= damage_factor;
        crate::logger::log(&format!(
            "⚔️ {}: phase two (cooldown {:.2}s, damage {:.1})",
            self.name, self.timing.cooldown, self.damage
        ));
    }

    /// Rejects further `try_execute`; an in-flight routine still completes.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn on_attack_started<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&String) + Send + Sync + 'static,
    {
        self.on_attack_started.subscribe(callback)
    }

    pub fn on_attack_finished<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&String) + Send + Sync + 'static,
    {
        self.on_attack_finished.subscribe(callback)
    }

    pub fn on_cue<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&AttackCue) + Send + Sync + 'static,
    {
        self.on_cue.subscribe(callback)
    }

    pub fn remove_attack_started(&mut self, id: SubscriptionId) -> bool {
        self.on_attack_started.unsubscribe(id)
    }

    pub fn remove_attack_finished(&mut self, id: SubscriptionId) -> bool {
        self.on_attack_finished.unsubscribe(id)
    }

    pub fn remove_cue(&mut self, id: SubscriptionId) -> bool {
        self.on_cue.unsubscribe(id)
    }

    // ------------------------------------------------------------------------
    // Phase internals
    // ------------------------------------------------------------------------

    fn enter(&mut self, phase: AttackPhase) {
        self.phase = phase;
        self.elapsed = 0.0;
    }

    fn carry(&mut self, duration: f64) {
        self.elapsed = (self.elapsed - duration).max(0.0);
    }

    /// Cleave windup: ease facing toward the target by `elapsed / windup`.
    fn face_target(&self, pose: &mut Pose, arena: &dyn CombatArena) {
        let Some(target_pos) = self.target.and_then(|target| arena.locate(target)) else {
            return;
        };
        let Some(dir) = pose.direction_to(target_pos) else {
            return;
        };

        let t = if self.timing.windup > 0.0 {
            (self.elapsed / self.timing.windup).clamp(0.0, 1.0) as f32
        } else {
            1.0
        };
        pose.forward = pose.forward.lerp(dir, t).try_normalize().unwrap_or(dir);
    }

    fn begin_active(&mut self, pose: &mut Pose, arena: &mut dyn CombatArena) {
        self.phase = AttackPhase::Active;
        self.on_cue.emit(&AttackCue::Active);

        match self.kind {
            AttackKind::Cleave { range, angle_deg } => {
                self.hooks.shake(CLEAVE_SHAKE.0, CLEAVE_SHAKE.1);

                let origin = pose.position + pose.forward;
                let half_angle = angle_deg * 0.5;
                let mut hits = 0;
                for (entity, position) in arena.damageables_within(origin, range) {
                    if pose.bearing_deg(position) <= half_angle {
                        arena.deal_damage(entity, self.damage);
                        hits += 1;
                    }
                }
                crate::logger::log(&format!("⚔️ {}: active, {} hit(s)", self.name, hits));
            }
            AttackKind::Dash { speed, distance, .. } => {
                let estimated = if speed > 0.01 {
                    (distance / speed) as f64
                } else {
                    DASH_FALLBACK_SHAKE
                };
                self.hooks.shake(estimated, DASH_SHAKE_MAGNITUDE);

                let direction = self
                    .target
                    .and_then(|target| arena.locate(target))
                    .and_then(|target_pos| pose.direction_to(target_pos))
                    .unwrap_or(pose.forward);
                pose.forward = direction;
                self.dash = DashRun {
                    direction,
                    travelled: 0.0,
                };
                crate::logger::log(&format!(
                    "⚔️ {}: active, dashing {:.1}m toward {:?}",
                    self.name, distance, direction
                ));
            }
            AttackKind::Slam {
                radius,
                shockwave_force,
                impact_offset,
            } => {
                self.hooks.shake(SLAM_SHAKE.0, SLAM_SHAKE.1);

                let center = pose.position + impact_offset;
                let hits = arena.damageables_within(center, radius);
                for (entity, position) in &hits {
                    arena.deal_damage(*entity, self.damage);
                    let outward = (*position - center).try_normalize().unwrap_or(Vec3::ZERO);
                    if outward != Vec3::ZERO {
                        arena.apply_impulse(*entity, outward * shockwave_force);
                    }
                }
                crate::logger::log(&format!("⚔️ {}: active, {} hit(s)", self.name, hits.len()));
            }
        }
    }

    /// One dash step. Every damageable overlapping the new position is hit,
    /// including ones already hit on earlier steps.
    ///
    /// Returns `true` when the dash is complete.
    fn dash_step(
        &mut self,
        dt: f64,
        speed: f32,
        distance: f32,
        hit_radius: f32,
        pose: &mut Pose,
        arena: &mut dyn CombatArena,
    ) -> bool {
        let remaining = distance - self.dash.travelled;
        if speed <= f32::EPSILON || remaining <= 0.0 {
            return true;
        }

        let step = (speed * dt as f32).min(remaining);
        self.dash.travelled = if step >= remaining {
            distance
        } else {
            self.dash.travelled + step
        };
        pose.position += self.dash.direction * step;

        for (entity, _) in arena.damageables_within(pose.position, hit_radius) {
            arena.deal_damage(entity, self.damage);
        }

        self.dash.travelled >= distance
    }

    fn begin_recovery(&mut self) {
        self.phase = AttackPhase::Recovery;
        crate::logger::log(&format!("⚔️ {}: recovery", self.name));
        self.on_cue.emit(&AttackCue::Recovery);
    }
}
