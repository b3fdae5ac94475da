//! Boss behavior controller (top-level FSM)
//!
//! Idle → Chase → Attack → Chase ... + Stagger, PhaseTransition, Dead.
//!
//! Архитектура:
//! - `state`: единственный источник истины, мутируется только здесь
//! - think loop опрашивает цель раз в `think_interval` (не каждый tick)
//! - attack units и таймеры Stagger/PhaseTransition тикают каждый tick
//! - события здоровья приходят синхронно через [`BossController::handle_health`]

use bevy::prelude::*;
use rand::Rng;

use super::navigation::NavigationService;
use crate::combat::{AttackProgress, AttackUnit, CombatArena};
use crate::health::{HealthEvent, HealthReport};
use crate::shared::Pose;

/// Boss FSM состояния. `Dead` терминальное.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum BossState {
    #[default]
    Idle,
    Chase,
    Attack,
    Stagger,
    PhaseTransition,
    Dead,
}

impl BossState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BossState::Idle => "Idle",
            BossState::Chase => "Chase",
            BossState::Attack => "Attack",
            BossState::Stagger => "Stagger",
            BossState::PhaseTransition => "PhaseTransition",
            BossState::Dead => "Dead",
        }
    }
}

/// Movement/AI параметры босса
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct BossTuning {
    /// Радиус обнаружения цели (метры)
    pub detect_range: f32,
    /// Дистанция, с которой начинается атака
    pub attack_range: f32,
    pub chase_stop_distance: f32,
    /// Период think loop (секунды)
    pub think_interval: f64,
    pub stagger_duration: f64,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            detect_range: 20.0,
            attack_range: 4.0,
            chase_stop_distance: 2.5,
            think_interval: 0.2,
            stagger_duration: 0.6,
        }
    }
}

/// Escalation applied once at half health.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PhaseTwoTuning {
    pub range_bonus: f32,
    pub cooldown_factor: f64,
    pub cooldown_floor: f64,
    pub damage_factor: f64,
    /// No new attacks during this grace period
    pub grace: f64,
}

impl Default for PhaseTwoTuning {
    fn default() -> Self {
        Self {
            range_bonus: 1.0,
            cooldown_factor: 0.7,
            cooldown_floor: 0.4,
            damage_factor: 1.25,
            grace: 1.2,
        }
    }
}

/// Outbox of things the ECS layer turns into `BossSignalEvent`s.
#[derive(Debug, Clone, PartialEq)]
pub enum BossSignal {
    StateChanged { from: BossState, to: BossState },
    AttackStarted { name: String },
    AttackFinished { name: String },
    PhaseTwo,
}

/// Контроллер босса
///
/// Владеет attack units (composed, not shared). Цель хранится как weak
/// handle и каждый think заново резолвится через [`CombatArena::locate`].
#[derive(Component, Debug)]
pub struct BossController {
    tuning: BossTuning,
    phase_two_tuning: PhaseTwoTuning,
    attacks: Vec<AttackUnit>,
    target: Option<Entity>,
    state: BossState,
    phase_two: bool,
    enabled: bool,
    /// Seconds until the next think (≤ 0 → think this tick)
    think_timer: f64,
    /// Remaining Stagger / PhaseTransition time
    state_timer: f64,
    active_attack: Option<usize>,
    signals: Vec<BossSignal>,
}

impl BossController {
    pub fn new(tuning: BossTuning, phase_two_tuning: PhaseTwoTuning, attacks: Vec<AttackUnit>) -> Self {
        Self {
            tuning,
            phase_two_tuning,
            attacks,
            target: None,
            state: BossState::Idle,
            phase_two: false,
            enabled: false,
            think_timer: 0.0,
            state_timer: 0.0,
            active_attack: None,
            signals: Vec::new(),
        }
    }

    pub fn state(&self) -> BossState {
        self.state
    }

    pub fn tuning(&self) -> &BossTuning {
        &self.tuning
    }

    pub fn attack_range(&self) -> f32 {
        self.tuning.attack_range
    }

    pub fn is_phase_two(&self) -> bool {
        self.phase_two
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_dead(&self) -> bool {
        self.state == BossState::Dead
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn attacks(&self) -> &[AttackUnit] {
        &self.attacks
    }

    /// For wiring observers (SFX, UI) onto individual units.
    pub fn attacks_mut(&mut self) -> &mut [AttackUnit] {
        &mut self.attacks
    }

    /// Unit whose routine is in flight.
    pub fn active_attack(&self) -> Option<&AttackUnit> {
        self.active_attack.and_then(|index| self.attacks.get(index))
    }

    /// Encounter gate. Wires `target` only if none is set yet.
    pub fn activate(&mut self, target: Option<Entity>) {
        if self.target.is_none() {
            self.target = target;
        }
        if !self.enabled {
            self.enabled = true;
            self.think_timer = 0.0;
            crate::logger::log(&format!("🐉 Boss: activated (target: {:?})", self.target));
        }
    }

    pub fn drain_signals(&mut self) -> Vec<BossSignal> {
        std::mem::take(&mut self.signals)
    }

    /// One simulation tick.
    ///
    /// Order: attack units (cooldowns run independently of state), state
    /// timers, then the think loop.
    pub fn tick<R: Rng>(
        &mut self,
        dt: f64,
        pose: &mut Pose,
        nav: &mut dyn NavigationService,
        arena: &mut dyn CombatArena,
        rng: &mut R,
    ) {
        if !self.enabled || dt <= 0.0 {
            return;
        }

        self.tick_attacks(dt, pose, arena);
        self.tick_state_timer(dt);

        if self.state == BossState::Dead {
            return;
        }
        self.think_timer -= dt;
        if self.think_timer > 0.0 {
            return;
        }
        self.think_timer = (self.think_timer + self.tuning.think_interval).max(0.0);
        self.think(pose, nav, arena, rng);
    }

    /// Synchronous health routing (half health → phase two, death → Dead).
    pub fn handle_health(&mut self, report: &HealthReport, nav: &mut dyn NavigationService) {
        for event in &report.events {
            match event {
                HealthEvent::HalfHealth => self.enter_phase_two(),
                HealthEvent::Death => self.die(nav),
                HealthEvent::Changed(_) => {}
            }
        }
    }

    /// Interrupt pursuit for `stagger_duration`. Only from Idle/Chase.
    pub fn stagger(&mut self, nav: &mut dyn NavigationService) -> bool {
        if !matches!(self.state, BossState::Idle | BossState::Chase) {
            return false;
        }
        nav.stop();
        self.state_timer = self.tuning.stagger_duration;
        self.set_state(BossState::Stagger);
        true
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn tick_attacks(&mut self, dt: f64, pose: &mut Pose, arena: &mut dyn CombatArena) {
        let mut finished = None;
        for (index, unit) in self.attacks.iter_mut().enumerate() {
            let progress = unit.tick(dt, pose, arena);
            if progress == Some(AttackProgress::Finished) && self.active_attack == Some(index) {
                finished = Some(unit.name().to_string());
            }
        }

        let Some(name) = finished else {
            return;
        };
        self.active_attack = None;
        self.signals.push(BossSignal::AttackFinished { name });

        // PhaseTransition: выход решает grace таймер; Dead терминальное
        if self.state == BossState::Attack {
            self.set_state(BossState::Chase);
        }
    }

    fn tick_state_timer(&mut self, dt: f64) {
        if !matches!(self.state, BossState::Stagger | BossState::PhaseTransition) {
            return;
        }
        self.state_timer -= dt;
        if self.state_timer > 0.0 {
            return;
        }
        self.state_timer = 0.0;
        let next = if self.active_attack.is_some() {
            BossState::Attack
        } else {
            BossState::Chase
        };
        self.set_state(next);
    }

    fn think<R: Rng>(
        &mut self,
        pose: &Pose,
        nav: &mut dyn NavigationService,
        arena: &mut dyn CombatArena,
        rng: &mut R,
    ) {
        match self.state {
            BossState::Idle => {
                if self.target.is_none() {
                    self.target = arena.acquire_target();
                    if let Some(target) = self.target {
                        crate::logger::log(&format!("🐉 Boss: acquired target {:?}", target));
                    }
                }
                let Some(target) = self.target else {
                    return;
                };
                let Some(target_pos) = arena.locate(target) else {
                    // stale handle, перезахват на следующем think
                    self.target = None;
                    return;
                };
                if pose.position.distance(target_pos) <= self.tuning.detect_range {
                    self.set_state(BossState::Chase);
                }
            }
            BossState::Chase => {
                let Some(target_pos) = self.target.and_then(|target| arena.locate(target)) else {
                    self.target = None;
                    self.set_state(BossState::Idle);
                    return;
                };

                if nav.distance_to(target_pos) > self.tuning.attack_range {
                    if !nav.is_path_pending() {
                        nav.set_stopping_distance(self.tuning.chase_stop_distance);
                        nav.set_destination(target_pos);
                    }
                } else {
                    nav.stop();
                    self.try_attack(rng);
                }
            }
            // Attack / Stagger / PhaseTransition ведутся своими таймерами
            BossState::Attack | BossState::Stagger | BossState::PhaseTransition | BossState::Dead => {}
        }
    }

    /// Uniform pick among ready units; none ready → stay in Chase.
    fn try_attack<R: Rng>(&mut self, rng: &mut R) {
        if self.active_attack.is_some() {
            return;
        }

        let ready: Vec<usize> = self
            .attacks
            .iter()
            .enumerate()
            .filter(|(_, unit)| unit.can_use())
            .map(|(index, _)| index)
            .collect();
        if ready.is_empty() {
            return;
        }

        let index = ready[rng.gen_range(0..ready.len())];
        let target = self.target;
        let Some(unit) = self.attacks.get_mut(index) else {
            return;
        };
        if !unit.try_execute(target) {
            return;
        }
        let name = unit.name().to_string();

        self.active_attack = Some(index);
        self.set_state(BossState::Attack);
        self.signals.push(BossSignal::AttackStarted { name });
    }

    fn enter_phase_two(&mut self) {
        if self.phase_two {
            return;
        }
        self.phase_two = true;

        let tuning = self.phase_two_tuning;
        self.tuning.attack_range += tuning.range_bonus;
        for unit in &mut self.attacks {
            unit.scale_for_phase_two(tuning.cooldown_factor, tuning.cooldown_floor, tuning.damage_factor);
        }
        crate::logger::log(&format!(
            "🔥 Boss: phase two (attack range {:.1}, grace {:.1}s)",
            self.tuning.attack_range, tuning.grace
        ));
        self.signals.push(BossSignal::PhaseTwo);

        if self.state != BossState::Dead {
            self.state_timer = tuning.grace;
            self.set_state(BossState::PhaseTransition);
        }
    }

    fn die(&mut self, nav: &mut dyn NavigationService) {
        if self.state == BossState::Dead {
            return;
        }
        self.set_state(BossState::Dead);
        nav.stop();
        for unit in &mut self.attacks {
            unit.disable();
        }
    }

    fn set_state(&mut self, to: BossState) {
        let from = self.state;
        if from == to || from == BossState::Dead {
            return;
        }
        crate::logger::log(&format!("🐉 Boss: {} → {}", from.as_str(), to.as_str()));
        self.state = to;
        self.signals.push(BossSignal::StateChanged { from, to });
    }
}
