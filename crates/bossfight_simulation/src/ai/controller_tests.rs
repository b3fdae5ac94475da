//! Tests for the boss behavior controller.

use super::controller::*;
use super::navigation::NavigationService;
use crate::combat::test_support::TestArena;
use crate::combat::{AttackKind, AttackTiming, AttackUnit, NoFeedback};
use crate::health::Health;
use crate::shared::Pose;
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

const DT: f64 = 1.0 / 60.0;

#[derive(Default)]
struct RecordingNav {
    position: Vec3,
    destinations: Vec<Vec3>,
    stopping_distance: f32,
    stopped: bool,
    stop_calls: usize,
    pending: bool,
}

impl NavigationService for RecordingNav {
    fn set_destination(&mut self, point: Vec3) {
        self.destinations.push(point);
        self.stopped = false;
    }

    fn set_stopping_distance(&mut self, distance: f32) {
        self.stopping_distance = distance;
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.stop_calls += 1;
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn is_path_pending(&self) -> bool {
        self.pending
    }

    fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }
}

fn default_attacks() -> Vec<AttackUnit> {
    vec![
        AttackUnit::cleave(Arc::new(NoFeedback)),
        AttackUnit::dash(Arc::new(NoFeedback)),
        AttackUnit::slam(Arc::new(NoFeedback)),
    ]
}

struct Rig {
    boss: BossController,
    pose: Pose,
    nav: RecordingNav,
    arena: TestArena,
    rng: ChaCha8Rng,
    player: Entity,
    signals: Vec<BossSignal>,
}

impl Rig {
    fn new(attacks: Vec<AttackUnit>, player_at: Vec3) -> Self {
        let arena = TestArena::with_player(player_at, 1000.0);
        let player = arena.player.unwrap();
        Self {
            boss: BossController::new(BossTuning::default(), PhaseTwoTuning::default(), attacks),
            pose: Pose::default(),
            nav: RecordingNav::default(),
            arena,
            rng: ChaCha8Rng::seed_from_u64(42),
            player,
            signals: Vec::new(),
        }
    }

    fn tick(&mut self) {
        self.boss
            .tick(DT, &mut self.pose, &mut self.nav, &mut self.arena, &mut self.rng);
        self.nav.position = self.pose.position;
        self.signals.extend(self.boss.drain_signals());
    }

    fn run(&mut self, seconds: f64) {
        for _ in 0..(seconds / DT).round() as usize {
            self.tick();
        }
    }

    fn run_until(&mut self, done: impl Fn(&BossController) -> bool) {
        for _ in 0..2000 {
            self.tick();
            if done(&self.boss) {
                return;
            }
        }
        panic!("controller never reached the expected condition");
    }

    fn busy_units(&self) -> usize {
        self.boss.attacks().iter().filter(|unit| unit.is_busy()).count()
    }

    fn count(&self, wanted: &BossSignal) -> usize {
        self.signals.iter().filter(|signal| *signal == wanted).count()
    }
}

#[test]
fn test_tuning_defaults() {
    let tuning = BossTuning::default();
    assert_eq!(tuning.detect_range, 20.0);
    assert_eq!(tuning.attack_range, 4.0);
    assert_eq!(tuning.chase_stop_distance, 2.5);
    assert_eq!(tuning.think_interval, 0.2);

    let phase_two = PhaseTwoTuning::default();
    assert_eq!(phase_two.grace, 1.2);
    assert_eq!(phase_two.cooldown_floor, 0.4);
}

#[test]
fn test_inactive_controller_does_nothing() {
    let mut rig = Rig::new(default_attacks(), Vec3::new(3.0, 0.0, 0.0));
    rig.run(1.0);

    assert_eq!(rig.boss.state(), BossState::Idle);
    assert_eq!(rig.boss.target(), None);
    assert!(rig.nav.destinations.is_empty());
    assert!(rig.signals.is_empty());
}

#[test]
fn test_idle_acquires_target_and_chases_within_detect_range() {
    let mut rig = Rig::new(default_attacks(), Vec3::new(10.0, 0.0, 0.0));
    rig.boss.activate(None);
    rig.tick();

    assert_eq!(rig.boss.target(), Some(rig.player));
    assert_eq!(rig.boss.state(), BossState::Chase);
    assert_eq!(
        rig.signals,
        vec![BossSignal::StateChanged {
            from: BossState::Idle,
            to: BossState::Chase
        }]
    );
}

#[test]
fn test_idle_keeps_waiting_when_target_out_of_range() {
    let mut rig = Rig::new(default_attacks(), Vec3::new(30.0, 0.0, 0.0));
    rig.boss.activate(None);
    rig.run(1.0);

    assert_eq!(rig.boss.target(), Some(rig.player));
    assert_eq!(rig.boss.state(), BossState::Idle);

    rig.arena.move_actor(rig.player, Vec3::new(15.0, 0.0, 0.0));
    rig.run(0.25);
    assert_eq!(rig.boss.state(), BossState::Chase);
}

#[test]
fn test_chase_moves_without_attacking_then_attacks_in_range() {
    let mut rig = Rig::new(default_attacks(), Vec3::new(10.0, 0.0, 0.0));
    rig.boss.activate(None);
    rig.run(0.5);

    assert_eq!(rig.boss.state(), BossState::Chase);
    assert!(!rig.nav.destinations.is_empty());
    assert_eq!(rig.nav.destinations.last(), Some(&Vec3::new(10.0, 0.0, 0.0)));
    assert_eq!(rig.nav.stopping_distance, 2.5);
    assert!(!rig.nav.stopped);
    assert_eq!(rig.busy_units(), 0);

    rig.arena.move_actor(rig.player, Vec3::new(3.0, 0.0, 0.0));
    rig.run(0.25);

    assert_eq!(rig.boss.state(), BossState::Attack);
    assert!(rig.nav.stopped);
    assert_eq!(rig.busy_units(), 1);
    assert!(rig
        .signals
        .iter()
        .any(|signal| matches!(signal, BossSignal::AttackStarted { .. })));
}

#[test]
fn test_path_pending_skips_new_destination() {
    let mut rig = Rig::new(default_attacks(), Vec3::new(10.0, 0.0, 0.0));
    rig.nav.pending = true;
    rig.boss.activate(None);
    rig.run(1.0);

    assert_eq!(rig.boss.state(), BossState::Chase);
    assert!(rig.nav.destinations.is_empty());
}

#[test]
fn test_attack_returns_to_chase_when_routine_finishes() {
    let mut rig = Rig::new(
        vec![AttackUnit::cleave(Arc::new(NoFeedback))],
        Vec3::new(3.0, 0.0, 0.0),
    );
    rig.boss.activate(None);
    rig.run_until(|boss| boss.state() == BossState::Attack);
    rig.run(1.5);

    assert_eq!(rig.boss.state(), BossState::Chase);
    assert!(rig.boss.active_attack().is_none());

    let finished = rig
        .signals
        .iter()
        .position(|signal| {
            *signal
                == BossSignal::AttackFinished {
                    name: "Cleave".to_string(),
                }
        })
        .expect("attack finished");
    assert_eq!(
        rig.signals[finished + 1],
        BossSignal::StateChanged {
            from: BossState::Attack,
            to: BossState::Chase
        }
    );
    assert_eq!(rig.arena.actor(rig.player).hits, vec![35.0]);
}

#[test]
fn test_no_ready_unit_stays_in_chase() {
    let mut unit = AttackUnit::cleave(Arc::new(NoFeedback));
    unit.disable();
    let mut rig = Rig::new(vec![unit], Vec3::new(3.0, 0.0, 0.0));
    rig.boss.activate(None);
    rig.run(1.0);

    assert_eq!(rig.boss.state(), BossState::Chase);
    assert!(rig.nav.stopped);
    assert!(rig.nav.stop_calls > 1);
    assert!(!rig
        .signals
        .iter()
        .any(|signal| matches!(signal, BossSignal::AttackStarted { .. })));
}

#[test]
fn test_phase_two_enters_once_and_scales_once() {
    let mut rig = Rig::new(default_attacks(), Vec3::new(3.0, 0.0, 0.0));
    let mut health = Health::new(1000.0);
    rig.boss.activate(None);

    let report = health.apply_damage(500.0);
    rig.boss.handle_health(&report, &mut rig.nav);
    rig.signals.extend(rig.boss.drain_signals());

    assert!(rig.boss.is_phase_two());
    assert_eq!(rig.boss.state(), BossState::PhaseTransition);
    assert_eq!(rig.boss.attack_range(), 5.0);
    let cleave = &rig.boss.attacks()[0];
    assert!((cleave.timing().cooldown - 2.1).abs() < 1e-9);
    assert!((cleave.damage() - 43.75).abs() < 1e-9);

    // 40%, 30%, 10%
    for amount in [100.0, 100.0, 200.0] {
        let report = health.apply_damage(amount);
        rig.boss.handle_health(&report, &mut rig.nav);
    }
    rig.signals.extend(rig.boss.drain_signals());

    assert_eq!(rig.boss.attack_range(), 5.0);
    assert!((rig.boss.attacks()[0].timing().cooldown - 2.1).abs() < 1e-9);
    assert_eq!(rig.count(&BossSignal::PhaseTwo), 1);
    assert_eq!(
        rig.count(&BossSignal::StateChanged {
            from: BossState::Idle,
            to: BossState::PhaseTransition
        }),
        1
    );
}

#[test]
fn test_phase_transition_grace_blocks_attacks() {
    let mut rig = Rig::new(default_attacks(), Vec3::new(3.0, 0.0, 0.0));
    let mut health = Health::new(1000.0);
    rig.boss.activate(None);

    let report = health.apply_damage(500.0);
    rig.boss.handle_health(&report, &mut rig.nav);

    rig.run(1.0);
    assert_eq!(rig.boss.state(), BossState::PhaseTransition);
    assert_eq!(rig.busy_units(), 0);

    rig.run(0.5);
    assert_ne!(rig.boss.state(), BossState::PhaseTransition);
    assert!(rig.signals.contains(&BossSignal::StateChanged {
        from: BossState::PhaseTransition,
        to: BossState::Chase
    }));
}

#[test]
fn test_phase_transition_during_attack_resumes_attack() {
    let heavy = AttackUnit::new(
        "Heavy",
        AttackTiming::new(0.2, 0.2, 3.0, 1.0),
        10.0,
        AttackKind::Slam {
            radius: 4.0,
            shockwave_force: 0.0,
            impact_offset: Vec3::ZERO,
        },
        Arc::new(NoFeedback),
    );
    let mut rig = Rig::new(vec![heavy], Vec3::new(3.0, 0.0, 0.0));
    let mut health = Health::new(1000.0);
    rig.boss.activate(None);
    rig.run_until(|boss| boss.state() == BossState::Attack);

    let report = health.apply_damage(700.0);
    rig.boss.handle_health(&report, &mut rig.nav);
    assert_eq!(rig.boss.state(), BossState::PhaseTransition);

    rig.run(1.3);
    assert_eq!(rig.boss.state(), BossState::Attack);
    assert!(rig.boss.active_attack().is_some());

    rig.run(2.5);
    assert_eq!(rig.boss.state(), BossState::Chase);
    assert!(rig.signals.contains(&BossSignal::AttackFinished {
        name: "Heavy".to_string()
    }));
}

#[test]
fn test_death_is_terminal_and_stops_think_loop() {
    let mut rig = Rig::new(default_attacks(), Vec3::new(10.0, 0.0, 0.0));
    let mut health = Health::new(1000.0);
    rig.boss.activate(None);
    rig.run(0.5);
    assert_eq!(rig.boss.state(), BossState::Chase);

    let report = health.apply_damage(5000.0);
    rig.boss.handle_health(&report, &mut rig.nav);

    assert_eq!(rig.boss.state(), BossState::Dead);
    assert!(rig.nav.stopped);
    assert!(rig.boss.attacks().iter().all(|unit| !unit.can_use()));

    let destinations = rig.nav.destinations.len();
    rig.arena.move_actor(rig.player, Vec3::new(2.0, 0.0, 0.0));
    rig.run(2.0);

    assert_eq!(rig.boss.state(), BossState::Dead);
    assert_eq!(rig.nav.destinations.len(), destinations);
    assert_eq!(rig.busy_units(), 0);
    assert!(!rig.boss.stagger(&mut rig.nav));
}

#[test]
fn test_death_mid_routine_completes_routine_but_stays_dead() {
    let mut rig = Rig::new(
        vec![AttackUnit::slam(Arc::new(NoFeedback))],
        Vec3::new(3.0, 0.0, 0.0),
    );
    let mut health = Health::new(100.0);
    rig.boss.activate(None);
    rig.run_until(|boss| boss.state() == BossState::Attack);

    let report = health.apply_damage(100.0);
    rig.boss.handle_health(&report, &mut rig.nav);
    rig.run(3.0);

    assert_eq!(rig.boss.state(), BossState::Dead);
    // half health and death arrive together: damage already escalated
    assert_eq!(rig.arena.actor(rig.player).hits, vec![45.0 * 1.25]);
    assert!(rig.signals.contains(&BossSignal::AttackFinished {
        name: "Slam".to_string()
    }));
    assert!(!rig.signals.contains(&BossSignal::StateChanged {
        from: BossState::Dead,
        to: BossState::Chase
    }));
}

#[test]
fn test_stagger_interrupts_chase_then_resumes() {
    let mut rig = Rig::new(default_attacks(), Vec3::new(10.0, 0.0, 0.0));
    rig.boss.activate(None);
    rig.run(0.5);

    assert!(rig.boss.stagger(&mut rig.nav));
    assert_eq!(rig.boss.state(), BossState::Stagger);
    assert!(rig.nav.stopped);

    let destinations = rig.nav.destinations.len();
    rig.run(0.3);
    assert_eq!(rig.boss.state(), BossState::Stagger);
    assert_eq!(rig.nav.destinations.len(), destinations);

    rig.run(0.4);
    assert_eq!(rig.boss.state(), BossState::Chase);
}

#[test]
fn test_stagger_rejected_while_attacking() {
    let mut rig = Rig::new(default_attacks(), Vec3::new(3.0, 0.0, 0.0));
    rig.boss.activate(None);
    rig.run_until(|boss| boss.state() == BossState::Attack);

    assert!(!rig.boss.stagger(&mut rig.nav));
    assert_eq!(rig.boss.state(), BossState::Attack);
}

#[test]
fn test_lost_target_falls_back_to_idle_and_reacquires() {
    let mut rig = Rig::new(default_attacks(), Vec3::new(10.0, 0.0, 0.0));
    rig.boss.activate(None);
    rig.run(0.5);
    assert_eq!(rig.boss.state(), BossState::Chase);

    rig.arena.remove(rig.player);
    rig.run(0.3);
    assert_eq!(rig.boss.state(), BossState::Idle);
    assert_eq!(rig.boss.target(), None);

    let respawned = rig.arena.spawn(Vec3::new(8.0, 0.0, 0.0), 1000.0);
    rig.arena.player = Some(respawned);
    rig.run(0.3);

    assert_eq!(rig.boss.target(), Some(respawned));
    assert_eq!(rig.boss.state(), BossState::Chase);
}

fn first_pick(rng: &mut ChaCha8Rng) -> String {
    let mut rig = Rig::new(default_attacks(), Vec3::new(3.0, 0.0, 0.0));
    std::mem::swap(&mut rig.rng, rng);
    rig.boss.activate(None);
    rig.run_until(|boss| boss.state() == BossState::Attack);
    std::mem::swap(&mut rig.rng, rng);

    rig.boss
        .active_attack()
        .map(|unit| unit.name().to_string())
        .expect("attack in flight")
}

#[test]
fn test_selection_is_random_among_ready_units() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let picks: Vec<String> = (0..40).map(|_| first_pick(&mut rng)).collect();

    for name in ["Cleave", "Dash", "Slam"] {
        assert!(picks.iter().any(|pick| pick == name), "{} never picked", name);
    }
}

#[test]
fn test_same_seed_same_choices() {
    let mut a = ChaCha8Rng::seed_from_u64(99);
    let mut b = ChaCha8Rng::seed_from_u64(99);

    let first: Vec<String> = (0..10).map(|_| first_pick(&mut a)).collect();
    let second: Vec<String> = (0..10).map(|_| first_pick(&mut b)).collect();
    assert_eq!(first, second);
}

#[test]
fn test_activate_keeps_existing_target() {
    let mut boss = BossController::new(BossTuning::default(), PhaseTwoTuning::default(), default_attacks());
    let first = Entity::from_raw(10);
    let second = Entity::from_raw(11);

    boss.activate(Some(first));
    boss.activate(Some(second));

    assert!(boss.is_enabled());
    assert_eq!(boss.target(), Some(first));
}
