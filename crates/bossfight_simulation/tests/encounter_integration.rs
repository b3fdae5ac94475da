//! Encounter integration test
//!
//! Полный headless App: trigger → boss AI → attack units → health → music/UI.
//!
//! Проверяем:
//! - активация encounter'а один раз (барьеры, музыка, health bar)
//! - босс догоняет и бьёт игрока
//! - удары игрока: hit stop, stagger, phase two, смерть босса

use bevy::prelude::*;
use bossfight_simulation::ai::BossSignal;
use bossfight_simulation::encounter::{Barrier, EncounterTeardown, HealthBarHandle, MusicHandle};
use bossfight_simulation::*;

/// Входы, которые тест подаёт в следующий tick
#[derive(Resource, Default)]
struct PendingInput {
    strikes: Vec<PlayerStrike>,
    teardowns: Vec<EncounterTeardown>,
}

/// Что увидели внешние подписчики
#[derive(Resource, Default)]
struct Recorded {
    activations: Vec<EncounterActivated>,
    signals: Vec<BossSignal>,
    half_health: Vec<Entity>,
    deaths: Vec<Entity>,
}

fn inject_input(
    mut pending: ResMut<PendingInput>,
    mut strikes: EventWriter<PlayerStrike>,
    mut teardowns: EventWriter<EncounterTeardown>,
) {
    for strike in pending.strikes.drain(..) {
        strikes.write(strike);
    }
    for teardown in pending.teardowns.drain(..) {
        teardowns.write(teardown);
    }
}

fn record_events(
    mut recorded: ResMut<Recorded>,
    mut activations: EventReader<EncounterActivated>,
    mut signals: EventReader<BossSignalEvent>,
    mut half_health: EventReader<HalfHealthReached>,
    mut deaths: EventReader<EntityDied>,
) {
    recorded.activations.extend(activations.read().copied());
    recorded.signals.extend(signals.read().map(|event| event.signal.clone()));
    recorded.half_health.extend(half_health.read().map(|event| event.entity));
    recorded.deaths.extend(deaths.read().map(|event| event.entity));
}

/// Helper: App + encounter из конфига
fn create_encounter_app(config: &EncounterConfig) -> (App, EncounterEntities) {
    let mut app = create_headless_app(config.seed);
    let entities = spawn_encounter(app.world_mut(), config);

    app.init_resource::<PendingInput>()
        .init_resource::<Recorded>()
        .add_systems(
            FixedUpdate,
            (
                inject_input
                    .after(SimulationSet::Feedback)
                    .before(SimulationSet::Encounter),
                record_events.after(SimulationSet::Presentation),
            ),
        );

    (app, entities)
}

fn step(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.update();
    }
}

fn strike(app: &mut App, target: Entity, damage: f64, stagger: bool) {
    app.world_mut()
        .resource_mut::<PendingInput>()
        .strikes
        .push(PlayerStrike {
            target,
            damage,
            stagger,
        });
}

fn controller(app: &App, boss: Entity) -> &BossController {
    app.world().get::<BossController>(boss).unwrap()
}

fn position(app: &App, entity: Entity) -> Vec3 {
    app.world().get::<Transform>(entity).unwrap().translation
}

fn health(app: &App, entity: Entity) -> f64 {
    app.world().get::<Health>(entity).unwrap().current()
}

#[test]
fn test_player_in_zone_activates_encounter_once() {
    let (mut app, entities) = create_encounter_app(&EncounterConfig::default());
    step(&mut app, 3);

    let recorded = app.world().resource::<Recorded>();
    assert_eq!(recorded.activations.len(), 1);
    assert_eq!(recorded.activations[0].boss, entities.boss);
    assert_eq!(recorded.activations[0].target, entities.player);

    for barrier in &entities.barriers {
        assert!(app.world().get::<Barrier>(*barrier).unwrap().active);
    }
    assert!(controller(&app, entities.boss).is_enabled());
    assert_eq!(controller(&app, entities.boss).target(), Some(entities.player));

    let music = app.world().resource::<MusicHandle>().clone();
    assert_eq!(music.lock().now_playing(), Some("boss_intro"));

    let bar = app.world().resource::<HealthBarHandle>().snapshot();
    assert!(bar.visible);
    assert_eq!(bar.name, "Lele Troll Goyeng");
    assert_eq!(bar.value, 1000.0);

    let boss_health = app.world().get::<Health>(entities.boss).unwrap();
    assert_eq!(boss_health.half_health_subscribers(), 1);
    assert_eq!(boss_health.health_changed_subscribers(), 1);

    // Повторные тики в зоне: никакой повторной активации
    step(&mut app, 60);
    assert_eq!(app.world().resource::<Recorded>().activations.len(), 1);
    assert_eq!(
        app.world().get::<Health>(entities.boss).unwrap().half_health_subscribers(),
        1
    );
}

#[test]
fn test_boss_stays_dormant_until_player_enters() {
    let mut config = EncounterConfig::default();
    config.player.position = [0.0, 0.0, 30.0];
    let (mut app, entities) = create_encounter_app(&config);

    step(&mut app, 120);

    assert!(!controller(&app, entities.boss).is_enabled());
    assert_eq!(controller(&app, entities.boss).state(), BossState::Idle);
    assert_eq!(position(&app, entities.boss), Vec3::ZERO);
    assert!(app.world().resource::<Recorded>().activations.is_empty());
    for barrier in &entities.barriers {
        assert!(!app.world().get::<Barrier>(*barrier).unwrap().active);
    }

    app.world_mut()
        .get_mut::<Transform>(entities.player)
        .unwrap()
        .translation = Vec3::new(0.0, 0.0, 11.0);
    step(&mut app, 2);

    assert_eq!(app.world().resource::<Recorded>().activations.len(), 1);
    assert!(controller(&app, entities.boss).is_enabled());
}

#[test]
fn test_boss_hunts_and_damages_player() {
    let (mut app, entities) = create_encounter_app(&EncounterConfig::default());

    let mut ticks = 0;
    while health(&app, entities.player) >= 200.0 && ticks < 900 {
        app.update();
        ticks += 1;
    }

    assert!(
        health(&app, entities.player) < 200.0,
        "player untouched after {} ticks",
        ticks
    );
    assert!(position(&app, entities.boss).z > 3.0, "boss never closed in");

    let recorded = app.world().resource::<Recorded>();
    assert!(recorded
        .signals
        .iter()
        .any(|signal| matches!(signal, BossSignal::AttackStarted { .. })));
    assert!(recorded.signals.contains(&BossSignal::StateChanged {
        from: BossState::Idle,
        to: BossState::Chase,
    }));
}

#[test]
fn test_hit_stop_freezes_boss() {
    let (mut app, entities) = create_encounter_app(&EncounterConfig::default());
    step(&mut app, 40);

    let before = position(&app, entities.boss);
    assert!(before.z > 0.5, "boss should be chasing by now");

    strike(&mut app, entities.boss, 10.0, false);
    step(&mut app, 1);
    assert_eq!(position(&app, entities.boss), before);
    assert_eq!(health(&app, entities.boss), 990.0);

    step(&mut app, 20);
    assert!(position(&app, entities.boss).z > before.z);
}

#[test]
fn test_heavy_strike_staggers_chasing_boss() {
    let (mut app, entities) = create_encounter_app(&EncounterConfig::default());
    step(&mut app, 40);
    assert_eq!(controller(&app, entities.boss).state(), BossState::Chase);

    strike(&mut app, entities.boss, 10.0, true);
    step(&mut app, 1);
    assert_eq!(controller(&app, entities.boss).state(), BossState::Stagger);

    step(&mut app, 60);
    assert_ne!(controller(&app, entities.boss).state(), BossState::Stagger);
}

#[test]
fn test_half_health_enters_phase_two_and_switches_music() {
    let (mut app, entities) = create_encounter_app(&EncounterConfig::default());
    step(&mut app, 3);

    for _ in 0..5 {
        strike(&mut app, entities.boss, 100.0, false);
    }
    step(&mut app, 1);

    let boss = controller(&app, entities.boss);
    assert!(boss.is_phase_two());
    assert_eq!(boss.state(), BossState::PhaseTransition);
    assert_eq!(boss.attacks()[0].damage(), 35.0 * 1.25);
    assert_eq!(boss.attack_range(), 5.0);
    assert_eq!(app.world().resource::<Recorded>().half_health, vec![entities.boss]);
    assert_eq!(app.world().resource::<HealthBarHandle>().snapshot().value, 500.0);

    step(&mut app, 120);

    let music = app.world().resource::<MusicHandle>().clone();
    assert_eq!(music.lock().now_playing(), Some("boss_phase2"));
    assert!(!music.lock().phase_one_pending());
    assert_ne!(controller(&app, entities.boss).state(), BossState::PhaseTransition);

    // ниже 50% ещё раз: без повторной эскалации
    strike(&mut app, entities.boss, 100.0, false);
    step(&mut app, 1);
    let recorded = app.world().resource::<Recorded>();
    assert_eq!(recorded.half_health.len(), 1);
    assert_eq!(
        recorded
            .signals
            .iter()
            .filter(|signal| **signal == BossSignal::PhaseTwo)
            .count(),
        1
    );
    assert_eq!(controller(&app, entities.boss).attacks()[0].damage(), 35.0 * 1.25);
}

#[test]
fn test_lethal_strike_kills_boss() {
    let (mut app, entities) = create_encounter_app(&EncounterConfig::default());
    step(&mut app, 3);

    strike(&mut app, entities.boss, 2000.0, false);
    step(&mut app, 1);

    assert_eq!(controller(&app, entities.boss).state(), BossState::Dead);
    assert!(app.world().resource::<Recorded>().deaths.contains(&entities.boss));
    assert!(!app.world().resource::<HealthBarHandle>().snapshot().visible);

    let resting = position(&app, entities.boss);
    step(&mut app, 300);

    let boss = controller(&app, entities.boss);
    assert_eq!(boss.state(), BossState::Dead);
    assert!(boss.attacks().iter().all(|unit| !unit.can_use()));
    assert_eq!(position(&app, entities.boss), resting);
    assert_eq!(health(&app, entities.player), 200.0);
}

#[test]
fn test_teardown_removes_phase_two_music_cue() {
    let (mut app, entities) = create_encounter_app(&EncounterConfig::default());
    step(&mut app, 3);

    app.world_mut()
        .resource_mut::<PendingInput>()
        .teardowns
        .push(EncounterTeardown {
            trigger: entities.trigger,
        });
    step(&mut app, 1);
    assert_eq!(
        app.world().get::<Health>(entities.boss).unwrap().half_health_subscribers(),
        0
    );

    for _ in 0..5 {
        strike(&mut app, entities.boss, 100.0, false);
    }
    step(&mut app, 120);

    let music = app.world().resource::<MusicHandle>().clone();
    assert_ne!(music.lock().now_playing(), Some("boss_phase2"));
    assert!(controller(&app, entities.boss).is_phase_two());
}

#[test]
fn test_bundled_asset_matches_built_in_presets() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/encounter.ron");
    let config = EncounterConfig::load(path).unwrap();
    assert_eq!(config, EncounterConfig::default());
}
