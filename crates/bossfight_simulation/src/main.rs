//! Headless симуляция BOSSFIGHT
//!
//! Запускает encounter без рендера: player стоит в trigger зоне,
//! опционально бьёт босса в ближнем бою (`--strike-damage`).

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use bevy::prelude::*;
use clap::Parser;

use bossfight_simulation::logger::{self, LogLevel};
use bossfight_simulation::{
    create_headless_app, spawn_encounter, BossSignalEvent, EncounterConfig, EncounterSnapshot, EntityDied,
    PlayerStrike, TICK_RATE,
};

/// Headless boss encounter simulator
#[derive(Parser, Debug)]
#[command(name = "bossfight")]
#[command(about = "Headless boss encounter simulator")]
#[command(version)]
struct Args {
    /// Encounter config (RON); built-in presets when omitted
    #[arg(long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// RNG seed (overrides the config seed)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of fixed ticks to simulate
    #[arg(long, default_value = "3600")]
    ticks: u32,

    /// debug | info | warn | error
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Player melee damage per swing (0 = passive player)
    #[arg(long, default_value = "0")]
    strike_damage: f64,

    /// Print the resolved config as RON and exit
    #[arg(long)]
    dump_config: bool,
}

/// Scripted player input: swing at the boss when in reach.
#[derive(Resource)]
struct AutoStrike {
    damage: f64,
    reach: f32,
    interval: f64,
    cooldown: f64,
    boss: Entity,
    player: Entity,
}

fn auto_strike(
    mut striker: ResMut<AutoStrike>,
    transforms: Query<&Transform>,
    time: Res<Time<Fixed>>,
    mut strikes: EventWriter<PlayerStrike>,
) {
    striker.cooldown -= time.delta_secs_f64();
    if striker.damage <= 0.0 || striker.cooldown > 0.0 {
        return;
    }
    let (Ok(boss), Ok(player)) = (transforms.get(striker.boss), transforms.get(striker.player)) else {
        return;
    };
    if boss.translation.distance(player.translation) > striker.reach {
        return;
    }

    striker.cooldown = striker.interval;
    strikes.write(PlayerStrike {
        target: striker.boss,
        damage: striker.damage,
        stagger: false,
    });
}

#[derive(Resource, Default)]
struct Outcome {
    signals: usize,
    deaths: Vec<Entity>,
}

fn record_outcome(
    mut outcome: ResMut<Outcome>,
    mut signals: EventReader<BossSignalEvent>,
    mut deaths: EventReader<EntityDied>,
) {
    for event in signals.read() {
        outcome.signals += 1;
        logger::log_info(&format!("📣 {:?}: {:?}", event.boss, event.signal));
    }
    for event in deaths.read() {
        outcome.deaths.push(event.entity);
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EncounterConfig::load(path),
        None => Ok(EncounterConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("   caused by: {cause}");
                source = cause.source();
            }
            return ExitCode::FAILURE;
        }
    };

    if args.dump_config {
        return match config.to_ron() {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("❌ {err}");
                ExitCode::FAILURE
            }
        };
    }

    let Some(level) = LogLevel::parse(&args.log_level) else {
        eprintln!("❌ unknown log level '{}'", args.log_level);
        return ExitCode::FAILURE;
    };
    logger::set_log_level(level);

    let seed = args.seed.unwrap_or(config.seed);
    println!("Starting BOSSFIGHT headless simulation (seed: {}, ticks: {})", seed, args.ticks);

    let mut app = create_headless_app(seed);
    let entities = spawn_encounter(app.world_mut(), &config);

    app.insert_resource(AutoStrike {
        damage: args.strike_damage,
        reach: config.boss.attack_range,
        interval: 0.8,
        cooldown: 0.0,
        boss: entities.boss,
        player: entities.player,
    })
    .init_resource::<Outcome>()
    .add_systems(FixedUpdate, auto_strike.before(bossfight_simulation::SimulationSet::Strikes))
    .add_systems(FixedUpdate, record_outcome.after(bossfight_simulation::SimulationSet::Presentation));

    let mut ran = 0;
    for tick in 0..args.ticks {
        app.update();
        ran = tick + 1;

        if tick % (TICK_RATE as u32 * 5) == 0 {
            if let Some(snapshot) = EncounterSnapshot::capture(app.world(), &entities) {
                logger::log_info(&format!(
                    "⏱️ t={:.1}s boss {} {:.0} hp, player {:.0} hp",
                    f64::from(tick) / TICK_RATE,
                    snapshot.boss_state,
                    snapshot.boss_health,
                    snapshot.player_health
                ));
            }
        }

        if !app.world().resource::<Outcome>().deaths.is_empty() {
            break;
        }
    }

    let outcome = app.world().resource::<Outcome>();
    println!("Simulation complete after {} ticks ({:.1}s)", ran, f64::from(ran) / TICK_RATE);
    println!("  boss signals: {}", outcome.signals);
    match EncounterSnapshot::capture(app.world(), &entities) {
        Some(snapshot) => {
            println!(
                "  boss:   {} ({:.0} hp, phase two: {})",
                snapshot.boss_state, snapshot.boss_health, snapshot.phase_two
            );
            println!("  player: {:.0} hp", snapshot.player_health);
            for (name, phase) in &snapshot.attacks {
                println!("  attack {name}: {phase}");
            }
        }
        None => println!("  encounter entities despawned"),
    }

    ExitCode::SUCCESS
}
