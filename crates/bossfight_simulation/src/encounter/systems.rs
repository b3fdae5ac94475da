//! Encounter ECS systems: trigger checks, teardown, music timeline.

use bevy::prelude::*;

use super::health_bar::HealthBarHandle;
use super::music::MusicHandle;
use super::trigger::{ActivationTargets, Barrier, EncounterTrigger};
use crate::ai::BossController;
use crate::combat::EncounterTarget;
use crate::health::Health;

/// Событие: encounter активирован (target вошёл в зону)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncounterActivated {
    pub trigger: Entity,
    pub boss: Entity,
    pub target: Entity,
}

/// Команда: снять подписки trigger'а (scene unload, restart)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncounterTeardown {
    pub trigger: Entity,
}

/// Система: активация trigger'ов при входе target'а в зону
pub fn check_encounter_triggers(
    mut triggers: Query<(Entity, &mut EncounterTrigger)>,
    targets: Query<(Entity, &Transform), With<EncounterTarget>>,
    mut bosses: Query<(&mut BossController, &mut Health)>,
    mut barriers: Query<(Entity, &mut Barrier)>,
    music: Option<Res<MusicHandle>>,
    health_bar: Option<Res<HealthBarHandle>>,
    mut activated: EventWriter<EncounterActivated>,
) {
    for (trigger_entity, mut trigger) in triggers.iter_mut() {
        if trigger.is_activated() {
            continue;
        }

        let zone = trigger.zone();
        let Some(target) = targets
            .iter()
            .filter(|(_, transform)| zone.contains(transform.translation))
            .map(|(entity, _)| entity)
            .min_by_key(|entity| entity.index())
        else {
            continue;
        };

        trigger.assign_missing(music.as_deref(), health_bar.as_deref());

        let boss = trigger.boss();
        let wall_entities = trigger.barriers().to_vec();
        let walls: Vec<&mut Barrier> = barriers
            .iter_mut()
            .filter(|(entity, _)| wall_entities.contains(entity))
            .map(|(_, barrier)| barrier.into_inner())
            .collect();

        let (controller, health) = match bosses.get_mut(boss) {
            Ok((controller, health)) => (Some(controller.into_inner()), Some(health.into_inner())),
            Err(_) => {
                crate::logger::log_warning(&format!("⚠️ Encounter: boss {:?} not found", boss));
                (None, None)
            }
        };

        let fired = trigger.activate(ActivationTargets {
            controller,
            health,
            barriers: walls,
            target: Some(target),
        });
        if fired {
            activated.write(EncounterActivated {
                trigger: trigger_entity,
                boss,
                target,
            });
        }
    }
}

/// Система: teardown по событию
pub fn handle_encounter_teardown(
    mut requests: EventReader<EncounterTeardown>,
    mut triggers: Query<&mut EncounterTrigger>,
    mut healths: Query<&mut Health>,
) {
    for request in requests.read() {
        let Ok(mut trigger) = triggers.get_mut(request.trigger) else {
            continue;
        };
        let health = healths.get_mut(trigger.boss()).ok().map(Mut::into_inner);
        trigger.teardown(health);
    }
}

/// Система: music timeline (unscaled: hit stop не тормозит музыку)
pub fn tick_music(music: Option<Res<MusicHandle>>, time: Res<Time<Fixed>>) {
    if let Some(music) = music {
        music.lock().tick(time.delta_secs_f64());
    }
}
