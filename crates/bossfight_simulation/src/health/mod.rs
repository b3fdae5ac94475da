//! Health model: current/max, dead flag, half-health latch, change events.
//!
//! Owned by its entity (boss или игрок). Mutated only through
//! [`Health::apply_damage`] / [`Health::reset`]; readers subscribe.

use bevy::prelude::*;

use crate::shared::{Observers, SubscriptionId};


/// Payload of `on_health_changed`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthChange {
    pub current: f64,
    pub max: f64,
}

/// One emitted health event, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HealthEvent {
    Changed(HealthChange),
    HalfHealth,
    Death,
}

/// What a single mutation emitted.
///
/// The ECS layer routes this into the owning controller before the damaging
/// call returns, so phase/death status is current when the attacker resumes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthReport {
    pub events: Vec<HealthEvent>,
}

impl HealthReport {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn half_health(&self) -> bool {
        self.events.contains(&HealthEvent::HalfHealth)
    }

    pub fn died(&self) -> bool {
        self.events.contains(&HealthEvent::Death)
    }

    pub fn latest_change(&self) -> Option<HealthChange> {
        self.events.iter().rev().find_map(|event| match event {
            HealthEvent::Changed(change) => Some(*change),
            _ => None,
        })
    }
}

/// Здоровье сущности
///
/// Инварианты:
/// - 0 ≤ current ≤ max
/// - is_dead ⇔ current == 0
/// - half_health_fired: false → true ровно один раз до `reset()`
#[derive(Component, Debug)]
pub struct Health {
    current: f64,
    max: f64,
    is_dead: bool,
    half_health_fired: bool,
    on_health_changed: Observers<HealthChange>,
    on_half_health: Observers<()>,
    on_death: Observers<()>,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    /// Negative or NaN max is treated as zero (already dead).
    pub fn new(max: f64) -> Self {
        let max = if max.is_nan() { 0.0 } else { max.max(0.0) };
        Self {
            current: max,
            max,
            is_dead: max == 0.0,
            half_health_fired: false,
            on_health_changed: Observers::new(),
            on_half_health: Observers::new(),
            on_death: Observers::new(),
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn fraction(&self) -> f64 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    pub fn half_health_fired(&self) -> bool {
        self.half_health_fired
    }

    /// Applies `amount` of damage.
    ///
    /// No-op (empty report) for `amount <= 0`, NaN, or when already dead.
    pub fn apply_damage(&mut self, amount: f64) -> HealthReport {
        let mut report = HealthReport::default();
        if self.is_dead || amount.is_nan() || amount <= 0.0 {
            return report;
        }

        self.current = (self.current - amount).clamp(0.0, self.max);
        let change = HealthChange {
            current: self.current,
            max: self.max,
        };
        self.on_health_changed.emit(&change);
        report.events.push(HealthEvent::Changed(change));

        if !self.half_health_fired && self.current <= self.max * 0.5 {
            self.half_health_fired = true;
            crate::logger::log(&format!(
                "💢 Health: half threshold crossed ({:.1}/{:.1})",
                self.current, self.max
            ));
            self.on_half_health.emit(&());
            report.events.push(HealthEvent::HalfHealth);
        }

        if self.current <= 0.0 {
            self.current = 0.0;
            self.is_dead = true;
            crate::logger::log("☠️ Health: reached zero");
            self.on_death.emit(&());
            report.events.push(HealthEvent::Death);
        }

        report
    }

    /// Restores full health and re-arms the half-health latch.
    pub fn reset(&mut self) -> HealthReport {
        self.current = self.max;
        self.is_dead = self.max == 0.0;
        self.half_health_fired = false;

        let change = HealthChange {
            current: self.current,
            max: self.max,
        };
        self.on_health_changed.emit(&change);
        HealthReport {
            events: vec![HealthEvent::Changed(change)],
        }
    }

    pub fn on_health_changed<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&HealthChange) + Send + Sync + 'static,
    {
        self.on_health_changed.subscribe(callback)
    }

    pub fn on_half_health<F>(&mut self, mut callback: F) -> SubscriptionId
    where
        F: FnMut() + Send + Sync + 'static,
    {
        self.on_half_health.subscribe(move |_| callback())
    }

    pub fn on_death<F>(&mut self, mut callback: F) -> SubscriptionId
    where
        F: FnMut() + Send + Sync + 'static,
    {
        self.on_death.subscribe(move |_| callback())
    }

    pub fn remove_health_changed(&mut self, id: SubscriptionId) -> bool {
        self.on_health_changed.unsubscribe(id)
    }

    pub fn remove_half_health(&mut self, id: SubscriptionId) -> bool {
        self.on_half_health.unsubscribe(id)
    }

    pub fn remove_death(&mut self, id: SubscriptionId) -> bool {
        self.on_death.unsubscribe(id)
    }

    pub fn half_health_subscribers(&self) -> usize {
        self.on_half_health.len()
    }

    pub fn health_changed_subscribers(&self) -> usize {
        self.on_health_changed.len()
    }
}

/// Событие: здоровье изменилось (для UI/звука)
#[derive(Event, Debug, Clone, Copy)]
pub struct HealthChanged {
    pub entity: Entity,
    pub current: f64,
    pub max: f64,
}

/// Событие: здоровье впервые упало до половины
#[derive(Event, Debug, Clone, Copy)]
pub struct HalfHealthReached {
    pub entity: Entity,
}

/// Событие: entity умер (health == 0)
#[derive(Event, Debug, Clone, Copy)]
pub struct EntityDied {
    pub entity: Entity,
}

/// Forwards a report into the Bevy event channels.
pub fn forward_health_report(
    entity: Entity,
    report: &HealthReport,
    changed: &mut EventWriter<HealthChanged>,
    half: &mut EventWriter<HalfHealthReached>,
    died: &mut EventWriter<EntityDied>,
) {
    for event in &report.events {
        match event {
            HealthEvent::Changed(change) => {
                changed.write(HealthChanged {
                    entity,
                    current: change.current,
                    max: change.max,
                });
            }
            HealthEvent::HalfHealth => {
                half.write(HalfHealthReached { entity });
            }
            HealthEvent::Death => {
                died.write(EntityDied { entity });
            }
        }
    }
}
