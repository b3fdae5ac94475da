//! Boss health bar model (the widget itself lives in the host).

use bevy::prelude::*;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::health::Health;
use crate::shared::SubscriptionId;

/// What the host should draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthBarView {
    pub name: String,
    pub value: f64,
    pub max: f64,
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct BossHealthBar {
    view: HealthBarView,
    subscription: Option<SubscriptionId>,
}

impl BossHealthBar {
    pub fn is_bound(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn view(&self) -> &HealthBarView {
        &self.view
    }

    fn apply(&mut self, current: f64, max: f64) {
        self.view.value = current;
        self.view.max = max;
        if current <= 0.0 {
            self.view.visible = false;
        }
    }
}

/// Resource: shared health bar. Cloning shares the same bar.
#[derive(Resource, Debug, Clone, Default)]
pub struct HealthBarHandle(Arc<Mutex<BossHealthBar>>);

impl HealthBarHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BossHealthBar> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Binds to `health` and subscribes to its changes.
    /// Returns `false` if the bar is already bound.
    pub fn bind(&self, health: &mut Health, name: &str) -> bool {
        if self.lock().is_bound() {
            return false;
        }

        let bar = self.clone();
        let id = health.on_health_changed(move |change| bar.lock().apply(change.current, change.max));

        let mut state = self.lock();
        state.subscription = Some(id);
        state.view.name = name.to_string();
        state.apply(health.current(), health.max());
        crate::logger::log(&format!(
            "📊 HealthBar: bound to '{}' ({:.0}/{:.0})",
            name,
            health.current(),
            health.max()
        ));
        true
    }

    pub fn unbind(&self, health: &mut Health) -> bool {
        let mut state = self.lock();
        let Some(id) = state.subscription.take() else {
            return false;
        };
        state.view.visible = false;
        health.remove_health_changed(id)
    }

    /// Unbound or empty bars stay hidden.
    pub fn show(&self) {
        let mut state = self.lock();
        if state.is_bound() && state.view.value > 0.0 {
            state.view.visible = true;
        }
    }

    pub fn is_bound(&self) -> bool {
        self.lock().is_bound()
    }

    pub fn snapshot(&self) -> HealthBarView {
        self.lock().view.clone()
    }
}
