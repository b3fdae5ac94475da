//! Explicit observer lists (subscribe / unsubscribe / synchronous emit).

use std::fmt;

/// Handle returned by [`Observers::subscribe`], used to remove the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<E> = Box<dyn FnMut(&E) + Send + Sync>;

/// Ordered list of callbacks for one event type.
///
/// Dispatch is synchronous and follows registration order. Collaborators
/// that outlive their interest MUST unsubscribe, otherwise the callback keeps
/// firing into stale state.
pub struct Observers<E> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback<E>)>,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.entries.len())
            .finish()
    }
}

impl<E> Observers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Returns `false` when the id was never registered or is already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, callback) in self.entries.iter_mut() {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
