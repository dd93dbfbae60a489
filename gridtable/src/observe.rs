//! Change subscriptions
//!
//! Row and column managers publish a [`RowChange`] / [`ColumnChange`] after
//! each mutation. Listeners are called after the manager's write lock has
//! been released, so a listener may read back from the manager it observes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::model::RowKey;

/// Handle returned by [`Observers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// A list of listeners for events of type `E`.
pub struct Observers<E> {
    listeners: RwLock<Vec<(SubscriptionId, Listener<E>)>>,
    next_id: AtomicU64,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<E> std::fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.len())
            .finish()
    }
}

impl<E> Observers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        if let Ok(mut guard) = self.listeners.write() {
            guard.push((id, Arc::new(listener)));
        }
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut guard) = self.listeners.write() else {
            return false;
        };
        let before = guard.len();
        guard.retain(|(sid, _)| *sid != id);
        guard.len() != before
    }

    /// Call every listener with `event`.
    pub fn notify(&self, event: &E) {
        // Snapshot so a listener can subscribe or unsubscribe while being called.
        let listeners: Vec<Listener<E>> = self
            .listeners
            .read()
            .map(|g| g.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Monotonic change counter shared by a manager's clones.
#[derive(Debug, Clone, Default)]
pub struct Revision(Arc<AtomicU64>);

impl Revision {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// A change to the row model.
#[derive(Debug, Clone, PartialEq)]
pub enum RowChange {
    /// `set_rows` re-synchronized the tree.
    Rows,
    /// The filter boundary changed.
    Matched,
    /// Selection flags changed.
    Selection,
    /// The collapsed set changed; carries the ids now collapsed.
    Collapse { collapsed: Vec<String> },
    /// Rows were hard-deleted.
    Deleted(Vec<RowKey>),
}

/// A change to the column model.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnChange {
    /// Columns were added or re-associated.
    Columns,
    /// Visibility changed; carries the ids now visible.
    Visibility { visible: Vec<String> },
    /// Expansion changed; carries the ids now expanded.
    Expansion { expanded: Vec<String> },
    /// A column's children finished loading.
    ChildrenLoaded { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_notify_and_unsubscribe() {
        let observers: Observers<u32> = Observers::new();
        let total = Arc::new(AtomicUsize::new(0));

        let t = Arc::clone(&total);
        let id = observers.subscribe(move |v| {
            t.fetch_add(*v as usize, Ordering::SeqCst);
        });

        observers.notify(&3);
        observers.notify(&4);
        assert_eq!(total.load(Ordering::SeqCst), 7);

        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        observers.notify(&10);
        assert_eq!(total.load(Ordering::SeqCst), 7);
        assert!(observers.is_empty());
    }

    #[test]
    fn test_listener_can_subscribe_during_notify() {
        let observers: Arc<Observers<()>> = Arc::new(Observers::new());
        let inner = Arc::clone(&observers);
        observers.subscribe(move |_| {
            inner.subscribe(|_| {});
        });
        observers.notify(&());
        assert_eq!(observers.len(), 2);
    }

    #[test]
    fn test_revision_bumps() {
        let rev = Revision::default();
        let shared = rev.clone();
        assert_eq!(rev.get(), 0);
        assert_eq!(shared.bump(), 1);
        assert_eq!(rev.get(), 1);
    }
}
