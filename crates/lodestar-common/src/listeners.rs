//! Thread-safe listener sets
//!
//! A [`ListenerSet`] holds callbacks behind a `parking_lot::RwLock` and hands out a
//! [`SubscriptionId`] per subscription. Listener lifetime is independent of the
//! publisher: subscribers unsubscribe explicitly with their token.
//!
//! Notification takes a snapshot of the current listeners and invokes them after the
//! lock is released, so a listener may subscribe, unsubscribe or publish again without
//! deadlocking.

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Token identifying one subscription on a [`ListenerSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw numeric value of the token
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription#{}", self.0)
    }
}

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Set of listeners for events of type `E`
pub struct ListenerSet<E> {
    listeners: RwLock<Vec<(SubscriptionId, Listener<E>)>>,
    next_id: AtomicU64,
}

impl<E> ListenerSet<E> {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add a listener; the returned token removes it again
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if the token was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Deliver `event` to every listener registered at the time of the call,
    /// in subscription order.
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every listener
    pub fn clear(&self) {
        self.listeners.write().clear();
    }
}

impl<E> Default for ListenerSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ListenerSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_listener_set_basic_operations() {
        let set: ListenerSet<u32> = ListenerSet::new();
        assert!(set.is_empty());

        let total = Arc::new(AtomicUsize::new(0));
        let total_clone = Arc::clone(&total);
        let id = set.subscribe(move |value| {
            total_clone.fetch_add(*value as usize, Ordering::SeqCst);
        });

        set.notify(&2);
        set.notify(&3);
        assert_eq!(total.load(Ordering::SeqCst), 5);

        assert!(set.unsubscribe(id));
        assert!(!set.unsubscribe(id));
        set.notify(&10);
        assert_eq!(total.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_tokens_are_unique() {
        let set: ListenerSet<()> = ListenerSet::new();
        let first = set.subscribe(|_| {});
        let second = set.subscribe(|_| {});
        assert_ne!(first, second);
        assert_eq!(set.len(), 2);

        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_listener_can_unsubscribe_itself_during_notify() {
        let set: Arc<ListenerSet<()>> = Arc::new(ListenerSet::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let slot = Arc::new(parking_lot::Mutex::new(None::<SubscriptionId>));

        let set_clone = Arc::clone(&set);
        let calls_clone = Arc::clone(&calls);
        let slot_clone = Arc::clone(&slot);
        let id = set.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *slot_clone.lock() {
                set_clone.unsubscribe(id);
            }
        });
        *slot.lock() = Some(id);

        set.notify(&());
        set.notify(&());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(set.is_empty());
    }

    proptest::proptest! {
        #[test]
        fn prop_only_remaining_listeners_are_notified(keep in proptest::collection::vec(proptest::bool::ANY, 0..32)) {
            let set: ListenerSet<()> = ListenerSet::new();
            let calls = Arc::new(AtomicUsize::new(0));
            let ids: Vec<SubscriptionId> = keep
                .iter()
                .map(|_| {
                    let calls = Arc::clone(&calls);
                    set.subscribe(move |_| {
                        calls.fetch_add(1, Ordering::SeqCst);
                    })
                })
                .collect();

            for (id, keep) in ids.iter().zip(&keep) {
                if !keep {
                    proptest::prop_assert!(set.unsubscribe(*id));
                }
            }

            set.notify(&());
            let kept = keep.iter().filter(|k| **k).count();
            proptest::prop_assert_eq!(calls.load(Ordering::SeqCst), kept);
            proptest::prop_assert_eq!(set.len(), kept);
        }
    }
}
