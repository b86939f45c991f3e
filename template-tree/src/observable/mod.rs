//! Typed publish/subscribe channels
//!
//! An [`Observable`] fans a payload out to every live subscriber in
//! subscription order. Subscribers are identified by the [`Subscription`]
//! handle returned from [`Observable::subscribe`]. Cloning an observable
//! shares the subscriber list, which is how templates forward their
//! notifications to the manager's aggregate channels.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle identifying one subscriber of one observable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Multi-subscriber notification channel
pub struct Observable<T> {
    observers: Arc<Mutex<Vec<(Subscription, Callback<T>)>>>,
    next_id: Arc<AtomicU64>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            observers: Arc::clone(&self.observers),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<T> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("observers", &self.observers.lock().len())
            .finish()
    }
}

impl<T> Observable<T> {
    /// Create a channel with no subscribers
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Add a subscriber
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let handle = Subscription(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.lock().push((handle, Arc::new(callback)));
        handle
    }

    /// Remove a subscriber
    ///
    /// Returns `false` if the handle was not subscribed (already removed or cleared).
    pub fn unsubscribe(&self, handle: Subscription) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|(id, _)| *id != handle);
        observers.len() != before
    }

    /// Invoke every live subscriber with `payload`
    ///
    /// The subscriber list is snapshotted first, so callbacks may subscribe,
    /// unsubscribe or clear without deadlocking. A subscriber removed by an
    /// earlier callback in the same notification is skipped.
    pub fn notify(&self, payload: &T) {
        let snapshot: Vec<(Subscription, Callback<T>)> = self.observers.lock().clone();
        for (handle, callback) in snapshot {
            if self.is_subscribed(handle) {
                callback(payload);
            }
        }
    }

    /// Drop all subscribers
    pub fn clear(&self) {
        self.observers.lock().clear();
    }

    /// Whether `handle` is still subscribed
    #[must_use]
    pub fn is_subscribed(&self, handle: Subscription) -> bool {
        self.observers.lock().iter().any(|(id, _)| *id == handle)
    }

    /// Number of live subscribers
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.lock().len()
    }

    /// Whether there are no subscribers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_notify_in_subscription_order() {
        let observable = Observable::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            observable.subscribe(move |value: &u32| seen.lock().push(format!("{tag}:{value}")));
        }

        observable.notify(&7);
        assert_eq!(*seen.lock(), vec!["first:7", "second:7", "third:7"]);
    }

    #[test]
    fn test_unsubscribe() {
        let observable = Observable::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let handle = observable.subscribe(move |_: &()| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        observable.notify(&());
        assert!(observable.unsubscribe(handle));
        assert!(!observable.unsubscribe(handle));
        observable.notify(&());

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(observable.is_empty());
    }

    #[test]
    fn test_unsubscribe_during_notification() {
        let observable = Observable::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let inner = observable.clone();
        let self_slot = Arc::clone(&slot);
        let handle = observable.subscribe(move |_: &()| {
            if let Some(me) = *self_slot.lock() {
                inner.unsubscribe(me);
            }
        });
        *slot.lock() = Some(handle);

        let counter = Arc::clone(&count);
        observable.subscribe(move |_: &()| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        observable.notify(&());
        observable.notify(&());

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(observable.len(), 1);
    }

    #[test]
    fn test_removed_later_subscriber_is_skipped() {
        let observable = Observable::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let inner = observable.clone();
        let target = Arc::clone(&victim);
        observable.subscribe(move |_: &()| {
            if let Some(handle) = *target.lock() {
                inner.unsubscribe(handle);
            }
        });

        let counter = Arc::clone(&count);
        let handle = observable.subscribe(move |_: &()| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        *victim.lock() = Some(handle);

        observable.notify(&());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clear_drops_all() {
        let observable = Observable::<i32>::new();
        observable.subscribe(|_| {});
        observable.subscribe(|_| {});
        assert_eq!(observable.len(), 2);

        observable.clear();
        assert!(observable.is_empty());
    }

    #[test]
    fn test_clones_share_subscribers() {
        let observable = Observable::<i32>::new();
        let forwarded = observable.clone();
        let total = Arc::new(AtomicUsize::new(0));
        let sum = Arc::clone(&total);
        forwarded.subscribe(move |v: &i32| {
            sum.fetch_add(usize::try_from(*v).unwrap_or(0), Ordering::SeqCst);
        });

        observable.notify(&5);
        assert_eq!(total.load(Ordering::SeqCst), 5);
    }
}
