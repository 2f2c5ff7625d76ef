//! Publish/subscribe over local state.
//!
//! Every component exposes its state through an [`Observable`]. Subscribing
//! returns a [`Subscription`] handle; dropping the handle unsubscribes.
//! Publishing calls the current subscribers synchronously and never waits for
//! anything else.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Shared<T> {
    latest: Option<T>,
    replay: bool,
    next_id: u64,
    subscribers: Vec<(u64, Callback<T>)>,
}

fn lock<T>(shared: &Mutex<Shared<T>>) -> MutexGuard<'_, Shared<T>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Observable<T> {
    shared: Arc<Mutex<Shared<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + 'static> Observable<T> {
    /// A latest-value cell. New subscribers are called with the current value
    /// straight away.
    pub fn state(initial: T) -> Self {
        Self::with(Some(initial), true)
    }

    /// A stream of events. Nothing is retained, so a late subscriber never
    /// sees an event twice.
    pub fn events() -> Self {
        Self::with(None, false)
    }

    fn with(latest: Option<T>, replay: bool) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                latest,
                replay,
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Latest published value. Always `None` for event streams.
    pub fn get(&self) -> Option<T> {
        lock(&self.shared).latest.clone()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let callback: Callback<T> = Arc::new(callback);
        let (id, current) = {
            let mut shared = lock(&self.shared);
            let id = shared.next_id;
            shared.next_id += 1;
            shared.subscribers.push((id, Arc::clone(&callback)));
            let current = if shared.replay {
                shared.latest.clone()
            } else {
                None
            };
            (id, current)
        };

        if let Some(value) = current {
            callback(&value);
        }

        let weak = Arc::downgrade(&self.shared);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    lock(&shared).subscribers.retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared).subscribers.len()
    }

    pub(crate) fn publish(&self, value: T) {
        // Callbacks run without the lock held so they may subscribe or
        // unsubscribe.
        let callbacks: Vec<Callback<T>> = {
            let mut shared = lock(&self.shared);
            if shared.replay {
                shared.latest = Some(value.clone());
            }
            shared
                .subscribers
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect()
        };

        for callback in callbacks {
            callback(&value);
        }
    }
}

/// Handle returned by [`Observable::subscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}
