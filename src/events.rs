use crate::map_widget::MarkerId;
use crate::models::{LatLng, MapView};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    ViewChanged(MapView),
    AnimationStarted { markers: Vec<MarkerId>, generation: u64 },
    AnimationStopped { markers: Vec<MarkerId>, generation: u64 },
    PopupOpened { anchor: LatLng },
    AdHocMarkerPlaced { id: MarkerId, position: LatLng },
}

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

pub struct Emitter<T> {
    listeners: Arc<Mutex<Listeners<T>>>,
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Listeners { next_id: 0, entries: Vec::new() })),
        }
    }
}

fn lock<T>(listeners: &Mutex<Listeners<T>>) -> MutexGuard<'_, Listeners<T>> {
    listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<T: 'static> Emitter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` until the returned subscription is disposed or dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut guard = lock(&self.listeners);
        let id = guard.next_id;
        guard.next_id += 1;
        guard.entries.push((id, Arc::new(listener)));

        let weak: Weak<Mutex<Listeners<T>>> = Arc::downgrade(&self.listeners);
        Subscription {
            dispose: Some(Box::new(move || {
                if let Some(listeners) = weak.upgrade() {
                    lock(&listeners).entries.retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    pub fn emit(&self, event: &T) {
        // Listeners may subscribe or dispose from inside a callback.
        let snapshot: Vec<Listener<T>> = lock(&self.listeners).entries.iter().map(|(_, l)| l.clone()).collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).entries.len()
    }
}

#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn dispose(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}
