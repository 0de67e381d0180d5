//! Observable store state.
//!
//! Every store keeps its state behind a `watch` channel: the UI reads a
//! snapshot or subscribes, and every action applies its transition in a single
//! `send_modify` so no half-applied state is ever observable.

use tokio::sync::watch;

/// Single-writer state cell shared by the stores.
#[derive(Debug)]
pub struct StoreState<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> StoreState<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Returns a clone of the current state.
    pub fn snapshot(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Reads a projection of the current state without cloning all of it.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Applies one atomic transition and notifies subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Replaces the whole state.
    pub fn replace(&self, next: T) {
        self.tx.send_replace(next);
    }
}

impl<T: Clone + Default> Default for StoreState<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
