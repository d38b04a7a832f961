//! Atomically swappable single-value cell.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

/// A single value that many threads read and occasionally replace.
///
/// Every `set` publishes a fresh `Arc<T>`, so a reader holds either the old
/// or the new value in full and never a partially written one.
pub struct SharedValue<T> {
    inner: ArcSwap<T>,
}

impl<T> SharedValue<T> {
    /// Create the cell with its initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: ArcSwap::from_pointee(value),
        }
    }

    /// Latest fully published value.
    pub fn get(&self) -> Arc<T> {
        self.inner.load_full()
    }

    /// Replace the value. Visible to every subsequent `get` on every thread.
    pub fn set(&self, value: T) {
        self.inner.store(Arc::new(value));
    }

    /// Replace the value, returning the one it displaced.
    pub fn replace(&self, value: T) -> Arc<T> {
        self.inner.swap(Arc::new(value))
    }
}

impl<T: Clone> SharedValue<T> {
    /// Owned copy of the latest value.
    pub fn get_cloned(&self) -> T {
        T::clone(&self.inner.load())
    }
}

impl<T: Default> Default for SharedValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedValue").field(&*self.inner.load()).finish()
    }
}
