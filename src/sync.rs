use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    algo::QTableAgent,
    decay::{Decay, Multiplicative},
    Result,
};

/// A cloneable handle to one [`QTableAgent`] shared between threads
///
/// The table, ε and the random source sit behind a single lock, so every operation sees a
/// consistent row and ε and updates are applied one at a time.
pub struct SharedQTableAgent<D: Decay = Multiplicative> {
    inner: Arc<Mutex<QTableAgent<D>>>,
}

impl<D: Decay> Clone for SharedQTableAgent<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Decay> From<QTableAgent<D>> for SharedQTableAgent<D> {
    fn from(agent: QTableAgent<D>) -> Self {
        Self::new(agent)
    }
}

impl<D: Decay> SharedQTableAgent<D> {
    pub fn new(agent: QTableAgent<D>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(agent)),
        }
    }

    // Every mutation happens after all checks, so a poisoned agent is still consistent
    fn lock(&self) -> MutexGuard<'_, QTableAgent<D>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn choose_action(&self, state: usize) -> Result<usize> {
        self.lock().choose_action(state)
    }

    pub fn learn(&self, state: usize, action: usize, reward: f64, next_state: usize) -> Result<()> {
        self.lock().learn(state, action, reward, next_state)
    }

    pub fn exploration_rate(&self) -> f64 {
        self.lock().exploration_rate()
    }

    pub fn export_state(&self) -> Result<Vec<u8>> {
        self.lock().export_state()
    }

    pub fn import_state(&self, bytes: &[u8]) -> Result<()> {
        self.lock().import_state(bytes)
    }

    pub fn import_state_strict(&self, bytes: &[u8]) -> Result<()> {
        self.lock().import_state_strict(bytes)
    }

    /// Save a snapshot taken under the lock, the file write itself happens outside of it
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let table = self.lock().table().clone();
        crate::persist::save(&table, path)
    }

    /// Run `f` with exclusive access to the agent
    pub fn with<T>(&self, f: impl FnOnce(&mut QTableAgent<D>) -> T) -> T {
        f(&mut self.lock())
    }

    /// Take the agent back if this is the last handle
    pub fn try_unwrap(self) -> std::result::Result<QTableAgent<D>, Self> {
        Arc::try_unwrap(self.inner)
            .map(|m| m.into_inner().unwrap_or_else(PoisonError::into_inner))
            .map_err(|inner| Self { inner })
    }
}
