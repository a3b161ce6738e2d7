//! # Chain Lock
//!
//! The coarse lock that serializes every mutation of the committed ledger
//! and the processing-block tree. The consensus driver owns it and hands
//! the same lock to the manager's constructor; every public manager
//! operation takes a [`ChainGuard`] as proof the lock is held.

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct ChainLock {
    inner: Arc<Mutex<()>>,
}

impl ChainLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> ChainGuard<'_> {
        ChainGuard {
            lock: self,
            _held: self.inner.lock(),
        }
    }

    pub fn try_lock(&self) -> Option<ChainGuard<'_>> {
        self.inner.try_lock().map(|held| ChainGuard {
            lock: self,
            _held: held,
        })
    }
}

pub struct ChainGuard<'a> {
    lock: &'a ChainLock,
    _held: MutexGuard<'a, ()>,
}

impl ChainGuard<'_> {
    /// Whether this guard was taken from `lock` or one of its clones.
    pub fn is_for(&self, lock: &ChainLock) -> bool {
        Arc::ptr_eq(&self.lock.inner, &lock.inner)
    }
}
