// Non-reentrant execution lock. Explicit tri-state rather than call-stack
// depth: starts Unset, flips to Unlocked after the first entry completes, and
// must never be observed Locked outside a top-level entry. The guard resets
// the state on drop, so every exit path (including early `?` returns)
// restores it.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unset,
    Unlocked,
    Locked,
}

#[derive(Debug)]
pub struct ReentrancyLock {
    state: Cell<LockState>,
}

impl ReentrancyLock {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            state: Cell::new(LockState::Unset),
        })
    }

    pub fn state(&self) -> LockState {
        self.state.get()
    }

    pub fn is_locked(&self) -> bool {
        self.state.get() == LockState::Locked
    }

    /// Take the lock for one top-level entry. Fails if already held. The
    /// returned guard owns a handle to the lock, so it outlives any borrow
    /// of the account that created it.
    pub fn acquire(lock: &Rc<ReentrancyLock>) -> Result<LockGuard, ReentrancyViolation> {
        if lock.is_locked() {
            return Err(ReentrancyViolation);
        }
        lock.state.set(LockState::Locked);
        Ok(LockGuard {
            lock: Rc::clone(lock),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReentrancyViolation;

/// Held for the duration of a batch; releases on drop.
#[derive(Debug)]
pub struct LockGuard {
    lock: Rc<ReentrancyLock>,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.lock.state.set(LockState::Unlocked);
    }
}
