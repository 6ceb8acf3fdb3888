// 8.0: the stateful core. MarginAccount owns the ledger, the authorization
// gate, and the conditional order registry, and composes calls into the
// external collaborators behind their ports. deterministic, no external I/O.

mod admin;
mod conditional;
mod core;
mod dispatch;
mod lock;
mod results;
mod trade;

pub use self::core::{Collaborators, MarginAccount};
pub use self::lock::{LockGuard, LockState, ReentrancyLock, ReentrancyViolation};
pub use self::results::AccountError;
