// Keeper automation boundary. The account registers a watch task per
// conditional order and cancels it on the order's terminal transition. The
// keeper's claim that a trigger holds is never trusted; the account
// re-verifies against its own resolved price.

use crate::types::{Address, OrderId, Quote};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeeperError {
    #[error("keeper task {0:?} not found")]
    TaskNotFound(TaskId),

    #[error("keeper network unavailable")]
    Unavailable,
}

pub trait KeeperGateway {
    /// Register a watch task for a newly placed order.
    fn create_task(&mut self, order: OrderId) -> Result<TaskId, KeeperError>;

    fn cancel_task(&mut self, task: TaskId) -> Result<(), KeeperError>;

    /// Identity the keeper network calls the execute entry point from.
    fn executor(&self) -> Address;

    /// Fee the keeper charges per executed order.
    fn execution_fee(&self) -> Quote;
}

/// In-memory keeper for tests and the simulation binary.
#[derive(Debug, Clone)]
pub struct MockKeeper {
    executor: Address,
    fee: Quote,
    next_task: u64,
    active: std::collections::HashMap<TaskId, OrderId>,
    healthy: bool,
}

impl MockKeeper {
    pub fn new(executor: Address, fee: Quote) -> Self {
        Self {
            executor,
            fee,
            next_task: 0,
            active: std::collections::HashMap::new(),
            healthy: true,
        }
    }

    pub fn set_healthy(&mut self, healthy: bool) {
        self.healthy = healthy;
    }

    pub fn active_tasks(&self) -> usize {
        self.active.len()
    }
}

impl KeeperGateway for MockKeeper {
    fn create_task(&mut self, order: OrderId) -> Result<TaskId, KeeperError> {
        if !self.healthy {
            return Err(KeeperError::Unavailable);
        }
        let task = TaskId(self.next_task);
        self.next_task += 1;
        self.active.insert(task, order);
        Ok(task)
    }

    fn cancel_task(&mut self, task: TaskId) -> Result<(), KeeperError> {
        self.active
            .remove(&task)
            .map(|_| ())
            .ok_or(KeeperError::TaskNotFound(task))
    }

    fn executor(&self) -> Address {
        self.executor
    }

    fn execution_fee(&self) -> Quote {
        self.fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn task_lifecycle() {
        let mut keeper = MockKeeper::new(Address(77), Quote::new(dec!(2)));

        let task = keeper.create_task(OrderId(1)).unwrap();
        assert_eq!(keeper.active_tasks(), 1);

        keeper.cancel_task(task).unwrap();
        assert_eq!(keeper.active_tasks(), 0);
        assert_eq!(keeper.cancel_task(task), Err(KeeperError::TaskNotFound(task)));
    }

    #[test]
    fn unhealthy_keeper_rejects_tasks() {
        let mut keeper = MockKeeper::new(Address(77), Quote::zero());
        keeper.set_healthy(false);
        assert_eq!(keeper.create_task(OrderId(1)), Err(KeeperError::Unavailable));
    }
}
