// 8.0.2: the account's error taxonomy. every failure aborts the whole batch;
// variants carry enough parameters for the caller to retry with corrected
// input. venue errors pass through unchanged.

use crate::auth::AuthError;
use crate::commands::CommandKind;
use crate::exchange::ExchangeError;
use crate::keeper::KeeperError;
use crate::ledger::LedgerError;
use crate::oracle::OracleError;
use crate::events::RelayError;
use crate::types::{Address, OrderId, Price};
use crate::venue::VenueError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    // authorization failures
    #[error("caller {caller} is not authorized for {kind:?}")]
    Unauthorized { caller: Address, kind: CommandKind },

    #[error("caller {0} is not the registered keeper")]
    NotKeeper(Address),

    // validation failures
    #[error("command batch is empty")]
    EmptyBatch,

    #[error("conditional order size delta must be nonzero")]
    ZeroSizeOrder,

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    // state failures
    #[error("reentrant call into the account")]
    Reentrancy,

    #[error("execution is disabled")]
    ExecutionDisabled,

    #[error("conditional order {0:?} not found")]
    OrderNotFound(OrderId),

    #[error("trigger condition not met for order {id:?} at price {price}")]
    TriggerNotMet { id: OrderId, price: Price },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    // oracle failures
    #[error(transparent)]
    Oracle(#[from] OracleError),

    // external collaborators, passed through unchanged
    #[error("venue error: {0}")]
    Venue(#[from] VenueError),

    #[error("event relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("keeper error: {0}")]
    Keeper(#[from] KeeperError),

    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),
}
