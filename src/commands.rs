//! Batch command vocabulary.
//!
//! A batch is an ordered list of [`Command`] values executed strictly in the
//! order supplied. Each variant carries its own strongly typed parameters, so
//! there is no byte-layout decoding and no out-of-range kind to reject:
//! malformed input fails at construction, not at dispatch.

use crate::types::{Address, Bps, MarketId, OrderId, Price, Quote, SignedSize};
use serde::{Deserialize, Serialize};

use crate::conditional::ConditionalKind;

/// One instruction in a batch. `margin_delta` fields are signed quote amounts:
/// positive moves collateral toward the target, negative pulls it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    // account collateral
    AccountModifyMargin { delta: Quote },
    AccountWithdrawNative { amount: Quote },

    // ownership and delegation
    OwnershipTransfer { new_owner: Address },
    DelegateAdd { delegate: Address, fee: Bps },
    DelegateRemove { delegate: Address },

    // venue margin
    PerpModifyMargin { market: MarketId, delta: Quote },
    PerpWithdrawAllMargin { market: MarketId },

    // venue orders
    PerpSubmitAtomicOrder {
        market: MarketId,
        size_delta: SignedSize,
        desired_fill_price: Price,
    },
    PerpSubmitDelayedOrder {
        market: MarketId,
        size_delta: SignedSize,
        desired_fill_price: Price,
    },
    PerpSubmitOffchainDelayedOrder {
        market: MarketId,
        size_delta: SignedSize,
        desired_fill_price: Price,
    },
    PerpCancelDelayedOrder { market: MarketId },
    PerpCancelOffchainDelayedOrder { market: MarketId },

    // position closing
    PerpClosePosition { market: MarketId, desired_fill_price: Price },
    PerpSubmitCloseDelayedOrder { market: MarketId, desired_fill_price: Price },
    PerpSubmitCloseOffchainDelayedOrder { market: MarketId, desired_fill_price: Price },

    // conditional orders
    ConditionalOrderPlace {
        market: MarketId,
        margin_delta: Quote,
        size_delta: SignedSize,
        target_price: Price,
        kind: ConditionalKind,
        desired_fill_price: Price,
        reduce_only: bool,
    },
    ConditionalOrderCancel { id: OrderId },

    // collateral routed through the external exchange
    CollateralSwap { amount_in: Quote, min_amount_out: Quote },
}

/// Fieldless tag for a command, used for authorization lookups and audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    AccountModifyMargin,
    AccountWithdrawNative,
    OwnershipTransfer,
    DelegateAdd,
    DelegateRemove,
    PerpModifyMargin,
    PerpWithdrawAllMargin,
    PerpSubmitAtomicOrder,
    PerpSubmitDelayedOrder,
    PerpSubmitOffchainDelayedOrder,
    PerpCancelDelayedOrder,
    PerpCancelOffchainDelayedOrder,
    PerpClosePosition,
    PerpSubmitCloseDelayedOrder,
    PerpSubmitCloseOffchainDelayedOrder,
    ConditionalOrderPlace,
    ConditionalOrderCancel,
    CollateralSwap,
}

/// Authorization class of a command kind. Checked centrally by the dispatcher
/// rather than duplicated per handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandClass {
    /// Only the account owner.
    OwnerOnly,
    /// Owner or any registered delegate.
    OwnerOrDelegate,
    /// Anyone; gated internally (conditional order execution).
    Public,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::AccountModifyMargin { .. } => CommandKind::AccountModifyMargin,
            Command::AccountWithdrawNative { .. } => CommandKind::AccountWithdrawNative,
            Command::OwnershipTransfer { .. } => CommandKind::OwnershipTransfer,
            Command::DelegateAdd { .. } => CommandKind::DelegateAdd,
            Command::DelegateRemove { .. } => CommandKind::DelegateRemove,
            Command::PerpModifyMargin { .. } => CommandKind::PerpModifyMargin,
            Command::PerpWithdrawAllMargin { .. } => CommandKind::PerpWithdrawAllMargin,
            Command::PerpSubmitAtomicOrder { .. } => CommandKind::PerpSubmitAtomicOrder,
            Command::PerpSubmitDelayedOrder { .. } => CommandKind::PerpSubmitDelayedOrder,
            Command::PerpSubmitOffchainDelayedOrder { .. } => {
                CommandKind::PerpSubmitOffchainDelayedOrder
            }
            Command::PerpCancelDelayedOrder { .. } => CommandKind::PerpCancelDelayedOrder,
            Command::PerpCancelOffchainDelayedOrder { .. } => {
                CommandKind::PerpCancelOffchainDelayedOrder
            }
            Command::PerpClosePosition { .. } => CommandKind::PerpClosePosition,
            Command::PerpSubmitCloseDelayedOrder { .. } => {
                CommandKind::PerpSubmitCloseDelayedOrder
            }
            Command::PerpSubmitCloseOffchainDelayedOrder { .. } => {
                CommandKind::PerpSubmitCloseOffchainDelayedOrder
            }
            Command::ConditionalOrderPlace { .. } => CommandKind::ConditionalOrderPlace,
            Command::ConditionalOrderCancel { .. } => CommandKind::ConditionalOrderCancel,
            Command::CollateralSwap { .. } => CommandKind::CollateralSwap,
        }
    }
}

impl CommandKind {
    pub fn class(&self) -> CommandClass {
        match self {
            CommandKind::AccountModifyMargin
            | CommandKind::AccountWithdrawNative
            | CommandKind::OwnershipTransfer
            | CommandKind::DelegateAdd
            | CommandKind::DelegateRemove
            | CommandKind::CollateralSwap => CommandClass::OwnerOnly,

            CommandKind::PerpModifyMargin
            | CommandKind::PerpWithdrawAllMargin
            | CommandKind::PerpSubmitAtomicOrder
            | CommandKind::PerpSubmitDelayedOrder
            | CommandKind::PerpSubmitOffchainDelayedOrder
            | CommandKind::PerpCancelDelayedOrder
            | CommandKind::PerpCancelOffchainDelayedOrder
            | CommandKind::PerpClosePosition
            | CommandKind::PerpSubmitCloseDelayedOrder
            | CommandKind::PerpSubmitCloseOffchainDelayedOrder
            | CommandKind::ConditionalOrderPlace
            | CommandKind::ConditionalOrderCancel => CommandClass::OwnerOrDelegate,
        }
    }
}
