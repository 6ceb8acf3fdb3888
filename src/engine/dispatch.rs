//! Batch command dispatch.
//!
//! One entry point takes an ordered list of commands and applies them
//! sequentially with all-or-nothing semantics: the non-reentrant lock wraps
//! the whole batch, every command passes the authorization gate before its
//! handler runs, and the first failure restores the pre-batch snapshot.
//! Buffered events reach the relay only after every handler has succeeded.

use super::core::MarginAccount;
use super::lock::ReentrancyLock;
use super::results::AccountError;
use crate::commands::Command;
use crate::types::{Address, OrderId};
use tracing::debug;

impl MarginAccount {
    /// Execute a batch of commands for `caller`. Fails closed: on any error
    /// no account state changes and no events are relayed.
    pub fn execute(&mut self, caller: Address, commands: &[Command]) -> Result<(), AccountError> {
        if commands.is_empty() {
            return Err(AccountError::EmptyBatch);
        }
        if !self.config.borrow().execution_enabled {
            return Err(AccountError::ExecutionDisabled);
        }

        let _guard =
            ReentrancyLock::acquire(&self.lock).map_err(|_| AccountError::Reentrancy)?;

        debug!(caller = %caller, commands = commands.len(), "executing batch");

        let snapshot = self.snapshot();
        let outcome = self
            .run_batch(caller, commands)
            .and_then(|()| self.flush_events());

        match outcome {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!(error = %e, "batch aborted, restoring snapshot");
                self.restore(snapshot);
                Err(e)
            }
        }
    }

    /// Public conditional-order execution entry point. Callable by anyone;
    /// gated internally to the registered keeper identity and the account's
    /// own re-verification of the trigger condition.
    pub fn execute_conditional_order(
        &mut self,
        caller: Address,
        id: OrderId,
    ) -> Result<(), AccountError> {
        if !self.config.borrow().execution_enabled {
            return Err(AccountError::ExecutionDisabled);
        }

        let _guard =
            ReentrancyLock::acquire(&self.lock).map_err(|_| AccountError::Reentrancy)?;

        let snapshot = self.snapshot();
        let outcome = self
            .fill_conditional_order(caller, id)
            .and_then(|()| self.flush_events());

        match outcome {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!(order = ?id, error = %e, "conditional execution aborted");
                self.restore(snapshot);
                Err(e)
            }
        }
    }

    fn run_batch(&mut self, caller: Address, commands: &[Command]) -> Result<(), AccountError> {
        for command in commands {
            let kind = command.kind();

            // role is re-resolved per command: an ownership transfer earlier
            // in the batch changes what the caller may do next
            let role = self.auth.role(caller);
            if !self.auth.permits(role, kind.class()) {
                return Err(AccountError::Unauthorized { caller, kind });
            }

            debug!(caller = %caller, ?kind, "dispatching command");
            self.dispatch(caller, command)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, caller: Address, command: &Command) -> Result<(), AccountError> {
        match *command {
            Command::AccountModifyMargin { delta } => self.account_modify_margin(caller, delta),
            Command::AccountWithdrawNative { amount } => {
                self.account_withdraw_native(caller, amount)
            }
            Command::OwnershipTransfer { new_owner } => self.ownership_transfer(new_owner),
            Command::DelegateAdd { delegate, fee } => self.delegate_add(delegate, fee),
            Command::DelegateRemove { delegate } => self.delegate_remove(delegate),
            Command::PerpModifyMargin { market, delta } => self.perp_modify_margin(market, delta),
            Command::PerpWithdrawAllMargin { market } => self.perp_withdraw_all_margin(market),
            Command::PerpSubmitAtomicOrder {
                market,
                size_delta,
                desired_fill_price,
            } => self.perp_submit_atomic_order(market, size_delta, desired_fill_price),
            Command::PerpSubmitDelayedOrder {
                market,
                size_delta,
                desired_fill_price,
            } => self.perp_submit_delayed_order(market, size_delta, desired_fill_price, false),
            Command::PerpSubmitOffchainDelayedOrder {
                market,
                size_delta,
                desired_fill_price,
            } => self.perp_submit_delayed_order(market, size_delta, desired_fill_price, true),
            Command::PerpCancelDelayedOrder { market } => {
                self.perp_cancel_delayed_order(market, false)
            }
            Command::PerpCancelOffchainDelayedOrder { market } => {
                self.perp_cancel_delayed_order(market, true)
            }
            Command::PerpClosePosition {
                market,
                desired_fill_price,
            } => self.perp_close_position(market, desired_fill_price),
            Command::PerpSubmitCloseDelayedOrder {
                market,
                desired_fill_price,
            } => self.perp_submit_close_delayed_order(market, desired_fill_price, false),
            Command::PerpSubmitCloseOffchainDelayedOrder {
                market,
                desired_fill_price,
            } => self.perp_submit_close_delayed_order(market, desired_fill_price, true),
            Command::ConditionalOrderPlace {
                market,
                margin_delta,
                size_delta,
                target_price,
                kind,
                desired_fill_price,
                reduce_only,
            } => self.conditional_order_place(
                market,
                margin_delta,
                size_delta,
                target_price,
                kind,
                desired_fill_price,
                reduce_only,
            ),
            Command::ConditionalOrderCancel { id } => self.conditional_order_cancel(id),
            Command::CollateralSwap {
                amount_in,
                min_amount_out,
            } => self.collateral_swap(amount_in, min_amount_out),
        }
    }
}
