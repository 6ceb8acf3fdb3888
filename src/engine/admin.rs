//! Owner-only account administration: collateral in and out, ownership,
//! delegation, and collateral swaps through the external exchange.

use super::core::MarginAccount;
use super::results::AccountError;
use crate::events::{
    CollateralSwappedEvent, DelegateAddedEvent, DelegateRemovedEvent, DepositEvent, EventPayload,
    NativeWithdrawalEvent, OwnershipTransferredEvent, WithdrawalEvent,
};
use crate::types::{Address, Bps, Quote};

impl MarginAccount {
    /// Positive delta deposits into free margin, negative withdraws from it.
    pub(super) fn account_modify_margin(
        &mut self,
        caller: Address,
        delta: Quote,
    ) -> Result<(), AccountError> {
        if delta.is_zero() {
            return Err(AccountError::InvalidParameter {
                reason: "margin delta must be nonzero".to_string(),
            });
        }

        if delta.is_negative() {
            let amount = delta.abs();
            self.ledger.withdraw(amount)?;
            let new_balance = self.ledger.balance();
            self.push_event(EventPayload::Withdrawal(WithdrawalEvent {
                to: caller,
                amount,
                new_balance,
            }));
        } else {
            self.ledger.deposit(delta)?;
            let new_balance = self.ledger.balance();
            self.push_event(EventPayload::Deposit(DepositEvent {
                from: caller,
                amount: delta,
                new_balance,
            }));
        }
        Ok(())
    }

    pub(super) fn account_withdraw_native(
        &mut self,
        caller: Address,
        amount: Quote,
    ) -> Result<(), AccountError> {
        self.ledger.withdraw(amount)?;
        self.push_event(EventPayload::NativeWithdrawal(NativeWithdrawalEvent {
            to: caller,
            amount,
        }));
        Ok(())
    }

    pub(super) fn ownership_transfer(&mut self, new_owner: Address) -> Result<(), AccountError> {
        let old_owner = self.auth.transfer_ownership(new_owner)?;
        // registry is notified in the commit phase, once the batch is known good
        self.pending_ownership = Some((old_owner, new_owner));
        self.push_event(EventPayload::OwnershipTransferred(OwnershipTransferredEvent {
            old_owner,
            new_owner,
        }));
        Ok(())
    }

    pub(super) fn delegate_add(&mut self, delegate: Address, fee: Bps) -> Result<(), AccountError> {
        let max_fee = self.config.borrow().max_delegate_fee;
        self.auth.add_delegate(delegate, fee, max_fee)?;
        self.push_event(EventPayload::DelegateAdded(DelegateAddedEvent {
            delegate,
            fee,
        }));
        Ok(())
    }

    pub(super) fn delegate_remove(&mut self, delegate: Address) -> Result<(), AccountError> {
        self.auth.remove_delegate(delegate)?;
        self.push_event(EventPayload::DelegateRemoved(DelegateRemovedEvent {
            delegate,
        }));
        Ok(())
    }

    pub(super) fn collateral_swap(
        &mut self,
        amount_in: Quote,
        min_amount_out: Quote,
    ) -> Result<(), AccountError> {
        self.ledger.withdraw(amount_in)?;
        let amount_out = self
            .exchange
            .borrow_mut()
            .swap(amount_in, min_amount_out)?;
        if !amount_out.is_zero() {
            self.ledger.deposit(amount_out)?;
        }
        self.push_event(EventPayload::CollateralSwapped(CollateralSwappedEvent {
            amount_in,
            amount_out,
        }));
        Ok(())
    }
}
