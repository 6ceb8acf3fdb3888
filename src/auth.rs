//! Ownership and delegation.
//!
//! One owner holds the irrevocable permissions; delegates are granted a
//! restricted trading subset and carry a per-delegate fee rate. Permission is
//! a capability check per command class, consulted centrally by the dispatcher.

use crate::commands::CommandClass;
use crate::types::{Address, Bps};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Resolved identity of a caller relative to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerRole {
    Owner,
    Delegate,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationGate {
    owner: Address,
    delegates: HashMap<Address, Bps>,
}

impl AuthorizationGate {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            delegates: HashMap::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_owner(&self, caller: Address) -> bool {
        caller == self.owner
    }

    pub fn is_authorized(&self, caller: Address) -> bool {
        self.is_owner(caller) || self.delegates.contains_key(&caller)
    }

    pub fn role(&self, caller: Address) -> CallerRole {
        if self.is_owner(caller) {
            CallerRole::Owner
        } else if self.delegates.contains_key(&caller) {
            CallerRole::Delegate
        } else {
            CallerRole::None
        }
    }

    /// Whether `role` may execute a command of the given class. Public-class
    /// entry points do their own internal gating.
    pub fn permits(&self, role: CallerRole, class: CommandClass) -> bool {
        match class {
            CommandClass::OwnerOnly => role == CallerRole::Owner,
            CommandClass::OwnerOrDelegate => {
                matches!(role, CallerRole::Owner | CallerRole::Delegate)
            }
            CommandClass::Public => true,
        }
    }

    pub fn delegate_fee(&self, delegate: Address) -> Option<Bps> {
        self.delegates.get(&delegate).copied()
    }

    pub fn delegates(&self) -> impl Iterator<Item = (&Address, &Bps)> {
        self.delegates.iter()
    }

    pub fn add_delegate(&mut self, delegate: Address, fee: Bps, max_fee: Bps) -> Result<(), AuthError> {
        if delegate.is_zero() {
            return Err(AuthError::ZeroDelegateAddress);
        }
        if delegate == self.owner || self.delegates.contains_key(&delegate) {
            return Err(AuthError::DelegateExists(delegate));
        }
        if fee > max_fee {
            return Err(AuthError::DelegateFeeTooHigh { fee, max: max_fee });
        }
        self.delegates.insert(delegate, fee);
        Ok(())
    }

    pub fn remove_delegate(&mut self, delegate: Address) -> Result<(), AuthError> {
        if delegate.is_zero() {
            return Err(AuthError::ZeroDelegateAddress);
        }
        if self.delegates.remove(&delegate).is_none() {
            return Err(AuthError::DelegateNotFound(delegate));
        }
        Ok(())
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) -> Result<Address, AuthError> {
        if new_owner.is_zero() {
            return Err(AuthError::ZeroOwnerAddress);
        }
        let previous = self.owner;
        self.owner = new_owner;
        // the new owner inherits nothing from the old delegate set entry, if any
        self.delegates.remove(&new_owner);
        Ok(previous)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("delegate address must be nonzero")]
    ZeroDelegateAddress,

    #[error("owner address must be nonzero")]
    ZeroOwnerAddress,

    #[error("address {0} is already a delegate")]
    DelegateExists(Address),

    #[error("address {0} is not a delegate")]
    DelegateNotFound(Address),

    #[error("delegate fee {fee:?} exceeds maximum {max:?}")]
    DelegateFeeTooHigh { fee: Bps, max: Bps },
}
