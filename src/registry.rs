// Factory-role account registry. The account calls in exactly twice per
// lifetime event: once at construction to register, once per ownership
// transfer so the registry can re-index by owner.

use crate::types::Address;
use std::collections::HashMap;

pub trait AccountRegistry {
    fn register(&mut self, account: Address, owner: Address);

    fn owner_of(&self, account: Address) -> Option<Address>;

    fn ownership_transferred(&mut self, account: Address, old_owner: Address, new_owner: Address);
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    owners: HashMap<Address, Address>,
    by_owner: HashMap<Address, Vec<Address>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accounts_of(&self, owner: Address) -> &[Address] {
        self.by_owner.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl AccountRegistry for InMemoryRegistry {
    fn register(&mut self, account: Address, owner: Address) {
        self.owners.insert(account, owner);
        self.by_owner.entry(owner).or_default().push(account);
    }

    fn owner_of(&self, account: Address) -> Option<Address> {
        self.owners.get(&account).copied()
    }

    fn ownership_transferred(&mut self, account: Address, old_owner: Address, new_owner: Address) {
        self.owners.insert(account, new_owner);
        if let Some(accounts) = self.by_owner.get_mut(&old_owner) {
            accounts.retain(|&a| a != account);
        }
        self.by_owner.entry(new_owner).or_default().push(account);
    }
}
