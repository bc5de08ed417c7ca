use std::collections::HashMap;

use thiserror::Error;

use crate::ledger::AccountId;

#[derive(Debug, Error)]
#[error("Transfer of {amount} base units to account {to} was rejected")]
pub struct TransferError {
    pub to: AccountId,
    pub amount: u128,
}

/// Outbound native-value transport. A withdrawal pushes the pooled
/// amount through this before any ledger state is touched, so a rejected
/// transfer leaves the ledger exactly as it was.
pub trait ValueTransfer {
    fn transfer(&mut self, to: AccountId, amount: u128) -> Result<(), TransferError>;
}

/// Native-value balances held outside the escrow, keyed by account.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InMemoryBank {
    balances: HashMap<AccountId, u128>,
}

impl InMemoryBank {
    pub fn balance_of(&self, id: AccountId) -> u128 {
        self.balances.get(&id).copied().unwrap_or(0)
    }

    pub fn deposit(&mut self, to: AccountId, amount: u128) {
        *self.balances.entry(to).or_default() += amount;
    }

    pub fn balances(&self) -> impl Iterator<Item = (AccountId, u128)> + '_ {
        self.balances.iter().map(|(id, amount)| (*id, *amount))
    }
}

impl ValueTransfer for InMemoryBank {
    fn transfer(&mut self, to: AccountId, amount: u128) -> Result<(), TransferError> {
        let updated = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TransferError { to, amount })?;
        self.balances.insert(to, updated);
        Ok(())
    }
}
