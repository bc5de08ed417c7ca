use std::collections::HashMap;
use std::mem;

use thiserror::Error;

pub type AccountId = u64;

/// Fractional digits carried by one native unit. Every amount inside the
/// ledger is an integer count of base units scaled by `10^NATIVE_DECIMALS`.
pub const NATIVE_DECIMALS: u32 = 18;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Caller is not the ledger owner")]
    NotOwner,
    #[error("No funder recorded at index {index}")]
    UnknownFunderIndex { index: usize },
}

/// The single escrow aggregate: who may drain it, who contributed how
/// much, and the log of accepted contribution calls.
///
/// The ledger itself only records state transitions that a handler has
/// already validated. [`Ledger::credit`] and the drain methods are
/// infallible, so an operation that got past validation can never leave
/// the aggregate half-mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    owner: AccountId,
    balances: HashMap<AccountId, u128>,
    funders: Vec<AccountId>,
    total_held: u128,
}

impl Ledger {
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            balances: HashMap::new(),
            funders: Vec::new(),
            total_held: 0,
        }
    }

    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn total_held(&self) -> u128 {
        self.total_held
    }

    /// Cumulative base units contributed by `id` and not yet withdrawn.
    /// Identities without an entry read as zero.
    pub fn balance_of(&self, id: AccountId) -> u128 {
        self.balances.get(&id).copied().unwrap_or(0)
    }

    pub fn funder(&self, index: usize) -> Result<AccountId, LedgerError> {
        self.funders
            .get(index)
            .copied()
            .ok_or(LedgerError::UnknownFunderIndex { index })
    }

    pub fn funder_count(&self) -> usize {
        self.funders.len()
    }

    /// All balance entries, zeroed ones included.
    pub fn balances(&self) -> impl Iterator<Item = (AccountId, u128)> + '_ {
        self.balances.iter().map(|(id, amount)| (*id, *amount))
    }

    /// Records one accepted contribution. The funder is appended to the
    /// funder log unconditionally, so a repeat contributor appears once
    /// per accepted call.
    pub fn credit(&mut self, funder: AccountId, amount: u128) {
        self.funders.push(funder);
        *self.balances.entry(funder).or_default() += amount;
        self.total_held += amount;
    }

    /// Owner guard for the withdrawal handlers. Returns the amount a
    /// drain would release, without touching any state.
    pub fn authorize_drain(&self, caller: AccountId) -> Result<u128, LedgerError> {
        if caller != self.owner {
            return Err(LedgerError::NotOwner);
        }
        Ok(self.total_held)
    }

    /// Zeroes every funder balance and clears the funder log, reading the
    /// shared `funders` sequence again on every loop iteration.
    pub fn drain(&mut self) {
        for index in 0..self.funders.len() {
            let funder = self.funders[index];
            self.balances.insert(funder, 0);
        }
        self.funders.clear();
        self.total_held = 0;
    }

    /// Same final state as [`Ledger::drain`], but the funder log is moved
    /// into a local once and iterated there, instead of being re-read per
    /// zeroed entry.
    pub fn drain_prefetched(&mut self) {
        let funders = mem::take(&mut self.funders);
        for funder in funders {
            self.balances.insert(funder, 0);
        }
        self.total_held = 0;
    }
}
