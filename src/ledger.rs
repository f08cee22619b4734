//! Balance ledger
//!
//! Maps (account, asset) to a non-negative balance and remembers, per
//! account, every asset it has ever been credited in. Entries are created
//! on first credit and never removed; a zero balance stays listed.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::{Error, Result};
use crate::types::{Address, Amount, Asset};

/// Assets an account has touched, in first-touched order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetSet {
    order: Vec<Asset>,
    members: HashSet<Asset>,
}

impl AssetSet {
    /// Register an asset; returns true if it was not yet a member
    pub fn insert(&mut self, asset: Asset) -> bool {
        if self.members.insert(asset) {
            self.order.push(asset);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, asset: &Asset) -> bool {
        self.members.contains(asset)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: HashMap<(Address, Asset), Amount>,
    assets: HashMap<Address, AssetSet>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance, 0 for keys never credited
    pub fn balance(&self, account: &Address, asset: &Asset) -> Amount {
        self.balances
            .get(&(*account, *asset))
            .copied()
            .unwrap_or(0)
    }

    /// Credit an account and register the asset in its AssetSet
    pub fn credit(&mut self, account: &Address, asset: &Asset, amount: Amount) -> Result<Amount> {
        let current = self.balance(account, asset);
        let updated = current
            .checked_add(amount)
            .ok_or(Error::BalanceOverflow {
                account: *account,
                asset: *asset,
            })?;

        self.balances.insert((*account, *asset), updated);
        self.assets.entry(*account).or_default().insert(*asset);
        Ok(updated)
    }

    /// Debit an account; fails without touching the entry if funds are short
    pub fn debit(&mut self, account: &Address, asset: &Asset, amount: Amount) -> Result<Amount> {
        let available = self.balance(account, asset);
        if available < amount {
            return Err(Error::InsufficientBalance {
                asset: *asset,
                available,
                required: amount,
            });
        }

        let updated = available - amount;
        // A zero-amount debit of an untouched key must not create an entry
        if let Some(balance) = self.balances.get_mut(&(*account, *asset)) {
            *balance = updated;
        }
        Ok(updated)
    }

    /// Move balance between two accounts' entries for the same asset
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        asset: &Asset,
        amount: Amount,
    ) -> Result<()> {
        // Validate the credit side before mutating anything
        if from != to {
            self.balance(to, asset)
                .checked_add(amount)
                .ok_or(Error::BalanceOverflow {
                    account: *to,
                    asset: *asset,
                })?;
        }

        self.debit(from, asset, amount)?;
        self.credit(to, asset, amount)?;
        Ok(())
    }

    /// Assets the account has touched, in first-touched order
    pub fn assets_of(&self, account: &Address) -> Option<&AssetSet> {
        self.assets.get(account)
    }

    /// (asset, balance) pairs for every asset in the account's AssetSet
    pub fn balances_of(&self, account: &Address) -> Vec<(Asset, Amount)> {
        self.assets
            .get(account)
            .map(|set| {
                set.iter()
                    .map(|asset| (*asset, self.balance(account, asset)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sum of all account balances for an asset
    pub fn total_liabilities(&self, asset: &Asset) -> Amount {
        self.balances
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, balance)| *balance)
            .sum()
    }

    /// Every asset any account has touched
    pub fn known_assets(&self) -> BTreeSet<Asset> {
        self.assets
            .values()
            .flat_map(|set| set.iter().copied())
            .collect()
    }

    /// Accounts with at least one ledger entry
    pub fn accounts(&self) -> impl Iterator<Item = &Address> {
        self.assets.keys()
    }
}
