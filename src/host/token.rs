//! ERC-20 style token contract
//!
//! The wallet only relies on `balance_of`, `allowance`, `transfer` and
//! `transfer_from`; `mint` and `approve` are driven by account holders and
//! tests. Failure strings follow the usual ERC-20 revert reasons so callers
//! can assert on cause.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Address, Amount};

#[derive(Debug, Clone)]
pub struct Erc20Token {
    symbol: String,
    decimals: u8,
    total_supply: Amount,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    /// Paused tokens reject every movement
    paused: bool,
}

impl Erc20Token {
    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            total_supply: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            paused: false,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, owner: &Address) -> Amount {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn mint(&mut self, to: &Address, amount: Amount) -> Result<()> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| Error::TransferFailed("ERC20: mint overflows total supply".into()))?;

        // balance <= total_supply, so this cannot overflow once supply fits
        *self.balances.entry(*to).or_insert(0) += amount;
        self.total_supply = supply;
        debug!("{}: minted {} to {}", self.symbol, amount, to);
        Ok(())
    }

    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances.insert((*owner, *spender), amount);
        debug!("{}: {} approved {} for {}", self.symbol, owner, amount, spender);
    }

    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        if self.paused {
            return Err(Error::TransferFailed(format!(
                "{}: token transfers are paused",
                self.symbol
            )));
        }

        let available = self.balance_of(from);
        if available < amount {
            return Err(Error::TransferFailed(
                "ERC20: transfer amount exceeds balance".into(),
            ));
        }

        self.balances.insert(*from, available - amount);
        *self.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`
    ///
    /// The allowance is checked first, then the balance; the allowance is
    /// only consumed once the transfer itself went through.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(Error::InsufficientAllowance {
                allowance,
                required: amount,
            });
        }

        self.transfer(from, to, amount)?;
        self.allowances
            .insert((*from, *spender), allowance - amount);
        Ok(())
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn unpause(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Address {
        Address::from_label("user")
    }

    fn wallet() -> Address {
        Address::for_deployment(0)
    }

    #[test]
    fn test_transfer_from_requires_allowance_first() {
        let mut usdt = Erc20Token::new("USDT", 6);
        usdt.mint(&user(), 100).unwrap();

        let err = usdt
            .transfer_from(&wallet(), &user(), &wallet(), 1000)
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientAllowance { allowance: 0, .. }));

        usdt.mint(&user(), 100).unwrap();
        usdt.approve(&user(), &wallet(), 1000);
        let err = usdt
            .transfer_from(&wallet(), &user(), &wallet(), 1000)
            .unwrap_err();
        assert_eq!(
            err,
            Error::TransferFailed("ERC20: transfer amount exceeds balance".into())
        );
        // Failed transfer must not consume allowance
        assert_eq!(usdt.allowance(&user(), &wallet()), 1000);
    }

    #[test]
    fn test_transfer_from_moves_funds() {
        let mut usdt = Erc20Token::new("USDT", 6);
        usdt.mint(&user(), 10_000).unwrap();
        usdt.approve(&user(), &wallet(), 10_000);

        usdt.transfer_from(&wallet(), &user(), &wallet(), 100)
            .unwrap();

        assert_eq!(usdt.balance_of(&user()), 9_900);
        assert_eq!(usdt.balance_of(&wallet()), 100);
        assert_eq!(usdt.allowance(&user(), &wallet()), 9_900);
        assert_eq!(usdt.total_supply(), 10_000);
    }

    #[test]
    fn test_paused_token_rejects_transfers() {
        let mut usdt = Erc20Token::new("USDT", 6);
        usdt.mint(&wallet(), 50).unwrap();
        usdt.pause();

        let err = usdt.transfer(&wallet(), &user(), 10).unwrap_err();
        assert_eq!(err.code(), "TRANSFER_FAILED");
        assert_eq!(usdt.balance_of(&wallet()), 50);

        usdt.unpause();
        usdt.transfer(&wallet(), &user(), 10).unwrap();
        assert_eq!(usdt.balance_of(&user()), 10);
    }
}
