//! Host environment the wallet runs on
//!
//! Owns native balances for every address and the registry of deployed
//! code: wallet implementations, token contracts, price feeds and proxies.
//! Contract addresses are allocated deterministically from a nonce.
//!
//! The host is cheap to clone (code is shared behind `Arc`), which is how
//! the proxy checkpoints a call and rolls it back on failure.

pub mod token;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::oracle::PriceFeed;
use crate::types::{Address, Amount};
use crate::wallet::WalletLogic;

pub use token::Erc20Token;

/// Code deployed at an address
#[derive(Debug, Clone)]
pub enum Contract {
    Wallet(Arc<dyn WalletLogic>),
    Token(Erc20Token),
    PriceFeed(Arc<dyn PriceFeed>),
    /// A wallet proxy; its storage lives in the `Proxy` value itself
    Proxy,
}

impl Contract {
    pub fn kind(&self) -> &'static str {
        match self {
            Contract::Wallet(_) => "wallet implementation",
            Contract::Token(_) => "token",
            Contract::PriceFeed(_) => "price feed",
            Contract::Proxy => "proxy",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Host {
    native: HashMap<Address, Amount>,
    contracts: HashMap<Address, Contract>,
    nonce: u64,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy code at the next free address
    pub fn deploy(&mut self, contract: Contract) -> Address {
        let mut address = Address::for_deployment(self.nonce);
        self.nonce += 1;
        while self.contracts.contains_key(&address) {
            address = Address::for_deployment(self.nonce);
            self.nonce += 1;
        }

        debug!("Deployed {} at {}", contract.kind(), address);
        self.contracts.insert(address, contract);
        address
    }

    pub fn deploy_wallet_logic(&mut self, logic: Arc<dyn WalletLogic>) -> Address {
        self.deploy(Contract::Wallet(logic))
    }

    pub fn deploy_token(&mut self, token: Erc20Token) -> Address {
        self.deploy(Contract::Token(token))
    }

    pub fn deploy_price_feed(&mut self, feed: Arc<dyn PriceFeed>) -> Address {
        self.deploy(Contract::PriceFeed(feed))
    }

    /// Does the address hold any deployed code
    pub fn has_code(&self, address: &Address) -> bool {
        self.contracts.contains_key(address)
    }

    pub fn contract(&self, address: &Address) -> Option<&Contract> {
        self.contracts.get(address)
    }

    /// Resolve an address to wallet logic, distinguishing "no code" from
    /// "code of another kind"
    pub fn wallet_logic(&self, address: &Address) -> Result<Arc<dyn WalletLogic>> {
        match self.contracts.get(address) {
            Some(Contract::Wallet(logic)) => Ok(logic.clone()),
            Some(other) => Err(Error::InvalidTarget {
                target: *address,
                reason: format!(
                    "Destination contract is a {}, not a wallet implementation",
                    other.kind()
                ),
            }),
            None => Err(Error::InvalidTarget {
                target: *address,
                reason: "Destination address is not a contract".into(),
            }),
        }
    }

    pub fn price_feed(&self, address: &Address) -> Option<Arc<dyn PriceFeed>> {
        match self.contracts.get(address) {
            Some(Contract::PriceFeed(feed)) => Some(feed.clone()),
            _ => None,
        }
    }

    pub fn token(&self, address: &Address) -> Option<&Erc20Token> {
        match self.contracts.get(address) {
            Some(Contract::Token(token)) => Some(token),
            _ => None,
        }
    }

    pub fn token_mut(&mut self, address: &Address) -> Result<&mut Erc20Token> {
        match self.contracts.get_mut(address) {
            Some(Contract::Token(token)) => Ok(token),
            _ => Err(Error::InvalidTarget {
                target: *address,
                reason: "Destination address is not a token contract".into(),
            }),
        }
    }

    pub fn native_balance(&self, address: &Address) -> Amount {
        self.native.get(address).copied().unwrap_or(0)
    }

    /// Credit native currency out of thin air (genesis / faucet)
    pub fn fund(&mut self, address: &Address, amount: Amount) -> Result<()> {
        let balance = self.native.entry(*address).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| Error::TransferFailed(format!("native balance of {} overflows", address)))?;
        Ok(())
    }

    pub fn transfer_native(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        let available = self.native_balance(from);
        if available < amount {
            return Err(Error::TransferFailed(format!(
                "native transfer of {} from {} exceeds balance {}",
                amount, from, available
            )));
        }
        if from == to {
            return Ok(());
        }

        let received = self
            .native_balance(to)
            .checked_add(amount)
            .ok_or_else(|| Error::TransferFailed(format!("native balance of {} overflows", to)))?;

        self.native.insert(*from, available - amount);
        self.native.insert(*to, received);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::StaticPriceFeed;
    use crate::wallet::WalletV1;

    #[test]
    fn test_deploy_assigns_distinct_addresses() {
        let mut host = Host::new();
        let a = host.deploy_token(Erc20Token::new("USDT", 6));
        let b = host.deploy_token(Erc20Token::new("DAI", 18));

        assert_ne!(a, b);
        assert!(host.has_code(&a));
        assert_eq!(host.token(&b).unwrap().symbol(), "DAI");
        assert!(!host.has_code(&Address::from_label("user")));
    }

    #[test]
    fn test_wallet_logic_resolution() {
        let mut host = Host::new();
        let logic = host.deploy_wallet_logic(Arc::new(WalletV1));
        let feed = host.deploy_price_feed(Arc::new(StaticPriceFeed::new("ETH / USD", 2000_00000000, 8)));

        assert_eq!(host.wallet_logic(&logic).unwrap().version(), "v1");

        let err = host.wallet_logic(&feed).unwrap_err();
        assert_eq!(err.code(), "INVALID_TARGET");

        let err = host
            .wallet_logic(&Address::from_label("manager"))
            .unwrap_err();
        assert!(err.to_string().contains("Destination address is not a contract"));
    }

    #[test]
    fn test_native_transfer() {
        let mut host = Host::new();
        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");
        host.fund(&alice, 100).unwrap();

        host.transfer_native(&alice, &bob, 40).unwrap();
        assert_eq!(host.native_balance(&alice), 60);
        assert_eq!(host.native_balance(&bob), 40);

        let err = host.transfer_native(&bob, &alice, 41).unwrap_err();
        assert_eq!(err.code(), "TRANSFER_FAILED");
        assert_eq!(host.native_balance(&bob), 40);
    }

    #[test]
    fn test_clone_is_a_checkpoint() {
        let mut host = Host::new();
        let usdt = host.deploy_token(Erc20Token::new("USDT", 6));
        let alice = Address::from_label("alice");
        let checkpoint = host.clone();

        host.token_mut(&usdt).unwrap().mint(&alice, 10).unwrap();
        host.fund(&alice, 5).unwrap();

        host = checkpoint;
        assert_eq!(host.token(&usdt).unwrap().balance_of(&alice), 0);
        assert_eq!(host.native_balance(&alice), 0);
    }
}
