//! Durable wallet storage
//!
//! The one state definition every implementation version operates on. It is
//! owned by the proxy and lent to the current logic for each call, so there
//! is no per-version layout to keep in sync.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::types::{Address, Asset};

pub const MANAGER_EXCLUDED: &str = "Manager is not able to deposit and withdraw";
pub const MANAGER_ONLY_PRICE_FEED: &str = "Only manager not able to set price feed";
pub const MANAGER_ONLY_UPGRADE: &str = "Only manager is able to update implementation";

#[derive(Debug, Clone)]
pub struct WalletState {
    /// Deployer of the proxy, fixed for its lifetime
    manager: Address,

    /// Swap router reference; stored, never invoked
    router: Address,

    pub ledger: Ledger,

    /// Asset -> oracle address; entries are overwritten, never removed
    pub price_feeds: BTreeMap<Asset, Address>,
}

impl WalletState {
    pub fn new(manager: Address, router: Address) -> Self {
        Self {
            manager,
            router,
            ledger: Ledger::new(),
            price_feeds: BTreeMap::new(),
        }
    }

    pub fn manager(&self) -> Address {
        self.manager
    }

    pub fn router(&self) -> Address {
        self.router
    }

    pub fn is_manager(&self, account: &Address) -> bool {
        *account == self.manager
    }

    /// Gate for administrative operations
    pub fn require_manager(&self, caller: &Address, reason: &str) -> Result<()> {
        if self.is_manager(caller) {
            Ok(())
        } else {
            Err(Error::Unauthorized(reason.to_string()))
        }
    }

    /// Gate for account-holder operations; the manager only administers
    pub fn require_not_manager(&self, caller: &Address) -> Result<()> {
        if self.is_manager(caller) {
            Err(Error::Unauthorized(MANAGER_EXCLUDED.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn price_feed(&self, asset: &Asset) -> Option<Address> {
        self.price_feeds.get(asset).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_gates() {
        let manager = Address::from_label("manager");
        let user = Address::from_label("user");
        let state = WalletState::new(manager, Address::from_label("router"));

        assert!(state.require_manager(&manager, MANAGER_ONLY_PRICE_FEED).is_ok());
        assert_eq!(
            state.require_manager(&user, MANAGER_ONLY_PRICE_FEED),
            Err(Error::Unauthorized(MANAGER_ONLY_PRICE_FEED.to_string()))
        );

        assert!(state.require_not_manager(&user).is_ok());
        assert_eq!(
            state.require_not_manager(&manager),
            Err(Error::Unauthorized(MANAGER_EXCLUDED.to_string()))
        );
    }
}
