//! Local deployment built from configuration
//!
//! Deploys both implementation versions, the configured tokens and price
//! feeds, funds the accounts and stands up the proxy on the configured
//! starting implementation.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::host::{Erc20Token, Host};
use crate::oracle::{OfflinePriceFeed, PriceFeed, StaticPriceFeed};
use crate::proxy::Proxy;
use crate::types::{Address, Amount, Asset};
use crate::wallet::ImplementationVersion;

#[derive(Debug, Clone)]
pub struct Deployment {
    pub host: Host,
    pub proxy: Proxy,
    /// Account label -> address
    pub accounts: BTreeMap<String, Address>,
    /// Token symbol -> contract
    pub tokens: BTreeMap<String, Address>,
    pub implementations: BTreeMap<ImplementationVersion, Address>,
    /// Asset label -> deployed feeds, registered or not
    pub feeds: BTreeMap<String, Vec<Address>>,
}

/// One row of the balance sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceRow {
    pub account: String,
    pub address: Address,
    pub asset: String,
    /// Credited in the wallet ledger
    pub ledger: Amount,
    /// Held outside the wallet
    pub external: Amount,
}

impl Deployment {
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut host = Host::new();

        let mut accounts = BTreeMap::new();
        for account in &config.accounts {
            let address = Address::from_label(&account.name);
            host.fund(&address, Amount::from(account.native))?;
            accounts.insert(account.name.clone(), address);
        }

        let mut implementations = BTreeMap::new();
        for version in ImplementationVersion::ALL {
            let address = host.deploy_wallet_logic(version.build());
            implementations.insert(version, address);
        }

        let mut tokens = BTreeMap::new();
        for token in &config.tokens {
            let mut contract = Erc20Token::new(token.symbol.clone(), token.decimals);
            for (holder, amount) in &token.mints {
                let holder = lookup(&accounts, holder, "account")?;
                contract.mint(&holder, Amount::from(*amount))?;
            }
            let address = host.deploy_token(contract);
            info!("Token {} deployed at {}", token.symbol, address);
            tokens.insert(token.symbol.clone(), address);
        }

        let manager = lookup(&accounts, &config.deployment.manager, "account")?;
        let router = Address::from_label(&config.deployment.router);
        let implementation = implementations[&config.deployment.implementation];
        let mut proxy = Proxy::deploy(&mut host, manager, implementation, router)?;

        let mut feeds: BTreeMap<String, Vec<Address>> = BTreeMap::new();
        for feed in &config.price_feeds {
            let description = format!("{} / USD", feed.asset.to_uppercase());
            let logic: Arc<dyn PriceFeed> = if feed.offline {
                Arc::new(OfflinePriceFeed::new(description))
            } else {
                Arc::new(StaticPriceFeed::new(
                    description,
                    i128::from(feed.answer),
                    feed.decimals,
                ))
            };
            let address = host.deploy_price_feed(logic);
            feeds.entry(feed.asset.clone()).or_default().push(address);

            if feed.register {
                let asset = resolve_asset(&tokens, &feed.asset)?;
                proxy.set_price_feed(&mut host, manager, asset, address)?;
            }
        }

        info!(
            "Deployment ready: {} accounts, {} tokens, {} feeds",
            accounts.len(),
            tokens.len(),
            config.price_feeds.len()
        );

        Ok(Self {
            host,
            proxy,
            accounts,
            tokens,
            implementations,
            feeds,
        })
    }

    /// Resolve an account label, or accept a literal `0x` address
    pub fn account(&self, label: &str) -> Result<Address> {
        if label.starts_with("0x") {
            return label.parse().map_err(Error::Config);
        }
        lookup(&self.accounts, label, "account")
    }

    /// Resolve "native", a token symbol, or a literal `0x` address
    pub fn asset(&self, label: &str) -> Result<Asset> {
        resolve_asset(&self.tokens, label)
    }

    pub fn token(&self, symbol: &str) -> Result<Address> {
        match self.asset(symbol)? {
            Asset::Token(address) => Ok(address),
            Asset::Native => Err(Error::Config("native is not a token".into())),
        }
    }

    pub fn implementation(&self, version: ImplementationVersion) -> Address {
        self.implementations[&version]
    }

    /// Human label for an asset
    pub fn asset_label(&self, asset: &Asset) -> String {
        match asset {
            Asset::Native => "native".to_string(),
            Asset::Token(address) => self
                .tokens
                .iter()
                .find(|(_, a)| *a == address)
                .map(|(symbol, _)| symbol.clone())
                .unwrap_or_else(|| address.to_string()),
        }
    }

    /// Ledger and external holdings of every configured account
    pub fn balance_sheet(&self) -> Vec<BalanceRow> {
        let ledger = &self.proxy.state().ledger;
        let mut assets = vec![Asset::Native];
        assets.extend(self.tokens.values().map(|a| Asset::Token(*a)));

        let mut rows = Vec::new();
        for (name, address) in &self.accounts {
            for asset in &assets {
                let external = match asset {
                    Asset::Native => self.host.native_balance(address),
                    Asset::Token(token) => self
                        .host
                        .token(token)
                        .map(|t| t.balance_of(address))
                        .unwrap_or(0),
                };
                rows.push(BalanceRow {
                    account: name.clone(),
                    address: *address,
                    asset: self.asset_label(asset),
                    ledger: ledger.balance(address, asset),
                    external,
                });
            }
        }
        rows
    }
}

fn lookup(map: &BTreeMap<String, Address>, label: &str, what: &str) -> Result<Address> {
    map.get(label)
        .copied()
        .ok_or_else(|| Error::Config(format!("Unknown {} '{}'", what, label)))
}

fn resolve_asset(tokens: &BTreeMap<String, Address>, label: &str) -> Result<Asset> {
    if label.starts_with("0x") || label.eq_ignore_ascii_case("native") {
        return label.parse().map_err(Error::Config);
    }
    lookup(tokens, label, "token").map(Asset::Token)
}
