//! Configuration loading and validation
//!
//! A configuration describes the genesis of a local deployment: who manages
//! the wallet, which implementation it starts on, which accounts exist with
//! how much native currency, and which tokens and price feeds are deployed.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::wallet::ImplementationVersion;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub deployment: DeploymentConfig,
    #[serde(default = "default_accounts")]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    #[serde(default)]
    pub price_feeds: Vec<PriceFeedConfig>,
}

/// Who deploys the proxy and what it starts on
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentConfig {
    /// Label of the deployer; becomes the manager
    #[serde(default = "default_manager")]
    pub manager: String,

    /// Label of the router address stored at deployment
    #[serde(default = "default_router")]
    pub router: String,

    #[serde(default = "default_implementation")]
    pub implementation: ImplementationVersion,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            manager: default_manager(),
            router: default_router(),
            implementation: default_implementation(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Label (lowercase, no spaces); the address is derived from it
    pub name: String,

    /// Native currency endowment at genesis
    #[serde(default)]
    pub native: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,

    #[serde(default = "default_token_decimals")]
    pub decimals: u8,

    /// Genesis mints, account label -> amount
    #[serde(default)]
    pub mints: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceFeedConfig {
    /// "native" or a token symbol
    pub asset: String,

    /// Price answer, scaled by `decimals`
    pub answer: i64,

    #[serde(default = "default_feed_decimals")]
    pub decimals: u8,

    /// Deploy a feed that fails every read
    #[serde(default)]
    pub offline: bool,

    /// Register the feed with the wallet at genesis
    #[serde(default = "default_true")]
    pub register: bool,
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_manager() -> String {
    "manager".to_string()
}
fn default_router() -> String {
    "router".to_string()
}
fn default_implementation() -> ImplementationVersion {
    ImplementationVersion::V1
}
fn default_accounts() -> Vec<AccountConfig> {
    vec![
        AccountConfig {
            name: default_manager(),
            native: 1_000_000,
        },
        AccountConfig {
            name: "user".to_string(),
            native: 1_000_000,
        },
        AccountConfig {
            name: "user2".to_string(),
            native: 1_000_000,
        },
    ]
}
fn default_token_decimals() -> u8 {
    18
}
fn default_feed_decimals() -> u8 {
    8
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deployment: DeploymentConfig::default(),
            accounts: default_accounts(),
            tokens: Vec::new(),
            price_feeds: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            .set_default("deployment.manager", default_manager())?
            .set_default("deployment.router", default_router())?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix MINIWALLET__)
            .add_source(
                config::Environment::with_prefix("MINIWALLET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate labels and references between sections
    pub fn validate(&self) -> Result<()> {
        let mut names = std::collections::BTreeSet::new();
        for account in &self.accounts {
            validate_label("account name", &account.name)?;
            if !names.insert(account.name.as_str()) {
                anyhow::bail!("Duplicate account name: {}", account.name);
            }
        }

        validate_label("deployment.manager", &self.deployment.manager)?;
        validate_label("deployment.router", &self.deployment.router)?;
        if !names.contains(self.deployment.manager.as_str()) {
            anyhow::bail!(
                "deployment.manager '{}' is not a configured account",
                self.deployment.manager
            );
        }

        let mut symbols = std::collections::BTreeSet::new();
        for token in &self.tokens {
            validate_label("token symbol", &token.symbol)?;
            if token.symbol == "native" {
                anyhow::bail!("Token symbol 'native' is reserved");
            }
            if !symbols.insert(token.symbol.as_str()) {
                anyhow::bail!("Duplicate token symbol: {}", token.symbol);
            }
            if token.decimals > 36 {
                anyhow::bail!("Token {} decimals cannot exceed 36", token.symbol);
            }
            for holder in token.mints.keys() {
                if !names.contains(holder.as_str()) {
                    anyhow::bail!(
                        "Token {} mints to unknown account '{}'",
                        token.symbol,
                        holder
                    );
                }
            }
        }

        let mut priced = std::collections::BTreeSet::new();
        for feed in &self.price_feeds {
            if feed.asset != "native" && !symbols.contains(feed.asset.as_str()) {
                anyhow::bail!("Price feed for unknown asset '{}'", feed.asset);
            }
            if feed.register && !priced.insert(feed.asset.as_str()) {
                anyhow::bail!("More than one registered price feed for '{}'", feed.asset);
            }
            if feed.decimals > 36 {
                anyhow::bail!("Price feed for {} decimals cannot exceed 36", feed.asset);
            }
            if feed.answer <= 0 && !feed.offline {
                tracing::warn!(
                    "Price feed for '{}' answers {} - valuations will fail",
                    feed.asset,
                    feed.answer
                );
            }
        }

        Ok(())
    }

    /// Display configuration with account endowments summarized
    pub fn masked_display(&self) -> String {
        let mut out = format!(
            r#"Configuration:
  Deployment:
    manager: {}
    router: {}
    implementation: {}
  Accounts:
"#,
            self.deployment.manager, self.deployment.router, self.deployment.implementation,
        );

        for account in &self.accounts {
            out.push_str(&format!("    {}: {} native\n", account.name, account.native));
        }

        out.push_str("  Tokens:\n");
        if self.tokens.is_empty() {
            out.push_str("    (none)\n");
        }
        for token in &self.tokens {
            let minted: u128 = token.mints.values().map(|v| u128::from(*v)).sum();
            out.push_str(&format!(
                "    {}: decimals={} minted={} holders={}\n",
                token.symbol,
                token.decimals,
                minted,
                token.mints.len()
            ));
        }

        out.push_str("  Price feeds:\n");
        if self.price_feeds.is_empty() {
            out.push_str("    (none)\n");
        }
        for feed in &self.price_feeds {
            out.push_str(&format!(
                "    {}: answer={} decimals={}{}{}\n",
                feed.asset,
                feed.answer,
                feed.decimals,
                if feed.offline { " (offline)" } else { "" },
                if feed.register { "" } else { " (unregistered)" },
            ));
        }

        out
    }
}

/// Labels are lowercased by environment overrides, so only lowercase is valid
fn validate_label(what: &str, label: &str) -> Result<()> {
    if label.is_empty() {
        anyhow::bail!("{} cannot be empty", what);
    }
    if label
        .chars()
        .any(|c| c.is_whitespace() || c.is_ascii_uppercase())
    {
        anyhow::bail!("{} '{}' must be lowercase with no spaces", what, label);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.deployment.manager, "manager");
        assert_eq!(config.deployment.implementation, ImplementationVersion::V1);
        assert_eq!(config.accounts.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.deployment.router, "router");
        assert_eq!(config.accounts[1].name, "user");
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
[deployment]
manager = "admin"
implementation = "v2"

[[accounts]]
name = "admin"
native = 10

[[accounts]]
name = "alice"
native = 500

[[tokens]]
symbol = "usdt"
decimals = 6
mints = { alice = 1000 }

[[price_feeds]]
asset = "native"
answer = 200000000000
"#,
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.deployment.manager, "admin");
        assert_eq!(config.deployment.router, "router");
        assert_eq!(config.deployment.implementation, ImplementationVersion::V2);
        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.tokens[0].decimals, 6);
        assert_eq!(config.tokens[0].mints.get("alice"), Some(&1000));
        assert_eq!(config.price_feeds[0].decimals, 8);
        assert!(config.price_feeds[0].register);
        assert!(!config.price_feeds[0].offline);
    }

    #[test]
    fn test_manager_must_be_an_account() {
        let file = write_config(
            r#"
[deployment]
manager = "ghost"
"#,
        );
        let err = Config::load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("not a configured account"));
    }

    #[test]
    fn test_validate_rejects_bad_labels() {
        let mut config = Config::default();
        config.accounts.push(AccountConfig {
            name: "Big Spender".into(),
            native: 0,
        });
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.accounts.push(AccountConfig {
            name: "user".into(),
            native: 0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_token_references() {
        let mut config = Config::default();
        let mut mints = BTreeMap::new();
        mints.insert("nobody".to_string(), 5);
        config.tokens.push(TokenConfig {
            symbol: "usdt".into(),
            decimals: 6,
            mints,
        });
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.price_feeds.push(PriceFeedConfig {
            asset: "dai".into(),
            answer: 1,
            decimals: 8,
            offline: false,
            register: true,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_masked_display_large_mints() {
        let mut config = Config::default();
        let mut mints = BTreeMap::new();
        mints.insert("user".to_string(), u64::MAX);
        mints.insert("user2".to_string(), 1);
        config.tokens.push(TokenConfig {
            symbol: "usdt".into(),
            decimals: 6,
            mints,
        });
        assert!(config.validate().is_ok());

        let display = config.masked_display();
        assert!(display.contains("minted=18446744073709551616 holders=2"));
    }

    #[test]
    fn test_masked_display() {
        let config = Config::default();
        let display = config.masked_display();
        assert!(display.contains("implementation: v1"));
        assert!(display.contains("user2: 1000000 native"));
        assert!(display.contains("(none)"));
    }
}
