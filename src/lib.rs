//! Custodial multi-asset wallet library
//!
//! A wallet proxy holds native currency and tokens on behalf of users,
//! keeps an internal ledger of who owns what, moves balances between users
//! without touching custody, values holdings through price oracles, and can
//! be upgraded to new logic without losing stored balances.

pub mod batch;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;
pub mod host;
pub mod ledger;
pub mod oracle;
pub mod proxy;
pub mod types;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use proxy::Proxy;
pub use types::{Address, Amount, Asset};
