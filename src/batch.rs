//! Batch replay of wallet calls
//!
//! A batch is a JSON array of operations addressed by account label. Each
//! operation runs as its own call against the deployment and produces a
//! receipt; a failed operation reverts only itself.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::deploy::{BalanceRow, Deployment};
use crate::error::{Error, Result};
use crate::oracle::{OfflinePriceFeed, PriceFeed, StaticPriceFeed};
use crate::types::{Amount, Asset, CallContext};
use crate::wallet::state::MANAGER_ONLY_PRICE_FEED;
use crate::wallet::{Call, ImplementationVersion, LogEntry, Output};

/// One operation of a batch file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BatchOp {
    /// Native value defaults to `amount` for native deposits, zero otherwise
    Deposit {
        from: String,
        asset: String,
        amount: u64,
        #[serde(default)]
        value: Option<u64>,
    },
    Withdraw {
        from: String,
        asset: String,
        amount: u64,
    },
    Remit {
        from: String,
        to: String,
        asset: String,
        amount: u64,
        #[serde(default)]
        value: u64,
    },
    /// Token approval granting the wallet an allowance
    Approve {
        from: String,
        token: String,
        amount: u64,
    },
    /// Deploy a fresh feed and point the wallet at it
    SetPriceFeed {
        from: String,
        asset: String,
        answer: i64,
        #[serde(default = "default_feed_decimals")]
        decimals: u8,
        #[serde(default)]
        offline: bool,
    },
    Upgrade {
        from: String,
        to: ImplementationVersion,
    },
    Balance {
        account: String,
        asset: String,
    },
    AllBalances {
        from: String,
    },
    UsdValue {
        from: String,
    },
    Manager {
        from: String,
    },
}

fn default_feed_decimals() -> u8 {
    8
}

impl BatchOp {
    pub fn name(&self) -> &'static str {
        match self {
            BatchOp::Deposit { .. } => "deposit",
            BatchOp::Withdraw { .. } => "withdraw",
            BatchOp::Remit { .. } => "remit",
            BatchOp::Approve { .. } => "approve",
            BatchOp::SetPriceFeed { .. } => "set_price_feed",
            BatchOp::Upgrade { .. } => "upgrade",
            BatchOp::Balance { .. } => "balance",
            BatchOp::AllBalances { .. } => "all_balances",
            BatchOp::UsdValue { .. } => "usd_value",
            BatchOp::Manager { .. } => "manager",
        }
    }

    /// Label of the account issuing the operation
    pub fn sender(&self) -> &str {
        match self {
            BatchOp::Deposit { from, .. }
            | BatchOp::Withdraw { from, .. }
            | BatchOp::Remit { from, .. }
            | BatchOp::Approve { from, .. }
            | BatchOp::SetPriceFeed { from, .. }
            | BatchOp::Upgrade { from, .. }
            | BatchOp::AllBalances { from }
            | BatchOp::UsdValue { from }
            | BatchOp::Manager { from } => from,
            BatchOp::Balance { account, .. } => account,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptError {
    pub code: String,
    pub message: String,
}

impl From<&Error> for ReceiptError {
    fn from(e: &Error) -> Self {
        Self {
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

/// Outcome of a single batch operation
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub id: Uuid,
    pub index: usize,
    pub op: &'static str,
    pub from: String,
    pub status: ReceiptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Output>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReceiptError>,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// Everything a replay produced
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub receipts: Vec<Receipt>,
    pub balances: Vec<BalanceRow>,
    pub events: Vec<LogEntry>,
    pub solvent: bool,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.receipts.iter().filter(|r| !r.is_success()).count()
    }
}

pub fn parse_batch(json: &str) -> Result<Vec<BatchOp>> {
    Ok(serde_json::from_str(json)?)
}

/// Replay every operation in order; failures are recorded, not fatal
pub fn run_batch(deployment: &mut Deployment, ops: &[BatchOp]) -> BatchReport {
    info!("Replaying {} operations", ops.len());

    let mut receipts = Vec::with_capacity(ops.len());
    for (index, op) in ops.iter().enumerate() {
        let result = apply(deployment, op);
        let (status, output, error) = match result {
            Ok(output) => {
                debug!("#{} {} ok", index, op.name());
                (ReceiptStatus::Success, output, None)
            }
            Err(e) => {
                warn!("#{} {} by {} failed: {}", index, op.name(), op.sender(), e);
                (ReceiptStatus::Reverted, None, Some(ReceiptError::from(&e)))
            }
        };

        receipts.push(Receipt {
            id: Uuid::new_v4(),
            index,
            op: op.name(),
            from: op.sender().to_string(),
            status,
            output,
            error,
        });
    }

    let report = BatchReport {
        receipts,
        balances: deployment.balance_sheet(),
        events: deployment.proxy.events().to_vec(),
        solvent: deployment.proxy.is_solvent(&deployment.host),
    };

    info!(
        "Replay finished: {} ok, {} reverted",
        report.receipts.len() - report.failures(),
        report.failures()
    );
    report
}

/// Apply one operation; `Some` output for calls that return a value
pub fn apply(deployment: &mut Deployment, op: &BatchOp) -> Result<Option<Output>> {
    let caller = deployment.account(op.sender())?;

    let (tx, call) = match op {
        BatchOp::Deposit {
            asset,
            amount,
            value,
            ..
        } => {
            let asset = deployment.asset(asset)?;
            let value = value.unwrap_or(if asset.is_native() { *amount } else { 0 });
            (
                CallContext::new(caller).with_value(Amount::from(value)),
                Call::Deposit {
                    asset,
                    amount: Amount::from(*amount),
                },
            )
        }
        BatchOp::Withdraw { asset, amount, .. } => (
            CallContext::new(caller),
            Call::Withdraw {
                asset: deployment.asset(asset)?,
                amount: Amount::from(*amount),
            },
        ),
        BatchOp::Remit {
            to,
            asset,
            amount,
            value,
            ..
        } => (
            CallContext::new(caller).with_value(Amount::from(*value)),
            Call::Remit {
                target: deployment.account(to)?,
                asset: deployment.asset(asset)?,
                amount: Amount::from(*amount),
            },
        ),
        BatchOp::Approve { token, amount, .. } => {
            let token = deployment.token(token)?;
            let spender = deployment.proxy.address();
            deployment
                .host
                .token_mut(&token)?
                .approve(&caller, &spender, Amount::from(*amount));
            return Ok(None);
        }
        BatchOp::SetPriceFeed {
            asset,
            answer,
            decimals,
            offline,
            ..
        } => {
            // The feed is deployed outside the call's checkpoint, so gate it first
            deployment
                .proxy
                .state()
                .require_manager(&caller, MANAGER_ONLY_PRICE_FEED)?;
            let asset = deployment.asset(asset)?;
            let description = format!("{} / USD", deployment.asset_label(&asset).to_uppercase());
            let feed: Arc<dyn PriceFeed> = if *offline {
                Arc::new(OfflinePriceFeed::new(description))
            } else {
                Arc::new(StaticPriceFeed::new(description, i128::from(*answer), *decimals))
            };
            let feed = deployment.host.deploy_price_feed(feed);
            (CallContext::new(caller), Call::SetPriceFeed { asset, feed })
        }
        BatchOp::Upgrade { to, .. } => {
            let implementation = deployment.implementation(*to);
            deployment
                .proxy
                .upgrade(&deployment.host, caller, implementation)?;
            return Ok(None);
        }
        BatchOp::Balance { asset, .. } => (
            CallContext::new(caller),
            Call::AccountBalances {
                account: caller,
                asset: deployment.asset(asset)?,
            },
        ),
        BatchOp::AllBalances { .. } => (CallContext::new(caller), Call::GetAllTokenBalances),
        BatchOp::UsdValue { .. } => (CallContext::new(caller), Call::GetUsdValue),
        BatchOp::Manager { .. } => (CallContext::new(caller), Call::Manager),
    };

    let output = deployment.proxy.call(&mut deployment.host, tx, call)?;
    Ok(match output {
        Output::Unit => None,
        other => Some(other),
    })
}

/// Balance of `label` in `asset` as recorded by the wallet
pub fn ledger_balance(deployment: &Deployment, label: &str, asset: &str) -> Result<Amount> {
    let account = deployment.account(label)?;
    let asset: Asset = deployment.asset(asset)?;
    Ok(deployment.proxy.state().ledger.balance(&account, &asset))
}
