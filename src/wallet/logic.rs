//! Call surface shared by every implementation version
//!
//! The proxy forwards a `Call` unmodified to whatever `WalletLogic` its
//! implementation pointer resolves to, together with an `ExecutionContext`
//! that lends out the proxy's storage and the host.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::host::Host;
use crate::types::{Address, Amount, Asset, CallContext};

use super::events::WalletEvent;
use super::state::WalletState;

/// Invocation forwarded by the proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Deposit { asset: Asset, amount: Amount },
    Withdraw { asset: Asset, amount: Amount },
    Remit { target: Address, asset: Asset, amount: Amount },
    AccountBalances { account: Address, asset: Asset },
    SetPriceFeed { asset: Asset, feed: Address },
    GetUsdValue,
    GetAllTokenBalances,
    Manager,
}

impl Call {
    /// Selector name, as exposed to external callers
    pub fn name(&self) -> &'static str {
        match self {
            Call::Deposit { .. } => "deposit",
            Call::Withdraw { .. } => "withdraw",
            Call::Remit { .. } => "remit",
            Call::AccountBalances { .. } => "accountBalances",
            Call::SetPriceFeed { .. } => "setPriceFeed",
            Call::GetUsdValue => "getUSDValue",
            Call::GetAllTokenBalances => "getAllTokenBalances",
            Call::Manager => "manager",
        }
    }

    /// Calls that never write storage or move assets
    pub fn is_view(&self) -> bool {
        matches!(
            self,
            Call::AccountBalances { .. }
                | Call::GetUsdValue
                | Call::GetAllTokenBalances
                | Call::Manager
        )
    }
}

/// One entry of an account's balance listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub token: Asset,
    pub balance: Amount,
}

/// Value returned by a forwarded call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Unit,
    Amount(Amount),
    Address(Address),
    TokenBalances(Vec<TokenBalance>),
}

impl Output {
    pub fn into_amount(self) -> Result<Amount> {
        match self {
            Output::Amount(amount) => Ok(amount),
            other => Err(Error::UnsupportedCall(format!(
                "expected an amount, got {:?}",
                other
            ))),
        }
    }

    pub fn into_address(self) -> Result<Address> {
        match self {
            Output::Address(address) => Ok(address),
            other => Err(Error::UnsupportedCall(format!(
                "expected an address, got {:?}",
                other
            ))),
        }
    }

    pub fn into_token_balances(self) -> Result<Vec<TokenBalance>> {
        match self {
            Output::TokenBalances(balances) => Ok(balances),
            other => Err(Error::UnsupportedCall(format!(
                "expected token balances, got {:?}",
                other
            ))),
        }
    }
}

/// Everything a call may touch: the proxy's storage, the host, and the
/// events it emits
pub struct ExecutionContext<'a> {
    pub tx: CallContext,
    /// Address of the proxy whose storage is being executed against
    pub this: Address,
    pub state: &'a mut WalletState,
    pub host: &'a mut Host,
    events: Vec<WalletEvent>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        tx: CallContext,
        this: Address,
        state: &'a mut WalletState,
        host: &'a mut Host,
    ) -> Self {
        Self {
            tx,
            this,
            state,
            host,
            events: Vec::new(),
        }
    }

    pub fn caller(&self) -> Address {
        self.tx.caller
    }

    /// Reject native value attached to a call that does not accept it
    pub fn require_no_value(&self) -> Result<()> {
        if self.tx.value == 0 {
            Ok(())
        } else {
            Err(Error::ValueMismatch {
                expected: 0,
                attached: self.tx.value,
            })
        }
    }

    pub fn emit(&mut self, event: WalletEvent) {
        self.events.push(event);
    }

    pub fn into_events(self) -> Vec<WalletEvent> {
        self.events
    }
}

/// Replaceable business logic behind a proxy
pub trait WalletLogic: fmt::Debug + Send + Sync {
    fn version(&self) -> &'static str;

    fn execute(&self, ctx: &mut ExecutionContext<'_>, call: Call) -> Result<Output>;
}
