//! Upgradeable wallet proxy
//!
//! The proxy owns the durable storage (`WalletState`) and the implementation
//! pointer. Every call except `upgrade` is forwarded unmodified to the
//! implementation and executes against the proxy's storage.
//!
//! Calls are all-or-nothing: the storage and the host are checkpointed
//! before a mutating call and restored if it fails, so no partial ledger
//! update, custody movement or event survives an error.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::host::{Contract, Host};
use crate::types::{Address, Amount, Asset, CallContext};
use crate::wallet::state::MANAGER_ONLY_UPGRADE;
use crate::wallet::{
    Call, ExecutionContext, LogEntry, Output, TokenBalance, WalletEvent, WalletLogic, WalletState,
};

#[derive(Debug, Clone)]
pub struct Proxy {
    /// Address holding custody of deposited assets
    address: Address,

    /// Code every forwarded call executes
    implementation: Address,

    state: WalletState,

    events: Vec<LogEntry>,
}

impl Proxy {
    /// Deploy a proxy; the deployer becomes the manager
    pub fn deploy(
        host: &mut Host,
        deployer: Address,
        implementation: Address,
        router: Address,
    ) -> Result<Self> {
        let logic = host.wallet_logic(&implementation)?;
        let address = host.deploy(Contract::Proxy);

        info!(
            "Wallet proxy deployed at {} (implementation {} at {}, manager {})",
            address,
            logic.version(),
            implementation,
            deployer
        );

        Ok(Self {
            address,
            implementation,
            state: WalletState::new(deployer, router),
            events: Vec::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn implementation(&self) -> Address {
        self.implementation
    }

    pub fn manager(&self) -> Address {
        self.state.manager()
    }

    pub fn router(&self) -> Address {
        self.state.router()
    }

    /// Read-only view of the storage
    pub fn state(&self) -> &WalletState {
        &self.state
    }

    pub fn events(&self) -> &[LogEntry] {
        &self.events
    }

    /// Point the proxy at new logic; storage is left untouched
    pub fn upgrade(&mut self, host: &Host, caller: Address, new_implementation: Address) -> Result<()> {
        self.state.require_manager(&caller, MANAGER_ONLY_UPGRADE)?;
        let logic = host.wallet_logic(&new_implementation)?;

        let previous = std::mem::replace(&mut self.implementation, new_implementation);
        self.events.push(LogEntry::now(WalletEvent::Upgraded {
            previous,
            implementation: new_implementation,
        }));

        info!(
            "Implementation upgraded: {} -> {} ({})",
            previous,
            new_implementation,
            logic.version()
        );
        Ok(())
    }

    /// Forward a call to the current implementation
    pub fn call(&mut self, host: &mut Host, tx: CallContext, call: Call) -> Result<Output> {
        let logic = host.wallet_logic(&self.implementation)?;
        let name = call.name();

        // Value attached to a view would land in custody with no credit
        if call.is_view() && tx.value > 0 {
            warn!("{} by {} rejected: {} native attached to a view", name, tx.caller, tx.value);
            return Err(Error::ValueMismatch {
                expected: 0,
                attached: tx.value,
            });
        }

        // Views cannot change anything
        let checkpoint = if call.is_view() {
            None
        } else {
            Some((self.state.clone(), host.clone()))
        };

        match self.dispatch(host, logic.as_ref(), tx, call) {
            Ok((output, events)) => {
                self.events.extend(events.into_iter().map(LogEntry::now));
                debug!("{} by {} succeeded on {}", name, tx.caller, logic.version());
                Ok(output)
            }
            Err(e) => {
                if let Some((state, snapshot)) = checkpoint {
                    self.state = state;
                    *host = snapshot;
                }
                warn!("{} by {} reverted: {}", name, tx.caller, e);
                Err(e)
            }
        }
    }

    fn dispatch(
        &mut self,
        host: &mut Host,
        logic: &dyn WalletLogic,
        tx: CallContext,
        call: Call,
    ) -> Result<(Output, Vec<WalletEvent>)> {
        // Attached value moves into custody before the logic runs
        if tx.value > 0 {
            host.transfer_native(&tx.caller, &self.address, tx.value)?;
        }

        let mut ctx = ExecutionContext::new(tx, self.address, &mut self.state, host);
        let output = logic.execute(&mut ctx, call)?;
        Ok((output, ctx.into_events()))
    }

    pub fn deposit(
        &mut self,
        host: &mut Host,
        caller: Address,
        asset: Asset,
        amount: Amount,
        value: Amount,
    ) -> Result<()> {
        let tx = CallContext::new(caller).with_value(value);
        self.call(host, tx, Call::Deposit { asset, amount }).map(|_| ())
    }

    pub fn withdraw(&mut self, host: &mut Host, caller: Address, asset: Asset, amount: Amount) -> Result<()> {
        self.call(host, CallContext::new(caller), Call::Withdraw { asset, amount })
            .map(|_| ())
    }

    pub fn remit(
        &mut self,
        host: &mut Host,
        caller: Address,
        target: Address,
        asset: Asset,
        amount: Amount,
    ) -> Result<()> {
        self.call(
            host,
            CallContext::new(caller),
            Call::Remit {
                target,
                asset,
                amount,
            },
        )
        .map(|_| ())
    }

    pub fn account_balances(&mut self, host: &mut Host, account: Address, asset: Asset) -> Result<Amount> {
        self.call(host, CallContext::new(account), Call::AccountBalances { account, asset })?
            .into_amount()
    }

    pub fn set_price_feed(&mut self, host: &mut Host, caller: Address, asset: Asset, feed: Address) -> Result<()> {
        self.call(host, CallContext::new(caller), Call::SetPriceFeed { asset, feed })
            .map(|_| ())
    }

    pub fn usd_value(&mut self, host: &mut Host, caller: Address) -> Result<Amount> {
        self.call(host, CallContext::new(caller), Call::GetUsdValue)?
            .into_amount()
    }

    pub fn all_token_balances(&mut self, host: &mut Host, caller: Address) -> Result<Vec<TokenBalance>> {
        self.call(host, CallContext::new(caller), Call::GetAllTokenBalances)?
            .into_token_balances()
    }

    /// Assets actually held by the proxy, per the host
    pub fn custody(&self, host: &Host, asset: &Asset) -> Amount {
        match asset {
            Asset::Native => host.native_balance(&self.address),
            Asset::Token(token) => host
                .token(token)
                .map(|t| t.balance_of(&self.address))
                .unwrap_or(0),
        }
    }

    /// Every ledger total is backed by custody
    pub fn is_solvent(&self, host: &Host) -> bool {
        self.state.ledger.known_assets().iter().all(|asset| {
            self.state.ledger.total_liabilities(asset) <= self.custody(host, asset)
        })
    }
}
