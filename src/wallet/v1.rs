//! First implementation: deposit, withdraw, remit, valuation

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::oracle::OracleGateway;
use crate::types::{Address, Amount, Asset};

use super::events::WalletEvent;
use super::logic::{Call, ExecutionContext, Output, WalletLogic};
use super::state::MANAGER_ONLY_PRICE_FEED;

#[derive(Debug, Clone, Copy, Default)]
pub struct WalletV1;

impl WalletV1 {
    /// Pull `amount` of `asset` from the caller into custody and credit it
    pub fn deposit(&self, ctx: &mut ExecutionContext<'_>, asset: Asset, amount: Amount) -> Result<()> {
        let caller = ctx.caller();
        ctx.state.require_not_manager(&caller)?;

        match asset {
            Asset::Native => {
                // The proxy already moved the attached value into custody
                if ctx.tx.value != amount {
                    return Err(Error::ValueMismatch {
                        expected: amount,
                        attached: ctx.tx.value,
                    });
                }
            }
            Asset::Token(token) => {
                ctx.require_no_value()?;
                let this = ctx.this;
                ctx.host
                    .token_mut(&token)?
                    .transfer_from(&this, &caller, &this, amount)?;
            }
        }

        let balance = ctx.state.ledger.credit(&caller, &asset, amount)?;
        ctx.emit(WalletEvent::Deposited {
            account: caller,
            asset,
            amount,
        });

        info!("Deposit: {} credited {} {} (balance {})", caller, amount, asset, balance);
        Ok(())
    }

    /// Debit the caller, then release the asset out of custody
    pub fn withdraw(&self, ctx: &mut ExecutionContext<'_>, asset: Asset, amount: Amount) -> Result<()> {
        let caller = ctx.caller();
        ctx.state.require_not_manager(&caller)?;
        ctx.require_no_value()?;

        // State change strictly precedes the external transfer
        let balance = ctx.state.ledger.debit(&caller, &asset, amount)?;

        let this = ctx.this;
        match asset {
            Asset::Native => ctx.host.transfer_native(&this, &caller, amount)?,
            Asset::Token(token) => ctx.host.token_mut(&token)?.transfer(&this, &caller, amount)?,
        }

        ctx.emit(WalletEvent::Withdrawn {
            account: caller,
            asset,
            amount,
        });

        info!("Withdraw: {} released {} {} (balance {})", caller, amount, asset, balance);
        Ok(())
    }

    /// Move ledger balance between accounts; no asset leaves custody
    pub fn remit(
        &self,
        ctx: &mut ExecutionContext<'_>,
        target: Address,
        asset: Asset,
        amount: Amount,
    ) -> Result<()> {
        let caller = ctx.caller();
        ctx.state.require_not_manager(&caller)?;
        // Attached value would land in custody without a matching credit
        ctx.require_no_value()?;

        ctx.state.ledger.transfer(&caller, &target, &asset, amount)?;
        ctx.emit(WalletEvent::Remitted {
            from: caller,
            to: target,
            asset,
            amount,
        });

        info!("Remit: {} -> {} {} {}", caller, target, amount, asset);
        Ok(())
    }

    pub fn account_balances(&self, ctx: &ExecutionContext<'_>, account: &Address, asset: &Asset) -> Amount {
        ctx.state.ledger.balance(account, asset)
    }

    pub fn set_price_feed(&self, ctx: &mut ExecutionContext<'_>, asset: Asset, feed: Address) -> Result<()> {
        let caller = ctx.caller();
        ctx.state.require_manager(&caller, MANAGER_ONLY_PRICE_FEED)?;
        ctx.require_no_value()?;

        if ctx.host.price_feed(&feed).is_none() {
            return Err(Error::InvalidTarget {
                target: feed,
                reason: "Destination address is not a price feed".into(),
            });
        }

        if let Some(previous) = ctx.state.price_feeds.insert(asset, feed) {
            debug!("Replacing price feed {} for {}", previous, asset);
        }
        ctx.emit(WalletEvent::PriceFeedSet { asset, feed });

        info!("Price feed for {} set to {}", asset, feed);
        Ok(())
    }

    /// Total USD value of everything the caller holds
    ///
    /// Each term is `balance * answer / 10^feed_decimals`, with the balance
    /// in the asset's base units and the token's own decimals not applied.
    /// The total is therefore in whole USD only when every asset's feed is
    /// scaled to that asset's base unit.
    ///
    /// Zero balances are skipped without consulting an oracle; any non-zero
    /// balance without a configured feed fails the whole valuation.
    pub fn usd_value(&self, ctx: &ExecutionContext<'_>) -> Result<Amount> {
        let caller = ctx.caller();
        let gateway = OracleGateway::new(&*ctx.host);

        let mut total: Amount = 0;
        for (asset, balance) in ctx.state.ledger.balances_of(&caller) {
            if balance == 0 {
                continue;
            }

            let feed = ctx
                .state
                .price_feed(&asset)
                .ok_or(Error::NoPriceFeed(asset))?;
            let value = gateway.usd_value(&asset, &feed, balance)?;

            total = total.checked_add(value).ok_or_else(|| {
                Error::OracleFailure(format!("USD total for {} overflows", caller))
            })?;
        }

        debug!("USD value of {}: {}", caller, total);
        Ok(total)
    }
}

impl WalletV1 {
    /// Dispatch `call`, reporting unsupported calls against `version`
    ///
    /// Later versions embed v1 and route everything they do not override
    /// through here under their own version name.
    pub fn execute_as(
        &self,
        ctx: &mut ExecutionContext<'_>,
        call: Call,
        version: &'static str,
    ) -> Result<Output> {
        if call.is_view() {
            ctx.require_no_value()?;
        }

        match call {
            Call::Deposit { asset, amount } => self.deposit(ctx, asset, amount).map(|_| Output::Unit),
            Call::Withdraw { asset, amount } => self.withdraw(ctx, asset, amount).map(|_| Output::Unit),
            Call::Remit {
                target,
                asset,
                amount,
            } => self.remit(ctx, target, asset, amount).map(|_| Output::Unit),
            Call::AccountBalances { account, asset } => {
                Ok(Output::Amount(self.account_balances(ctx, &account, &asset)))
            }
            Call::SetPriceFeed { asset, feed } => {
                self.set_price_feed(ctx, asset, feed).map(|_| Output::Unit)
            }
            Call::GetUsdValue => self.usd_value(ctx).map(Output::Amount),
            Call::Manager => Ok(Output::Address(ctx.state.manager())),
            other => Err(Error::UnsupportedCall(format!(
                "{} is not implemented by {}",
                other.name(),
                version
            ))),
        }
    }
}

impl WalletLogic for WalletV1 {
    fn version(&self) -> &'static str {
        "v1"
    }

    fn execute(&self, ctx: &mut ExecutionContext<'_>, call: Call) -> Result<Output> {
        self.execute_as(ctx, call, self.version())
    }
}
