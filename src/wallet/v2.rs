//! Second implementation: everything in v1 plus balance enumeration

use tracing::debug;

use crate::error::Result;

use super::logic::{Call, ExecutionContext, Output, TokenBalance, WalletLogic};
use super::v1::WalletV1;

#[derive(Debug, Clone, Copy, Default)]
pub struct WalletV2 {
    base: WalletV1,
}

impl WalletV2 {
    pub fn new() -> Self {
        Self::default()
    }

    /// The caller's balances in first-touched order, zero balances included
    pub fn all_token_balances(&self, ctx: &ExecutionContext<'_>) -> Vec<TokenBalance> {
        let caller = ctx.caller();
        let balances: Vec<TokenBalance> = ctx
            .state
            .ledger
            .balances_of(&caller)
            .into_iter()
            .map(|(token, balance)| TokenBalance { token, balance })
            .collect();

        debug!("{} holds {} assets", caller, balances.len());
        balances
    }
}

impl WalletLogic for WalletV2 {
    fn version(&self) -> &'static str {
        "v2"
    }

    fn execute(&self, ctx: &mut ExecutionContext<'_>, call: Call) -> Result<Output> {
        match call {
            Call::GetAllTokenBalances => {
                ctx.require_no_value()?;
                Ok(Output::TokenBalances(self.all_token_balances(ctx)))
            }
            other => self.base.execute_as(ctx, other, self.version()),
        }
    }
}
