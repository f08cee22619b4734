//! Price oracle gateway
//!
//! Reads the feed configured for an asset and converts a raw amount into a
//! USD value: `amount * answer / 10^decimals`. No caching and no retry; a
//! feed failure fails the valuation.

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::host::Host;
use crate::types::{Address, Amount, Asset};

/// Price of one base unit of an asset, scaled by `10^decimals`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub asset: Asset,
    pub price: u128,
    pub decimals: u8,
    pub round_id: u64,
}

impl Quote {
    /// USD value of `amount` base units at this quote
    pub fn value_of(&self, amount: Amount) -> Result<Amount> {
        let scale = 10u128
            .checked_pow(u32::from(self.decimals))
            .ok_or_else(|| {
                Error::OracleFailure(format!(
                    "{}: feed decimals {} out of range",
                    self.asset, self.decimals
                ))
            })?;

        let gross = amount.checked_mul(self.price).ok_or_else(|| {
            Error::OracleFailure(format!(
                "{}: valuation of {} overflows",
                self.asset, amount
            ))
        })?;

        Ok(gross / scale)
    }
}

pub struct OracleGateway<'a> {
    host: &'a Host,
}

impl<'a> OracleGateway<'a> {
    pub fn new(host: &'a Host) -> Self {
        Self { host }
    }

    /// Current quote from the feed deployed at `feed`
    pub fn quote(&self, asset: &Asset, feed: &Address) -> Result<Quote> {
        let oracle = self.host.price_feed(feed).ok_or_else(|| {
            Error::OracleFailure(format!("{}: no price feed deployed at {}", asset, feed))
        })?;

        let round = oracle.latest_round_data()?;
        let decimals = oracle.decimals()?;

        if round.answer <= 0 {
            return Err(Error::OracleFailure(format!(
                "{}: non-positive answer {} in round {}",
                asset, round.answer, round.round_id
            )));
        }

        debug!(
            "Quote for {} from {}: {} (decimals {}, round {})",
            asset,
            oracle.description(),
            round.answer,
            decimals,
            round.round_id
        );

        Ok(Quote {
            asset: *asset,
            price: round.answer.unsigned_abs(),
            decimals,
            round_id: round.round_id,
        })
    }

    /// USD value of `amount` of `asset` using the feed at `feed`
    pub fn usd_value(&self, asset: &Asset, feed: &Address, amount: Amount) -> Result<Amount> {
        self.quote(asset, feed)?.value_of(amount)
    }
}
