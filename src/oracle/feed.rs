//! Price feed contracts
//!
//! A feed reports its latest round: an integer answer scaled by
//! `decimals()`. Feeds are shared behind `Arc`, so updates go through
//! interior mutability and every reader sees the latest round.

use std::fmt;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

/// Latest round reported by a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundData {
    pub round_id: u64,
    pub answer: i128,
    pub updated_at: DateTime<Utc>,
}

/// Read interface of an external price oracle
pub trait PriceFeed: fmt::Debug + Send + Sync {
    fn description(&self) -> String;

    fn decimals(&self) -> Result<u8>;

    fn latest_round_data(&self) -> Result<RoundData>;
}

/// Feed whose answer is pushed by its operator
#[derive(Debug)]
pub struct StaticPriceFeed {
    description: String,
    decimals: u8,
    round: RwLock<RoundData>,
}

impl StaticPriceFeed {
    pub fn new(description: impl Into<String>, answer: i128, decimals: u8) -> Self {
        Self {
            description: description.into(),
            decimals,
            round: RwLock::new(RoundData {
                round_id: 1,
                answer,
                updated_at: Utc::now(),
            }),
        }
    }

    /// Publish a new answer as the next round
    pub fn update(&self, answer: i128) {
        let mut round = self.round.write().unwrap_or_else(|e| e.into_inner());
        round.round_id += 1;
        round.answer = answer;
        round.updated_at = Utc::now();
    }
}

impl PriceFeed for StaticPriceFeed {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn decimals(&self) -> Result<u8> {
        Ok(self.decimals)
    }

    fn latest_round_data(&self) -> Result<RoundData> {
        let round = self.round.read().unwrap_or_else(|e| e.into_inner());
        Ok(*round)
    }
}

/// Feed that cannot be reached, e.g. a mainnet aggregator referenced from a
/// local environment
#[derive(Debug, Clone)]
pub struct OfflinePriceFeed {
    description: String,
}

impl OfflinePriceFeed {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl PriceFeed for OfflinePriceFeed {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn decimals(&self) -> Result<u8> {
        Err(Error::OracleFailure(format!(
            "{}: feed unreachable",
            self.description
        )))
    }

    fn latest_round_data(&self) -> Result<RoundData> {
        Err(Error::OracleFailure(format!(
            "{}: feed unreachable",
            self.description
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_advances_round() {
        let feed = StaticPriceFeed::new("ETH / USD", 2_000_00000000, 8);
        let first = feed.latest_round_data().unwrap();
        assert_eq!(first.round_id, 1);

        feed.update(2_100_00000000);
        let second = feed.latest_round_data().unwrap();
        assert_eq!(second.round_id, 2);
        assert_eq!(second.answer, 2_100_00000000);
        assert_eq!(feed.decimals().unwrap(), 8);
    }

    #[test]
    fn test_offline_feed_fails() {
        let feed = OfflinePriceFeed::new("ETH / USD");
        assert_eq!(feed.latest_round_data().unwrap_err().code(), "ORACLE_FAILURE");
        assert!(feed.decimals().is_err());
    }
}
