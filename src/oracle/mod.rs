//! Price oracle module

pub mod feed;
pub mod gateway;

pub use feed::{OfflinePriceFeed, PriceFeed, RoundData, StaticPriceFeed};
pub use gateway::{OracleGateway, Quote};
