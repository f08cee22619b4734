//! Events emitted by successful wallet calls

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Address, Amount, Asset};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WalletEvent {
    Deposited {
        account: Address,
        asset: Asset,
        amount: Amount,
    },
    Withdrawn {
        account: Address,
        asset: Asset,
        amount: Amount,
    },
    Remitted {
        from: Address,
        to: Address,
        asset: Asset,
        amount: Amount,
    },
    PriceFeedSet {
        asset: Asset,
        feed: Address,
    },
    Upgraded {
        previous: Address,
        implementation: Address,
    },
}

/// Event as recorded in the proxy's log
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: WalletEvent,
}

impl LogEntry {
    pub fn now(event: WalletEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_serializes_flat() {
        let entry = LogEntry::now(WalletEvent::Deposited {
            account: Address::from_label("user"),
            asset: Asset::Native,
            amount: 100,
        });

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "deposited");
        assert_eq!(json["asset"], "native");
        assert_eq!(json["amount"], 100);
        assert!(json["timestamp"].is_string());
    }
}
