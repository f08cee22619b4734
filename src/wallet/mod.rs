//! Wallet business logic
//!
//! # Architecture
//!
//! ```text
//! caller → Proxy ──(Call)──→ WalletLogic (v1 | v2)
//!            │                    │
//!            └── WalletState ←────┘  (lent via ExecutionContext)
//! ```
//!
//! Every implementation version reads and writes the same `WalletState`;
//! swapping the implementation never touches stored balances.

pub mod events;
pub mod logic;
pub mod state;
pub mod v1;
pub mod v2;

pub use events::{LogEntry, WalletEvent};
pub use logic::{Call, ExecutionContext, Output, TokenBalance, WalletLogic};
pub use state::WalletState;
pub use v1::WalletV1;
pub use v2::WalletV2;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Implementation versions this crate ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplementationVersion {
    V1,
    V2,
}

impl ImplementationVersion {
    pub const ALL: [ImplementationVersion; 2] = [ImplementationVersion::V1, ImplementationVersion::V2];

    pub fn build(&self) -> Arc<dyn WalletLogic> {
        match self {
            ImplementationVersion::V1 => Arc::new(WalletV1),
            ImplementationVersion::V2 => Arc::new(WalletV2::new()),
        }
    }
}

impl std::fmt::Display for ImplementationVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImplementationVersion::V1 => write!(f, "v1"),
            ImplementationVersion::V2 => write!(f, "v2"),
        }
    }
}
