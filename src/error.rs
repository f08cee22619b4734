//! Error types for the wallet

use thiserror::Error;

use crate::types::{Address, Amount, Asset};

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the wallet
///
/// Every variant aborts the call that raised it; the proxy restores storage,
/// custody and token balances to their state before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Access control
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Upgrade / registry targets
    #[error("Invalid target {target}: {reason}")]
    InvalidTarget { target: Address, reason: String },

    #[error("Unsupported call: {0}")]
    UnsupportedCall(String),

    // Ledger errors
    #[error("Insufficient balance: {available} {asset} available, {required} required")]
    InsufficientBalance {
        asset: Asset,
        available: Amount,
        required: Amount,
    },

    #[error("Balance overflow crediting {account} in {asset}")]
    BalanceOverflow { account: Address, asset: Asset },

    // Asset movement
    #[error("Attached value mismatch: expected {expected}, attached {attached}")]
    ValueMismatch { expected: Amount, attached: Amount },

    #[error("ERC20: insufficient allowance ({allowance} approved, {required} required)")]
    InsufficientAllowance { allowance: Amount, required: Amount },

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    // Valuation
    #[error("No price feed configured for {0}")]
    NoPriceFeed(Asset),

    #[error("Oracle failure: {0}")]
    OracleFailure(String),

    // Configuration / IO (outer surfaces)
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Stable machine-readable code for the failure cause
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthorized(_) => "UNAUTHORIZED",
            Error::InvalidTarget { .. } => "INVALID_TARGET",
            Error::UnsupportedCall(_) => "UNSUPPORTED_CALL",
            Error::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Error::BalanceOverflow { .. } => "BALANCE_OVERFLOW",
            Error::ValueMismatch { .. } => "VALUE_MISMATCH",
            Error::InsufficientAllowance { .. } => "INSUFFICIENT_ALLOWANCE",
            Error::TransferFailed(_) => "TRANSFER_FAILED",
            Error::NoPriceFeed(_) => "NO_PRICE_FEED",
            Error::OracleFailure(_) => "ORACLE_FAILURE",
            Error::Config(_) => "CONFIG",
            Error::Serialization(_) => "SERIALIZATION",
            Error::Io(_) => "IO",
        }
    }

    /// Check if this error is an access-control rejection
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, Error::Unauthorized(_))
    }

    /// Check if this error came from an external collaborator (token or oracle)
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Error::InsufficientAllowance { .. } | Error::TransferFailed(_) | Error::OracleFailure(_)
        )
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
