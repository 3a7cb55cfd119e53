//! Error types for the wallet SDK
//!
//! Every failure surfaced by [`crate::WalletSdk`] is a [`WalletError`]. Local
//! precondition failures use [`WalletError::Generic`]; answers from the bridge
//! map to [`WalletError::Reject`], [`WalletError::SignatureFailed`] or
//! [`WalletError::Bridge`].

use serde_json::Value;

/// Wallet SDK errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WalletError {
    /// Precondition or argument failure
    #[error("{0}")]
    Generic(String),

    #[error("Asset with ID {0} does not exist")]
    AssetNotFound(String),

    #[error("Invalid BTC address: {0}")]
    InvalidBtcAddress(String),

    #[error("Insufficient assets: required {required}, available {available} for asset {asset_id}")]
    InsufficientAssets {
        asset_id: String,
        required: u64,
        available: u64,
    },

    #[error("{}", unavailable_message(.0))]
    NetworkUnavailable(String),

    #[error("Signature operation failed: {0}")]
    SignatureFailed(String),

    /// The user or the bridge declined the named operation
    #[error("Reject request: {0}")]
    Reject(String),

    #[error("An unknown error occurred: {0}")]
    Unknown(String),

    #[error("Communication error: {0}")]
    Communication(String),

    /// Raw `err` payload handed to the bridge's reject callback
    #[error("Bridge error: {0}")]
    Bridge(Value),
}

impl WalletError {
    pub fn generic(message: impl Into<String>) -> Self {
        WalletError::Generic(message.into())
    }

    /// Class name exposed to JavaScript callers
    pub fn name(&self) -> &'static str {
        match self {
            WalletError::Generic(_) | WalletError::Bridge(_) => "BitTapError",
            WalletError::AssetNotFound(_) => "AssetNotFoundError",
            WalletError::InvalidBtcAddress(_) => "InvalidBTCAddressError",
            WalletError::InsufficientAssets { .. } => "InsufficientAssetsError",
            WalletError::NetworkUnavailable(_) => "NetworkUnavailableError",
            WalletError::SignatureFailed(_) => "SignatureFailedError",
            WalletError::Reject(_) => "RejectError",
            WalletError::Unknown(_) => "UnknownError",
            WalletError::Communication(_) => "CommunicationError",
        }
    }

    /// Operation tag carried by a reject-marker failure
    pub fn rejected_operation(&self) -> Option<&str> {
        match self {
            WalletError::Reject(op) | WalletError::SignatureFailed(op) => Some(op),
            _ => None,
        }
    }
}

fn unavailable_message(message: &str) -> &str {
    if message.is_empty() {
        "Network is currently unavailable"
    } else {
        message
    }
}

pub type Result<T> = std::result::Result<T, WalletError>;
