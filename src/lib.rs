//! Bittap Wallet SDK
//!
//! Client library for pages that talk to the Bittap browser extension, a
//! Bitcoin and Taproot-asset wallet. The extension injects a bridge object;
//! this crate validates inputs, shapes request envelopes, hands them to the
//! bridge and turns the bridge's callback answers into futures and typed
//! errors.
//!
//! ## Architecture
//!
//! - `network`: network identifiers and their chain parameters
//! - `bridge`: the bridge capability trait, plus in-memory and browser implementations
//! - `client`: [`WalletSdk`], connection state and every wallet operation
//! - `types`: request options and response rows
//! - `error`: the [`WalletError`] taxonomy
//! - `utils`: txid, asset id, address and URL format checks
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bittap_wallet_sdk::{ConnectionOptions, MemoryBridge, NetworkType, WalletSdk};
//!
//! async fn example() -> bittap_wallet_sdk::Result<()> {
//!     let sdk = WalletSdk::new(
//!         MemoryBridge::new(),
//!         ConnectionOptions { network: NetworkType::Regtest, auto_connection: false },
//!     );
//!     let state = sdk.connect().await?;
//!     println!("connected as {}", state.account.btc_address);
//!     let signature = sdk.sign_message("hello").await?;
//!     println!("{}", signature);
//!     sdk.disconnect()?;
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod client;
pub mod error;
pub mod network;
pub mod types;
pub mod utils;

pub use bridge::memory::MemoryBridge;
pub use bridge::{Bridge, BridgeReject, BridgeRequest, BridgeResponse, ProviderHandle, RequestType};
pub use client::{AccountChangeHandler, TransactionStatusHandler, WalletSdk};
pub use error::{Result, WalletError};
pub use network::{get_networks, NetworkParams, NetworkType};
pub use types::*;
pub use utils::Utils;

#[cfg(feature = "wasm")]
pub use bridge::injected::InjectedBridge;
