//! Capability interface of the extension-injected wallet bridge
//!
//! The bridge is fire-and-forget: [`Bridge::send_request`] returns at once and
//! the bridge later answers by invoking either the request's `callback` or its
//! `reject` closure. Subscriptions (`onAccountChange`, `onListenTransaction`)
//! keep invoking `callback` for the lifetime of the connection.
//!
//! Implementations:
//! - [`memory::MemoryBridge`]: scripted in-memory bridge for tests
//! - [`injected::InjectedBridge`]: `window.BittapWalletInjected` (feature `wasm`)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

pub mod memory;

#[cfg(feature = "wasm")]
pub mod injected;

/// Operation names understood by the bridge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    #[serde(rename = "connectionWallet")]
    ConnectionWallet,
    #[serde(rename = "switchNetwork")]
    SwitchNetwork,
    #[serde(rename = "onAccountChange")]
    OnAccountChange,
    #[serde(rename = "onListenTransaction")]
    OnListenTransaction,
    #[serde(rename = "getCurrentAssets")]
    GetCurrentAssets,
    #[serde(rename = "getInvoices")]
    GetInvoices,
    #[serde(rename = "createInvoice")]
    CreateInvoice,
    #[serde(rename = "searchAssets")]
    SearchAssets,
    #[serde(rename = "addListenTxId")]
    AddListenTxId,
    #[serde(rename = "transferBtc")]
    TransferBtc,
    #[serde(rename = "sendTaprootAssets")]
    SendTaprootAssets,
    #[serde(rename = "signMessage")]
    SignMessage,
    #[serde(rename = "DisConnection")]
    DisConnection,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::ConnectionWallet => "connectionWallet",
            RequestType::SwitchNetwork => "switchNetwork",
            RequestType::OnAccountChange => "onAccountChange",
            RequestType::OnListenTransaction => "onListenTransaction",
            RequestType::GetCurrentAssets => "getCurrentAssets",
            RequestType::GetInvoices => "getInvoices",
            RequestType::CreateInvoice => "createInvoice",
            RequestType::SearchAssets => "searchAssets",
            RequestType::AddListenTxId => "addListenTxId",
            RequestType::TransferBtc => "transferBtc",
            RequestType::SendTaprootAssets => "sendTaprootAssets",
            RequestType::SignMessage => "signMessage",
            RequestType::DisConnection => "DisConnection",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle returned by the bridge's `init` call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderHandle {
    pub client_id: String,
}

/// Success answer from the bridge
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeResponse {
    #[serde(default)]
    pub data: Value,
}

impl BridgeResponse {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// True when the payload carries `rejectResult: true`
    pub fn is_rejected(&self) -> bool {
        self.data
            .get("rejectResult")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Failure answer from the bridge
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeReject {
    #[serde(default)]
    pub err: Value,
}

pub type ResponseCallback = Box<dyn FnMut(BridgeResponse) + Send>;
pub type RejectCallback = Box<dyn FnMut(BridgeReject) + Send>;

/// Request envelope handed to the bridge
pub struct BridgeRequest {
    pub kind: RequestType,
    pub client_id: String,
    pub data: Value,
    pub callback: ResponseCallback,
    pub reject: Option<RejectCallback>,
}

impl fmt::Debug for BridgeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeRequest")
            .field("kind", &self.kind)
            .field("client_id", &self.client_id)
            .field("data", &self.data)
            .field("reject", &self.reject.is_some())
            .finish()
    }
}

/// Transport to the wallet extension
pub trait Bridge {
    /// Whether the extension is present
    fn installed(&self) -> bool;

    /// Acquire a provider handle for this page
    fn init(&self) -> Result<ProviderHandle>;

    /// Dispatch a request; the answer arrives through the request's callbacks
    fn send_request(&self, request: BridgeRequest);
}

impl<B: Bridge + ?Sized> Bridge for Arc<B> {
    fn installed(&self) -> bool {
        (**self).installed()
    }

    fn init(&self) -> Result<ProviderHandle> {
        (**self).init()
    }

    fn send_request(&self, request: BridgeRequest) {
        (**self).send_request(request)
    }
}

impl<B: Bridge + ?Sized> Bridge for &B {
    fn installed(&self) -> bool {
        (**self).installed()
    }

    fn init(&self) -> Result<ProviderHandle> {
        (**self).init()
    }

    fn send_request(&self, request: BridgeRequest) {
        (**self).send_request(request)
    }
}
