//! Request options and response rows exchanged with the wallet bridge
//!
//! Field names follow the bridge's JSON (snake_case for asset and invoice
//! rows, camelCase for account data).

use serde::{Deserialize, Serialize};

use crate::network::{NetworkParams, NetworkType};

/// Client construction options
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionOptions {
    /// Network requested at connect time
    pub network: NetworkType,
    /// Ask the extension to connect without prompting
    pub auto_connection: bool,
}

/// Account exposed by the wallet
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    #[serde(rename = "btcAddress")]
    pub btc_address: String,
}

impl Account {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.btc_address.is_empty()
    }
}

/// Network name together with its parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    pub name: NetworkType,
    pub network: NetworkParams,
}

impl From<NetworkType> for NetworkDescriptor {
    fn from(name: NetworkType) -> Self {
        Self {
            name,
            network: name.params(),
        }
    }
}

/// Snapshot of the client's network and account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionResponse {
    pub network: NetworkDescriptor,
    pub account: Account,
}

/// Transaction status reported by the wallet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxsStatus {
    #[default]
    Pending,
    Confirmed,
    Failed,
}

/// Transaction information returned by transfers and status events
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseTxInfo {
    pub status: TxsStatus,
    pub txid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_time: Option<u64>,
}

/// Asset kind
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum AssetType {
    #[default]
    Normal,
    Collectible,
}

impl From<u8> for AssetType {
    fn from(value: u8) -> Self {
        match value {
            1 => AssetType::Collectible,
            _ => AssetType::Normal,
        }
    }
}

impl From<AssetType> for u8 {
    fn from(value: AssetType) -> Self {
        match value {
            AssetType::Normal => 0,
            AssetType::Collectible => 1,
        }
    }
}

/// Taproot asset version
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum AssetVersion {
    V0,
    V1,
}

impl From<u8> for AssetVersion {
    fn from(value: u8) -> Self {
        match value {
            1 => AssetVersion::V1,
            _ => AssetVersion::V0,
        }
    }
}

impl From<AssetVersion> for u8 {
    fn from(value: AssetVersion) -> Self {
        match value {
            AssetVersion::V0 => 0,
            AssetVersion::V1 => 1,
        }
    }
}

/// One balance row of the connected account
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentAccountAssetsRow {
    pub asset_name: String,
    pub amount: f64,
    /// Decimal places, 8 or 0
    pub decimal: u8,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub asset_id: String,
}

pub type CurrentAccountAssets = Vec<CurrentAccountAssetsRow>;

/// Paging options; values are floored and clamped before dispatch
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestPageOptions {
    #[serde(default)]
    pub page_num: Option<f64>,
    #[serde(default)]
    pub page_size: Option<f64>,
}

/// Asset search options
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestAssetOptions {
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub asset_name: Option<String>,
    #[serde(flatten)]
    pub page: RequestPageOptions,
}

/// Asset search result; the bridge may answer with one row or a list
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseAssetRow {
    pub asset_name: String,
    pub asset_id: String,
    pub total_supply: f64,
    pub asset_type: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::Many(rows) => rows,
            OneOrMany::One(row) => vec![row],
        }
    }
}

/// Invoice creation options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestInvoiceOptions {
    pub asset_id: String,
    pub amount: f64,
}

/// Invoice returned by the wallet
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseInvoiceRow {
    pub asset_id: String,
    pub amount: f64,
    pub encoded: String,
    pub asset_type: AssetType,
    #[serde(default)]
    pub group_key: Option<String>,
    pub script_key: String,
    pub internal_key: String,
    #[serde(default)]
    pub tapscript_sibling: Option<String>,
    pub taproot_output_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_courier_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_version: Option<AssetVersion>,
}

/// BTC transfer options
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferOptions {
    #[serde(default)]
    pub recv_addr: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub min_conf: Option<f64>,
    #[serde(default)]
    pub fee_rate: Option<f64>,
}

/// Taproot asset send options
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SendAssetsOptions {
    #[serde(default)]
    pub receive_addr: String,
    #[serde(default)]
    pub fee_rate: Option<f64>,
}
