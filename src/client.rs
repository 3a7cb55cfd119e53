//! Wallet client
//!
//! [`WalletSdk`] is the single entry point for talking to the wallet bridge.
//! Each public operation validates and normalizes its arguments, builds a
//! request envelope and hands it to the bridge. The bridge answers through
//! one of two callbacks; the first answer settles the operation's future and
//! any later answer is logged and dropped.
//!
//! Connection-scoped operations pass through [`WalletSdk::check_connection`]
//! first. `get_current_assets` and `get_invoices` do not.

use futures::channel::oneshot;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::bridge::{Bridge, BridgeRequest, BridgeResponse, ProviderHandle, RequestType};
use crate::error::{Result, WalletError};
use crate::network::{NetworkParams, NetworkType};
use crate::types::{
    Account, ConnectionOptions, ConnectionResponse, CurrentAccountAssets, NetworkDescriptor,
    OneOrMany, RequestAssetOptions, RequestInvoiceOptions, RequestPageOptions, ResponseAssetRow,
    ResponseInvoiceRow, ResponseTxInfo, SendAssetsOptions, TransferOptions,
};
use crate::utils::{floor_at_least, Utils};

pub const NOT_INSTALLED: &str = "BittapWalletInjected not installed";
pub const NOT_CONNECTED: &str = "Bittap Wallet not connected";
pub const ALREADY_CONNECTED: &str = "Bittap wallet is already connected";

const MIN_PAGE_NUM: u64 = 1;
const MIN_PAGE_SIZE: u64 = 10;
const MIN_CONFIRMATIONS: u64 = 6;
const MIN_FEE_RATE: u64 = 1;

/// Called with the refreshed state on every account-change event
pub type AccountChangeHandler = Arc<dyn Fn(ConnectionResponse) + Send + Sync>;
/// Called with every transaction-status event
pub type TransactionStatusHandler = Arc<dyn Fn(ResponseTxInfo) + Send + Sync>;

struct ClientState {
    network: NetworkType,
    auto_connection: bool,
    account: Account,
    connected: bool,
    provider: Option<ProviderHandle>,
    on_account_change: Option<AccountChangeHandler>,
    on_listen_transaction: Option<TransactionStatusHandler>,
}

impl ClientState {
    fn snapshot(&self) -> ConnectionResponse {
        ConnectionResponse {
            network: NetworkDescriptor::from(self.network),
            account: self.account.clone(),
        }
    }

    fn reset(&mut self) {
        self.account = Account::default();
        self.on_account_change = None;
        self.on_listen_transaction = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How a `rejectResult: true` answer is reported
#[derive(Clone, Copy, Debug)]
enum RejectMarker {
    Reject,
    SignatureFailed,
    Unchecked,
}

impl RejectMarker {
    fn error(&self, kind: RequestType, response: &BridgeResponse) -> Option<WalletError> {
        match self {
            RejectMarker::Unchecked => None,
            _ if !response.is_rejected() => None,
            RejectMarker::Reject => Some(WalletError::Reject(kind.to_string())),
            RejectMarker::SignatureFailed => Some(WalletError::SignatureFailed(kind.to_string())),
        }
    }
}

/// Single-use sender shared by a request's success and reject callbacks
struct Completion<T> {
    kind: RequestType,
    sender: Arc<Mutex<Option<oneshot::Sender<Result<T>>>>>,
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            sender: self.sender.clone(),
        }
    }
}

impl<T> Completion<T> {
    fn new(kind: RequestType) -> (Self, oneshot::Receiver<Result<T>>) {
        let (tx, rx) = oneshot::channel();
        let completion = Self {
            kind,
            sender: Arc::new(Mutex::new(Some(tx))),
        };
        (completion, rx)
    }

    /// Claim the right to settle; `None` once the request was answered
    fn claim(&self) -> Option<oneshot::Sender<Result<T>>> {
        let sender = lock(&self.sender).take();
        if sender.is_none() {
            warn!(
                "Bridge answered {} more than once; ignoring the extra answer",
                self.kind
            );
        }
        sender
    }
}

fn decode<T: DeserializeOwned>(kind: RequestType, data: Value) -> Result<T> {
    serde_json::from_value(data)
        .map_err(|e| WalletError::Communication(format!("malformed {} response: {}", kind, e)))
}

/// Network name from either `"regtest"` or `{ "name": "regtest" }`
fn network_name(value: &Value) -> Option<&str> {
    value
        .as_str()
        .or_else(|| value.get("name").and_then(Value::as_str))
}

/// Bittap wallet client
pub struct WalletSdk<B: Bridge> {
    bridge: B,
    state: Arc<Mutex<ClientState>>,
}

impl<B: Bridge> WalletSdk<B> {
    /// Create a client; the bridge is not contacted until [`WalletSdk::connect`]
    pub fn new(bridge: B, options: ConnectionOptions) -> Self {
        debug!(
            "Creating wallet client for {} (auto connection: {})",
            options.network, options.auto_connection
        );
        Self {
            bridge,
            state: Arc::new(Mutex::new(ClientState {
                network: options.network,
                auto_connection: options.auto_connection,
                account: Account::default(),
                connected: false,
                provider: None,
                on_account_change: None,
                on_listen_transaction: None,
            })),
        }
    }

    /// Whether the wallet extension is present
    pub fn installed(&self) -> bool {
        self.bridge.installed()
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn is_connected(&self) -> bool {
        self.state().connected
    }

    pub fn account(&self) -> Account {
        self.state().account.clone()
    }

    pub fn network(&self) -> NetworkType {
        self.state().network
    }

    pub fn network_params(&self) -> NetworkParams {
        self.state().network.params()
    }

    pub fn auto_connection(&self) -> bool {
        self.state().auto_connection
    }

    /// Current network and account
    pub fn current_state(&self) -> ConnectionResponse {
        self.state().snapshot()
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        lock(&self.state)
    }

    /// Fails unless the extension is installed and a connect has succeeded
    pub fn check_connection(&self) -> Result<()> {
        if !self.bridge.installed() {
            return Err(WalletError::generic(NOT_INSTALLED));
        }
        if !self.state().connected {
            return Err(WalletError::generic(NOT_CONNECTED));
        }
        Ok(())
    }

    fn client_id(&self) -> Result<String> {
        self.state()
            .provider
            .as_ref()
            .map(|p| p.client_id.clone())
            .ok_or_else(|| WalletError::Communication("wallet provider not initialized".into()))
    }

    /// Send a one-shot request whose answer settles the returned receiver
    fn dispatch<T, F>(
        &self,
        kind: RequestType,
        data: Value,
        marker: RejectMarker,
        on_success: F,
    ) -> Result<oneshot::Receiver<Result<T>>>
    where
        T: Send + 'static,
        F: FnOnce(Value) -> Result<T> + Send + 'static,
    {
        let client_id = self.client_id()?;
        let (done, rx) = Completion::new(kind);
        let on_reject = done.clone();
        let mut on_success = Some(on_success);

        let request = BridgeRequest {
            kind,
            client_id,
            data,
            callback: Box::new(move |response: BridgeResponse| {
                let Some(sender) = done.claim() else {
                    return;
                };
                debug!("Bridge answered {}", kind);
                let outcome = match marker.error(kind, &response) {
                    Some(err) => Err(err),
                    None => match on_success.take() {
                        Some(handle) => handle(response.data),
                        None => return,
                    },
                };
                let _ = sender.send(outcome);
            }),
            reject: Some(Box::new(move |answer| {
                if let Some(sender) = on_reject.claim() {
                    debug!("Bridge rejected {}: {}", kind, answer.err);
                    let _ = sender.send(Err(WalletError::Bridge(answer.err)));
                }
            })),
        };

        debug!("Dispatching {} request", kind);
        self.bridge.send_request(request);
        Ok(rx)
    }

    /// Send a request that expects no meaningful answer
    fn notify(&self, kind: RequestType, data: Value) -> Result<()> {
        let client_id = self.client_id()?;
        debug!("Dispatching {} notification", kind);
        self.bridge.send_request(BridgeRequest {
            kind,
            client_id,
            data,
            callback: Box::new(|_| {}),
            reject: None,
        });
        Ok(())
    }

    async fn settle<T>(kind: RequestType, rx: oneshot::Receiver<Result<T>>) -> Result<T> {
        rx.await.map_err(|_| {
            WalletError::Communication(format!("{} request dropped by the bridge", kind))
        })?
    }

    async fn request<T>(&self, kind: RequestType, data: Value, marker: RejectMarker) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let rx = self.dispatch(kind, data, marker, move |payload| decode(kind, payload))?;
        Self::settle(kind, rx).await
    }

    /// Connect to the wallet and adopt the account and network it reports
    pub async fn connect(&self) -> Result<ConnectionResponse> {
        if !self.bridge.installed() {
            return Err(WalletError::generic(NOT_INSTALLED));
        }
        if self.state().connected {
            return Err(WalletError::generic(ALREADY_CONNECTED));
        }

        let provider = self.bridge.init()?;
        debug!("Wallet provider initialized with client id {}", provider.client_id);
        let data = {
            let mut state = self.state();
            state.provider = Some(provider);
            json!({
                "network": state.network,
                "autoConnection": state.auto_connection,
            })
        };

        let kind = RequestType::ConnectionWallet;
        let state = self.state.clone();
        let rx = self.dispatch(kind, data, RejectMarker::Reject, move |payload| {
            let account: Account = decode(kind, payload.get("account").cloned().unwrap_or_default())?;
            let network = payload.get("network").and_then(network_name).map(NetworkType::resolve);

            let mut state = lock(&state);
            state.account = account;
            if let Some(network) = network {
                state.network = network;
            }
            state.connected = true;
            Ok(state.snapshot())
        })?;
        Self::settle(kind, rx).await
    }

    pub fn set_auto_connection(&self, auto_connection: bool) {
        self.state().auto_connection = auto_connection;
    }

    /// Ask the wallet to move to another network. Switching to the current
    /// network is an error, not a no-op.
    pub async fn switch_network(
        &self,
        network: Option<NetworkType>,
        url: Option<&str>,
    ) -> Result<ConnectionResponse> {
        self.check_connection()?;
        let target = network
            .ok_or_else(|| WalletError::NetworkUnavailable("Network not provided".into()))?;
        if target == self.state().network {
            return Err(WalletError::NetworkUnavailable("Network not changed".into()));
        }

        let mut data = Map::new();
        data.insert("network".into(), json!(target));
        if let Some(url) = url {
            data.insert("url".into(), json!(url));
        }

        let kind = RequestType::SwitchNetwork;
        let state = self.state.clone();
        let rx = self.dispatch(kind, Value::Object(data), RejectMarker::Unchecked, move |_| {
            let mut state = lock(&state);
            state.network = target;
            Ok(state.snapshot())
        })?;
        Self::settle(kind, rx).await
    }

    /// Register the account-change handler and subscribe to account changes.
    /// `None` is ignored.
    pub fn set_on_account_change_handler(
        &self,
        handler: Option<AccountChangeHandler>,
    ) -> Result<()> {
        self.check_connection()?;
        let Some(handler) = handler else {
            return Ok(());
        };
        self.state().on_account_change = Some(handler);

        let client_id = self.client_id()?;
        let state = self.state.clone();
        self.bridge.send_request(BridgeRequest {
            kind: RequestType::OnAccountChange,
            client_id,
            data: json!({}),
            callback: Box::new(move |response: BridgeResponse| {
                let (handler, snapshot) = {
                    let mut state = lock(&state);
                    match AccountChange::from_payload(&response.data) {
                        Some(change) if state.connected => {
                            state.account = change.account;
                            state.network = change.network;
                        }
                        Some(_) => debug!("Ignoring account change while disconnected"),
                        None => warn!("Account change event is missing fields; keeping current state"),
                    }
                    (state.on_account_change.clone(), state.snapshot())
                };
                if let Some(handler) = handler {
                    handler(snapshot);
                }
            }),
            reject: None,
        });
        Ok(())
    }

    /// Register the transaction-status handler and subscribe to status events.
    /// `None` is rejected.
    pub fn set_on_listen_transaction_status_handler(
        &self,
        handler: Option<TransactionStatusHandler>,
    ) -> Result<()> {
        self.check_connection()?;
        let handler = handler.ok_or_else(|| WalletError::generic("func is not a function"))?;
        self.state().on_listen_transaction = Some(handler);

        let client_id = self.client_id()?;
        let state = self.state.clone();
        self.bridge.send_request(BridgeRequest {
            kind: RequestType::OnListenTransaction,
            client_id,
            data: json!({}),
            callback: Box::new(move |response: BridgeResponse| {
                let info = match serde_json::from_value::<ResponseTxInfo>(response.data) {
                    Ok(info) => info,
                    Err(e) => {
                        warn!("Dropping malformed transaction status event: {}", e);
                        return;
                    }
                };
                let handler = lock(&state).on_listen_transaction.clone();
                if let Some(handler) = handler {
                    handler(info);
                }
            }),
            reject: None,
        });
        Ok(())
    }

    /// Balances of the current account
    pub async fn get_current_assets(&self) -> Result<CurrentAccountAssets> {
        self.request(RequestType::GetCurrentAssets, json!({}), RejectMarker::Reject)
            .await
    }

    /// Invoices of the current account; `page_num >= 1`, `page_size >= 10`
    pub async fn get_invoices(&self, options: RequestPageOptions) -> Result<Vec<ResponseInvoiceRow>> {
        let data = json!({
            "page_num": floor_at_least(options.page_num, MIN_PAGE_NUM),
            "page_size": floor_at_least(options.page_size, MIN_PAGE_SIZE),
        });
        self.request(RequestType::GetInvoices, data, RejectMarker::Reject)
            .await
    }

    pub async fn create_invoice(&self, options: RequestInvoiceOptions) -> Result<ResponseInvoiceRow> {
        self.check_connection()?;
        let data = json!({
            "asset_id": options.asset_id,
            "amount": options.amount,
        });
        self.request(RequestType::CreateInvoice, data, RejectMarker::Reject)
            .await
    }

    /// Search assets by id or name
    pub async fn search_assets(&self, options: RequestAssetOptions) -> Result<Vec<ResponseAssetRow>> {
        self.check_connection()?;
        let asset_id = options.asset_id.filter(|id| !id.is_empty());
        let asset_name = options.asset_name.filter(|name| !name.is_empty());
        if asset_id.is_none() && asset_name.is_none() {
            return Err(WalletError::generic("asset_id or asset_name is required"));
        }

        let mut data = Map::new();
        if let Some(asset_id) = asset_id {
            data.insert("asset_id".into(), json!(asset_id));
        }
        if let Some(asset_name) = asset_name {
            data.insert("asset_name".into(), json!(asset_name));
        }
        data.insert(
            "page_num".into(),
            json!(floor_at_least(options.page.page_num, MIN_PAGE_NUM)),
        );
        data.insert(
            "page_size".into(),
            json!(floor_at_least(options.page.page_size, MIN_PAGE_SIZE)),
        );

        let rows: OneOrMany<ResponseAssetRow> = self
            .request(RequestType::SearchAssets, Value::Object(data), RejectMarker::Reject)
            .await?;
        Ok(rows.into())
    }

    /// Watch specific transactions; events arrive at the transaction-status handler
    pub fn add_listen_tx_id<S: AsRef<str>>(&self, tx_ids: &[S]) -> Result<()> {
        self.check_connection()?;
        if tx_ids.is_empty() {
            return Err(WalletError::generic("txIds is required"));
        }
        if self.state().on_listen_transaction.is_none() {
            return Err(WalletError::generic(
                "onListenTransactionHandler is not set a function.",
            ));
        }
        if tx_ids.iter().any(|txid| !Utils::is_tx_id(txid.as_ref())) {
            return Err(WalletError::generic("Invalid txid."));
        }

        let tx_ids: Vec<&str> = tx_ids.iter().map(AsRef::as_ref).collect();
        self.notify(RequestType::AddListenTxId, json!({ "txIds": tx_ids }))
    }

    /// Send BTC. Either a receive address or an amount must be present.
    pub async fn transfer_btc(&self, options: TransferOptions) -> Result<ResponseTxInfo> {
        self.check_connection()?;
        let has_amount = options.amount.map_or(false, |a| a != 0.0 && !a.is_nan());
        if options.recv_addr.is_empty() && !has_amount {
            return Err(WalletError::generic("recv_addr or amount is required"));
        }

        let mut data = Map::new();
        data.insert("recv_addr".into(), json!(options.recv_addr));
        if let Some(amount) = options.amount.filter(|a| a.is_finite()) {
            data.insert("amount".into(), json!(amount.floor() as i64));
        }
        data.insert(
            "min_conf".into(),
            json!(floor_at_least(options.min_conf, MIN_CONFIRMATIONS)),
        );
        data.insert(
            "fee_rate".into(),
            json!(floor_at_least(options.fee_rate, MIN_FEE_RATE)),
        );

        self.request(RequestType::TransferBtc, Value::Object(data), RejectMarker::Reject)
            .await
    }

    pub async fn send_taproot_assets(&self, options: SendAssetsOptions) -> Result<ResponseTxInfo> {
        self.check_connection()?;
        if options.receive_addr.is_empty() {
            return Err(WalletError::generic("receive_addr is required"));
        }

        let data = json!({
            "receive_addr": options.receive_addr,
            "fee_rate": floor_at_least(options.fee_rate, MIN_FEE_RATE),
        });
        self.request(RequestType::SendTaprootAssets, data, RejectMarker::Reject)
            .await
    }

    /// Sign a message with the current account; resolves to the signature
    pub async fn sign_message(&self, message: &str) -> Result<String> {
        self.check_connection()?;
        if message.is_empty() {
            return Err(WalletError::generic("_msg is required"));
        }

        let kind = RequestType::SignMessage;
        let rx = self.dispatch(
            kind,
            json!({ "msg": message }),
            RejectMarker::SignatureFailed,
            move |payload| {
                payload
                    .get("resultMessage")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        WalletError::Communication(format!("{} response has no resultMessage", kind))
                    })
            },
        )?;
        Self::settle(kind, rx).await
    }

    /// Tell the wallet we are leaving and reset local state without waiting
    /// for an acknowledgement
    pub fn disconnect(&self) -> Result<()> {
        self.check_connection()?;
        self.notify(RequestType::DisConnection, json!({}))?;

        let mut state = self.state();
        state.reset();
        state.connected = false;
        debug!("Wallet disconnected");
        Ok(())
    }
}

/// Account-change payload with every required field present
struct AccountChange {
    account: Account,
    network: NetworkType,
}

impl AccountChange {
    fn from_payload(data: &Value) -> Option<Self> {
        let network = data.pointer("/network/name").and_then(Value::as_str)?;
        let btc_address = data.pointer("/account/btcAddress").and_then(Value::as_str)?;
        let name = data.pointer("/account/name").and_then(Value::as_str)?;
        Some(Self {
            account: Account {
                name: name.to_string(),
                btc_address: btc_address.to_string(),
            },
            network: NetworkType::resolve(network),
        })
    }
}
