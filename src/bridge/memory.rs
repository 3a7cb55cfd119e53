//! In-memory bridge for testing
//!
//! [`MemoryBridge`] answers requests from a script configured up front and
//! records everything it was asked to do. Callbacks are retained after the
//! first answer so tests can replay subscription events or simulate a
//! misbehaving extension that answers twice.

use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{
    Bridge, BridgeReject, BridgeRequest, BridgeResponse, ProviderHandle, RejectCallback,
    RequestType, ResponseCallback,
};
use crate::error::{Result, WalletError};

/// Default client id handed out by [`MemoryBridge::init`]
pub const MEMORY_CLIENT_ID: &str = "memory-client";

#[derive(Clone, Debug)]
enum Scripted {
    Reply(Value),
    Fail(Value),
}

/// A request as the bridge received it
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub kind: RequestType,
    pub client_id: String,
    pub data: Value,
}

struct LiveRequest {
    kind: RequestType,
    callback: Arc<Mutex<ResponseCallback>>,
    reject: Option<Arc<Mutex<RejectCallback>>>,
}

#[derive(Default)]
struct MemoryState {
    scripts: HashMap<RequestType, Scripted>,
    requests: Vec<RecordedRequest>,
    live: Vec<LiveRequest>,
    init_calls: usize,
}

/// Scripted in-memory bridge
#[derive(Clone)]
pub struct MemoryBridge {
    state: Arc<Mutex<MemoryState>>,
    installed: bool,
    client_id: String,
}

impl Default for MemoryBridge {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn respond(callback: &Mutex<ResponseCallback>, response: BridgeResponse) {
    let mut callback = lock(callback);
    (callback.as_mut())(response)
}

fn refuse(reject: &Mutex<RejectCallback>, answer: BridgeReject) {
    let mut reject = lock(reject);
    (reject.as_mut())(answer)
}

impl MemoryBridge {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            installed: true,
            client_id: MEMORY_CLIENT_ID.to_string(),
        }
    }

    /// A bridge that reports the extension as missing
    pub fn uninstalled() -> Self {
        Self {
            installed: false,
            ..Self::new()
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Answer every future `kind` request through its success callback
    pub fn reply(&self, kind: RequestType, data: Value) -> &Self {
        lock(&self.state).scripts.insert(kind, Scripted::Reply(data));
        self
    }

    /// Answer every future `kind` request through its reject callback
    pub fn fail(&self, kind: RequestType, err: Value) -> &Self {
        lock(&self.state).scripts.insert(kind, Scripted::Fail(err));
        self
    }

    /// Stop answering `kind`; its requests stay pending
    pub fn clear_script(&self, kind: RequestType) -> &Self {
        lock(&self.state).scripts.remove(&kind);
        self
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    pub fn requests_of(&self, kind: RequestType) -> Vec<RecordedRequest> {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }

    pub fn last_request(&self, kind: RequestType) -> Option<RecordedRequest> {
        lock(&self.state)
            .requests
            .iter()
            .rev()
            .find(|r| r.kind == kind)
            .cloned()
    }

    pub fn init_calls(&self) -> usize {
        lock(&self.state).init_calls
    }

    /// Invoke the success callback of every `kind` request seen so far.
    /// Returns the number of callbacks invoked.
    pub fn emit(&self, kind: RequestType, data: Value) -> usize {
        let callbacks: Vec<_> = lock(&self.state)
            .live
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.callback.clone())
            .collect();
        for callback in &callbacks {
            respond(callback, BridgeResponse::new(data.clone()));
        }
        callbacks.len()
    }

    /// Invoke the reject callback of every `kind` request that has one.
    /// Returns the number of callbacks invoked.
    pub fn reject_pending(&self, kind: RequestType, err: Value) -> usize {
        let rejects: Vec<_> = lock(&self.state)
            .live
            .iter()
            .filter(|r| r.kind == kind)
            .filter_map(|r| r.reject.clone())
            .collect();
        for reject in &rejects {
            refuse(reject, BridgeReject { err: err.clone() });
        }
        rejects.len()
    }
}

impl Bridge for MemoryBridge {
    fn installed(&self) -> bool {
        self.installed
    }

    fn init(&self) -> Result<ProviderHandle> {
        if !self.installed {
            return Err(WalletError::generic("BittapWalletInjected not installed"));
        }
        lock(&self.state).init_calls += 1;
        Ok(ProviderHandle {
            client_id: self.client_id.clone(),
        })
    }

    fn send_request(&self, request: BridgeRequest) {
        let BridgeRequest {
            kind,
            client_id,
            data,
            callback,
            reject,
        } = request;
        debug!("Memory bridge received {} request", kind);

        let callback = Arc::new(Mutex::new(callback));
        let reject = reject.map(|r| Arc::new(Mutex::new(r)));
        let script = {
            let mut state = lock(&self.state);
            state.requests.push(RecordedRequest {
                kind,
                client_id,
                data,
            });
            state.live.push(LiveRequest {
                kind,
                callback: callback.clone(),
                reject: reject.clone(),
            });
            state.scripts.get(&kind).cloned()
        };

        // Answer outside the state lock; callbacks may dispatch again
        match script {
            Some(Scripted::Reply(data)) => respond(&callback, BridgeResponse::new(data)),
            Some(Scripted::Fail(err)) => {
                if let Some(reject) = reject {
                    refuse(&reject, BridgeReject { err });
                }
            }
            None => debug!("No script for {}, leaving it pending", kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_request(kind: RequestType, hits: Arc<AtomicUsize>) -> BridgeRequest {
        BridgeRequest {
            kind,
            client_id: MEMORY_CLIENT_ID.to_string(),
            data: json!({"k": 1}),
            callback: Box::new(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
            reject: None,
        }
    }

    #[test]
    fn test_records_and_replies() {
        let bridge = MemoryBridge::new();
        bridge.reply(RequestType::GetCurrentAssets, json!([]));
        let hits = Arc::new(AtomicUsize::new(0));

        bridge.send_request(counting_request(RequestType::GetCurrentAssets, hits.clone()));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        let recorded = bridge.last_request(RequestType::GetCurrentAssets).unwrap();
        assert_eq!(recorded.data, json!({"k": 1}));
        assert_eq!(recorded.client_id, MEMORY_CLIENT_ID);
    }

    #[test]
    fn test_unscripted_request_waits_for_emit() {
        let bridge = MemoryBridge::new();
        let hits = Arc::new(AtomicUsize::new(0));

        bridge.send_request(counting_request(RequestType::OnAccountChange, hits.clone()));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        assert_eq!(bridge.emit(RequestType::OnAccountChange, json!({})), 1);
        assert_eq!(bridge.emit(RequestType::OnAccountChange, json!({})), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(bridge.emit(RequestType::SignMessage, json!({})), 0);
    }

    #[test]
    fn test_uninstalled_init_fails() {
        let bridge = MemoryBridge::uninstalled();
        assert!(!bridge.installed());
        assert!(bridge.init().is_err());
        assert_eq!(bridge.init_calls(), 0);
    }
}
