//! Browser bridge backed by the extension-injected global
//!
//! The Bittap extension injects `window.BittapWalletInjected`, an object with
//! `init()` and `sendRequestJsBridge(envelope)`. This adapter builds the
//! envelope as a plain JS object and wraps the request's callbacks in
//! [`Closure`]s. The closures are leaked on purpose: subscription callbacks
//! must outlive the call that registered them.

use js_sys::{Function, Object, Reflect};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use super::{Bridge, BridgeReject, BridgeRequest, BridgeResponse, ProviderHandle};
use crate::client::NOT_INSTALLED;
use crate::error::{Result, WalletError};

/// Name of the global the extension injects
pub const INJECTION_KEY: &str = "BittapWalletInjected";

/// Bridge to `window.BittapWalletInjected`
#[derive(Clone, Debug)]
pub struct InjectedBridge {
    injection_key: String,
}

impl Default for InjectedBridge {
    fn default() -> Self {
        Self::new()
    }
}

fn to_js(value: &Value) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| WalletError::Communication(format!("Failed to encode request: {e}")))
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<()> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|e| WalletError::Communication(format!("Failed to set {key}: {e:?}")))
}

impl InjectedBridge {
    pub fn new() -> Self {
        Self {
            injection_key: INJECTION_KEY.to_string(),
        }
    }

    /// Use a different global, e.g. for a white-labelled build of the extension
    pub fn with_injection_key(injection_key: impl Into<String>) -> Self {
        Self {
            injection_key: injection_key.into(),
        }
    }

    fn wallet_object(&self) -> Result<JsValue> {
        let window = web_sys::window()
            .ok_or_else(|| WalletError::Communication("No window object".to_string()))?;
        let wallet = Reflect::get(&window, &JsValue::from_str(&self.injection_key))
            .map_err(|e| WalletError::Communication(format!("Wallet not found: {e:?}")))?;
        if wallet.is_undefined() || wallet.is_null() {
            return Err(WalletError::generic(NOT_INSTALLED));
        }
        Ok(wallet)
    }

    fn method(wallet: &JsValue, name: &str) -> Result<Function> {
        let method = Reflect::get(wallet, &JsValue::from_str(name))
            .map_err(|e| WalletError::Communication(format!("Method {name} not found: {e:?}")))?;
        method
            .dyn_into::<Function>()
            .map_err(|_| WalletError::Communication(format!("Method {name} is not a function")))
    }

    fn try_send(
        &self,
        kind: &str,
        client_id: &str,
        data: &Value,
        callback: super::ResponseCallback,
        reject: Option<super::RejectCallback>,
    ) -> Result<()> {
        let wallet = self.wallet_object()?;
        let send = Self::method(&wallet, "sendRequestJsBridge")?;

        let envelope = Object::new();
        set(&envelope, "type", &JsValue::from_str(kind))?;
        set(&envelope, "client_id", &JsValue::from_str(client_id))?;
        set(&envelope, "data", &to_js(data)?)?;

        let mut callback = callback;
        let on_response = Closure::<dyn FnMut(JsValue)>::new(move |res: JsValue| {
            let response = serde_wasm_bindgen::from_value::<BridgeResponse>(res).unwrap_or_else(|e| {
                warn!("Undecodable bridge response: {}", e);
                BridgeResponse::default()
            });
            callback(response);
        });
        set(&envelope, "callback", on_response.as_ref())?;
        on_response.forget();

        if let Some(mut reject) = reject {
            let on_reject = Closure::<dyn FnMut(JsValue)>::new(move |res: JsValue| {
                let answer = serde_wasm_bindgen::from_value::<BridgeReject>(res).unwrap_or_else(|e| {
                    warn!("Undecodable bridge rejection: {}", e);
                    BridgeReject::default()
                });
                reject(answer);
            });
            set(&envelope, "reject", on_reject.as_ref())?;
            on_reject.forget();
        }

        send.call1(&wallet, &envelope)
            .map(|_| ())
            .map_err(|e| WalletError::Communication(format!("sendRequestJsBridge failed: {e:?}")))
    }
}

impl Bridge for InjectedBridge {
    fn installed(&self) -> bool {
        web_sys::window()
            .and_then(|window| Reflect::has(&window, &JsValue::from_str(&self.injection_key)).ok())
            .unwrap_or(false)
    }

    fn init(&self) -> Result<ProviderHandle> {
        let wallet = self.wallet_object()?;
        let init = Self::method(&wallet, "init")?;
        let provider = init
            .call0(&wallet)
            .map_err(|e| WalletError::Communication(format!("init failed: {e:?}")))?;
        serde_wasm_bindgen::from_value(provider)
            .map_err(|e| WalletError::Communication(format!("Invalid provider handle: {e}")))
    }

    fn send_request(&self, request: BridgeRequest) {
        let BridgeRequest {
            kind,
            client_id,
            data,
            callback,
            reject,
        } = request;
        debug!("Sending {} to {}", kind, self.injection_key);

        // Keep a way to report a failed dispatch through the request's own reject path
        let (reject, fallback) = match reject {
            Some(reject) => {
                let shared = std::sync::Arc::new(std::sync::Mutex::new(reject));
                let for_js = shared.clone();
                let forward: super::RejectCallback = Box::new(move |answer| {
                    if let Ok(mut reject) = for_js.lock() {
                        (reject.as_mut())(answer);
                    }
                });
                (Some(forward), Some(shared))
            }
            None => (None, None),
        };

        if let Err(e) = self.try_send(kind.as_str(), &client_id, &data, callback, reject) {
            warn!("Failed to dispatch {}: {}", kind, e);
            if let Some(shared) = fallback {
                if let Ok(mut reject) = shared.lock() {
                    (reject.as_mut())(BridgeReject {
                        err: Value::String(e.to_string()),
                    });
                }
            }
        }
    }
}
