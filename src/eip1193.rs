use async_trait::async_trait;
use js_sys::{Array, Function, Object, Promise, Reflect};
use log::debug;
use serde::Serialize;
use wasm_bindgen::{prelude::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::{
    domain::{Address, ChainId, Wei},
    provider::{Provider, ProviderError},
};

/// EIP-1193: the provider is disconnected from all chains.
const DISCONNECTED: i64 = 4900;
/// JSON-RPC parse error, used for payloads the wallet sent but we cannot read.
const PARSE_ERROR: i64 = -32700;
/// JSON-RPC internal error.
const INTERNAL_ERROR: i64 = -32603;

fn internal(message: impl Into<String>) -> ProviderError {
    ProviderError::new(INTERNAL_ERROR, message)
}

fn bad_payload(message: impl Into<String>) -> ProviderError {
    ProviderError::new(PARSE_ERROR, message)
}

/// Maps a rejected promise to a [`ProviderError`], picking up the numeric
/// `code` and `message` fields EIP-1193 errors carry.
fn error_from_js(err: JsValue) -> ProviderError {
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|v| v.as_f64())
        .map(|c| c as i64)
        .unwrap_or(INTERNAL_ERROR);
    let message = Reflect::get(&err, &JsValue::from_str("message"))
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    ProviderError::new(code, message)
}

#[derive(Serialize)]
struct RequestArgs<'a, T: Serialize> {
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<T>,
}

/// The injected `window.ethereum` provider.
///
/// Construction never fails; a page without a wallet extension yields a
/// handle that reports itself unavailable and refuses every request.
#[derive(Clone)]
pub struct Eip1193 {
    ethereum: Option<Object>,
}

impl Eip1193 {
    pub fn from_window() -> Self {
        let ethereum = Reflect::get(&gloo_utils::window(), &JsValue::from_str("ethereum"))
            .ok()
            .and_then(|v| v.dyn_into::<Object>().ok());
        Self { ethereum }
    }

    fn ethereum(&self) -> Result<&Object, ProviderError> {
        self.ethereum
            .as_ref()
            .ok_or_else(|| ProviderError::new(DISCONNECTED, "No injected provider"))
    }

    fn method(&self, name: &str) -> Result<(&Object, Function), ProviderError> {
        let ethereum = self.ethereum()?;
        let function = Reflect::get(ethereum, &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.dyn_into::<Function>().ok())
            .ok_or_else(|| internal(format!("Provider has no {name} method")))?;
        Ok((ethereum, function))
    }

    /// `ethereum.request({ method, params })`, suspended until the wallet
    /// settles the promise.
    async fn request<T: Serialize>(
        &self,
        method: &str,
        params: Option<T>,
    ) -> Result<JsValue, ProviderError> {
        let (ethereum, request) = self.method("request")?;
        let args = serde_wasm_bindgen::to_value(&RequestArgs { method, params })
            .map_err(|err| internal(format!("Failed to build request: {err}")))?;

        debug!("Requesting {method}");
        let promise: Promise = request.call1(ethereum, &args).map_err(error_from_js)?.into();
        JsFuture::from(promise).await.map_err(error_from_js)
    }

    /// `ethereum.on(event, callback)`. The closure is leaked deliberately;
    /// subscriptions live as long as the page does.
    fn subscribe(
        &self,
        event: &str,
        callback: Closure<dyn Fn(JsValue)>,
    ) -> Result<(), ProviderError> {
        let (ethereum, on) = self.method("on")?;
        on.call2(ethereum, &JsValue::from_str(event), callback.as_ref())
            .map_err(error_from_js)?;
        callback.forget();
        Ok(())
    }

    /// Entries that are not parseable addresses are dropped rather than
    /// aborting the whole notification.
    pub fn on_accounts_changed(
        &self,
        callback: impl Fn(Vec<Address>) + 'static,
    ) -> Result<(), ProviderError> {
        self.subscribe(
            "accountsChanged",
            Closure::wrap(Box::new(move |accounts: JsValue| {
                let accounts = Array::from(&accounts)
                    .iter()
                    .filter_map(|v| v.as_string())
                    .filter_map(|s| s.parse().ok())
                    .collect();
                callback(accounts);
            }) as Box<dyn Fn(JsValue)>),
        )
    }

    pub fn on_chain_changed(
        &self,
        callback: impl Fn(Option<ChainId>) + 'static,
    ) -> Result<(), ProviderError> {
        self.subscribe(
            "chainChanged",
            Closure::wrap(Box::new(move |chain: JsValue| {
                callback(chain.as_string().and_then(|s| s.parse().ok()));
            }) as Box<dyn Fn(JsValue)>),
        )
    }
}

#[async_trait(?Send)]
impl Provider for Eip1193 {
    fn is_available(&self) -> bool {
        self.ethereum.is_some()
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let result = self.request::<()>("eth_requestAccounts", None).await?;
        Array::from(&result)
            .iter()
            .map(|entry| {
                entry
                    .as_string()
                    .ok_or_else(|| bad_payload("Account entry is not a string"))?
                    .parse()
                    .map_err(|err| bad_payload(format!("Bad account address: {err}")))
            })
            .collect()
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        self.request::<()>("eth_chainId", None)
            .await?
            .as_string()
            .ok_or_else(|| bad_payload("Chain id is not a string"))?
            .parse()
            .map_err(|err| bad_payload(format!("Bad chain id: {err}")))
    }

    async fn balance(&self, address: &Address) -> Result<Wei, ProviderError> {
        self.request("eth_getBalance", Some((address.as_str(), "latest")))
            .await?
            .as_string()
            .ok_or_else(|| bad_payload("Balance is not a string"))?
            .parse()
            .map_err(|err| bad_payload(format!("Bad balance quantity: {err}")))
    }
}
