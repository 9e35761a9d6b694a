use std::rc::Rc;

use log::error;
use wasm_bindgen::{prelude::Closure, JsCast};
use wasm_bindgen_futures::spawn_local;

use crate::{
    config::Config,
    dom::{DomError, DomView},
    eip1193::Eip1193,
    provider::{Provider, ProviderError},
    WalletConnection,
};

pub type PageWallet = WalletConnection<Eip1193, DomView>;

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Wires a page together: resolves the display regions, binds the injected
/// provider, and hooks the connect control and provider notifications up to
/// a shared controller. Returns the controller so the host page can drive
/// it further.
pub fn mount(config: Config) -> Result<Rc<PageWallet>, PageError> {
    let provider = Eip1193::from_window();
    let view = DomView::mount(&config.elements)?;
    let button = view.connect_button();
    let wallet = Rc::new(WalletConnection::new(provider.clone(), view, config));

    // Subscriptions only make sense when a provider is injected at all;
    // without one, connect() will surface the install prompt on its own.
    if provider.is_available() {
        let handle = Rc::clone(&wallet);
        provider.on_accounts_changed(move |accounts| handle.accounts_changed(accounts))?;

        let handle = Rc::clone(&wallet);
        provider.on_chain_changed(move |_| {
            handle.chain_changed();
            // Everything shown so far belongs to the old chain; reload the
            // document so the page starts from scratch.
            if gloo_utils::window().location().reload().is_err() {
                error!("Failed to reload after chain change");
            }
        })?;
    }

    let handle = Rc::clone(&wallet);
    let onclick = Closure::wrap(Box::new(move || {
        let handle = Rc::clone(&handle);
        spawn_local(async move {
            if let Err(err) = handle.connect().await {
                error!("Wallet connection attempt failed: {err}");
            }
        });
    }) as Box<dyn FnMut()>);
    button
        .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())
        .map_err(|_| DomError::Listener)?;
    onclick.forget();

    Ok(wallet)
}
