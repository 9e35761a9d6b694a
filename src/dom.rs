use log::warn;
use wasm_bindgen::JsCast;
use web_sys::{HtmlButtonElement, HtmlElement};

use crate::{
    config::ElementIds,
    view::{Tone, View},
};

#[derive(Debug, Clone, thiserror::Error)]
pub enum DomError {
    #[error("Missing element #{0}")]
    MissingElement(String),

    #[error("Element #{0} is not the expected kind")]
    WrongElementKind(String),

    #[error("Failed to attach listener")]
    Listener,
}

fn require<T: JsCast>(id: &str) -> Result<T, DomError> {
    gloo_utils::document()
        .get_element_by_id(id)
        .ok_or_else(|| DomError::MissingElement(id.to_string()))?
        .dyn_into::<T>()
        .map_err(|_| DomError::WrongElementKind(id.to_string()))
}

/// Status colors of the page this library grew out of.
fn tone_color(tone: Tone) -> &'static str {
    match tone {
        Tone::Muted => "#dcdde1",
        Tone::Pending => "#fbc531",
        Tone::Ok => "#4cd137",
        Tone::Err => "#e84118",
    }
}

/// [`View`] bound to the five page elements by id.
pub struct DomView {
    status: HtmlElement,
    address: HtmlElement,
    network: HtmlElement,
    balance: HtmlElement,
    button: HtmlButtonElement,
}

impl DomView {
    pub fn mount(ids: &ElementIds) -> Result<Self, DomError> {
        Ok(Self {
            status: require(&ids.status)?,
            address: require(&ids.address)?,
            network: require(&ids.network)?,
            balance: require(&ids.balance)?,
            button: require(&ids.connect_button)?,
        })
    }

    /// A second handle to the connect control, for wiring the click
    /// listener.
    pub fn connect_button(&self) -> HtmlButtonElement {
        self.button.clone()
    }

    fn set_style(element: &HtmlElement, property: &str, value: &str) {
        if let Err(err) = element.style().set_property(property, value) {
            warn!("Failed to set {property}: {err:?}");
        }
    }
}

impl View for DomView {
    fn set_status(&mut self, text: &str, tone: Tone) {
        self.status.set_text_content(Some(text));
        Self::set_style(&self.status, "color", tone_color(tone));
    }

    fn set_address(&mut self, text: &str) {
        self.address.set_text_content(Some(text));
    }

    fn set_network(&mut self, text: &str) {
        self.network.set_text_content(Some(text));
    }

    fn set_balance(&mut self, text: &str) {
        self.balance.set_text_content(Some(text));
    }

    fn set_connect(&mut self, enabled: bool, label: &str) {
        self.button.set_disabled(!enabled);
        self.button.set_text_content(Some(label));
        Self::set_style(&self.button, "opacity", if enabled { "1" } else { "0.6" });
        Self::set_style(&self.button, "cursor", if enabled { "pointer" } else { "not-allowed" });
    }

    fn notice(&mut self, text: &str) {
        if gloo_utils::window().alert_with_message(text).is_err() {
            warn!("Failed to raise notice: {text}");
        }
    }
}
