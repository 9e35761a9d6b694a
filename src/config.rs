use serde::{Deserialize, Serialize};

use crate::domain::ChainId;

/// Avalanche Fuji testnet chain id.
pub const FUJI_CHAIN_ID: ChainId = ChainId(43113);

/// Element ids of the page regions the [`crate::dom::DomView`] binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementIds {
    pub connect_button: String,
    pub status: String,
    pub address: String,
    pub network: String,
    pub balance: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            connect_button: "connectBtn".to_string(),
            status: "status".to_string(),
            address: "address".to_string(),
            network: "network".to_string(),
            balance: "balance".to_string(),
        }
    }
}

/// Page configuration. The expected network is configuration, never a
/// constant baked into the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// The single network the page considers correct.
    pub expected_chain: ChainId,
    /// Label shown in the network region once connected to it.
    pub network_label: String,
    /// Connect control labels.
    pub connect_label: String,
    pub connected_label: String,
    /// Network region text when connected to anything else.
    pub wrong_network_text: String,
    /// Status guidance shown alongside the wrong-network text.
    pub switch_prompt: String,
    /// Blocking notice when no provider is injected at all.
    pub install_prompt: String,
    /// Status text for a failed connection attempt.
    pub failure_text: String,
    pub elements: ElementIds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            expected_chain: FUJI_CHAIN_ID,
            network_label: "Avalanche Fuji Testnet".to_string(),
            connect_label: "Connect Wallet".to_string(),
            connected_label: "Connected".to_string(),
            wrong_network_text: "Wrong Network".to_string(),
            switch_prompt: "Please switch to Avalanche Fuji Testnet".to_string(),
            install_prompt: "No wallet detected. Please install a browser wallet.".to_string(),
            failure_text: "Connection Failed".to_string(),
            elements: ElementIds::default(),
        }
    }
}

impl Config {
    /// Deserializes a config from JSON embedded in the host page. Missing
    /// fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
