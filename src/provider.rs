use async_trait::async_trait;

use crate::domain::{Address, ChainId, Wei};

/// EIP-1193 error code for a request the user declined.
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// A failed provider request, carrying the EIP-1193 error code when the
/// wallet supplied one.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Provider request failed ({code}): {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED_REQUEST
    }
}

/// The wallet capability the controller is driven against.
///
/// Every async call may suspend for as long as the wallet keeps its approval
/// UI open; there is no timeout and no way to cancel from this side.
#[async_trait(?Send)]
pub trait Provider {
    /// Whether an injected provider object actually exists. `connect` is
    /// refused up front when it does not.
    fn is_available(&self) -> bool;

    /// `eth_requestAccounts` — prompts the user for authorization.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// `eth_chainId`.
    async fn chain_id(&self) -> Result<ChainId, ProviderError>;

    /// `eth_getBalance` for the latest block.
    async fn balance(&self, address: &Address) -> Result<Wei, ProviderError>;
}
